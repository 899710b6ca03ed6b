//! Module defining the sources that images can be acquired from.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

use super::image::DecodedImage;


/// Where the image to caption comes from.
///
/// A source is resolved exactly once per captioning request.
#[derive(Clone)]
pub enum ImageSource {
    /// Remote image (or landing page) to be fetched over HTTP(S).
    Url(String),
    /// Image file on the local filesystem.
    Path(PathBuf),
    /// Raw bytes of an encoded image.
    Bytes(Vec<u8>),
    /// Image that's already been decoded.
    Decoded(DecodedImage),
}

impl ImageSource {
    /// Classify a textual locator of an image, as given by a caller.
    ///
    /// Anything that has a `scheme://` prefix is treated as an URL
    /// (whether the scheme is actually supported is decided later),
    /// while an existing filesystem path becomes `ImageSource::Path`.
    pub fn from_locator(locator: &str) -> Result<Self, UnsupportedInput> {
        lazy_static! {
            static ref SCHEME_RE: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").unwrap();
        }
        let locator = locator.trim();
        if SCHEME_RE.is_match(locator) {
            return Ok(ImageSource::Url(locator.to_owned()));
        }
        if !locator.is_empty() && Path::new(locator).exists() {
            return Ok(ImageSource::Path(PathBuf::from(locator)));
        }
        Err(UnsupportedInput(locator.to_owned()))
    }

    /// Short description of the source kind, for logging.
    pub fn kind(&self) -> &'static str {
        match *self {
            ImageSource::Url(..) => "url",
            ImageSource::Path(..) => "path",
            ImageSource::Bytes(..) => "bytes",
            ImageSource::Decoded(..) => "decoded",
        }
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}
impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}
impl<'p> From<&'p Path> for ImageSource {
    fn from(path: &'p Path) -> Self {
        ImageSource::Path(path.to_owned())
    }
}
impl From<DecodedImage> for ImageSource {
    fn from(image: DecodedImage) -> Self {
        ImageSource::Decoded(image)
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ImageSource::Url(ref u) => write!(fmt, "ImageSource::Url({:?})", u),
            ImageSource::Path(ref p) => write!(fmt, "ImageSource::Path({:?})", p),
            ImageSource::Bytes(ref b) => write!(fmt, "ImageSource::Bytes(<{} bytes>)", b.len()),
            ImageSource::Decoded(ref d) => write!(fmt, "ImageSource::Decoded({:?})", d),
        }
    }
}


/// Error for image locators that don't denote any supported kind of source.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported image input: {0:?}")]
pub struct UnsupportedInput(pub String);
