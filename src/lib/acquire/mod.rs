//! Module handling the acquisition of images to caption.

mod decode;
mod http;
mod landing;


pub use self::decode::decode;
pub use self::http::{HttpClient, UreqClient, DEFAULT_TIMEOUT as DEFAULT_HTTP_TIMEOUT, USER_AGENT};
pub use self::landing::{find_og_image, LandingPageResolver, OpenGraphResolver, LANDING_PAGE_HOSTS};

#[cfg(test)]
pub(crate) use self::decode::tests as decode_tests;


use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::caption::CaptionError;
use crate::model::{DecodedImage, ImageSource};


/// Error while obtaining the image data from its source.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// URL has a scheme other than HTTP(S).
    #[error("unsupported URL scheme `{0}`")]
    Scheme(String),
    #[error("invalid URL {0:?}: {1}")]
    InvalidUrl(String, #[source] url::ParseError),
    /// Server responded with a non-success HTTP status.
    #[error("HTTP status {0} from {1}")]
    Status(u16, String),
    /// Request failed at the transport level.
    #[error("cannot fetch {0}: {1}")]
    Http(String, String),
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("cannot read file {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),
}


/// Resolves `ImageSource`s into decoded images.
#[derive(Clone)]
pub(crate) struct Fetcher {
    pub client: Arc<dyn HttpClient>,
    pub landing_pages: Arc<dyn LandingPageResolver>,
    /// Maximum size of downloaded image data, in bytes.
    pub max_download_size: u64,
}

impl Fetcher {
    /// Obtain & decode the image from given source.
    pub fn resolve(&self, source: ImageSource) -> Result<DecodedImage, CaptionError> {
        trace!("Resolving {:?}", source);
        let bytes = match source {
            ImageSource::Url(url) => self.fetch_url(&url)?,
            ImageSource::Path(path) => read_file(&path)?,
            ImageSource::Bytes(bytes) => bytes,
            ImageSource::Decoded(image) => return Ok(image),
        };
        Ok(decode(&bytes)?)
    }

    fn fetch_url(&self, url: &str) -> Result<Vec<u8>, AcquireError> {
        let url = Url::parse(url).map_err(|e| AcquireError::InvalidUrl(url.to_owned(), e))?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(AcquireError::Scheme(scheme.to_owned())),
        }
        let url = self.landing_pages.unwrap_landing_page(&url);
        self.client.get(&url, self.max_download_size)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, AcquireError> {
    debug!("Reading image file {}", path.display());
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => AcquireError::NotFound(path.to_owned()),
        _ => AcquireError::Io(path.to_owned(), e),
    })
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Fetcher")
            .field("max_download_size", &self.max_download_size)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};
    use std::sync::{Arc, Mutex};

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use spectral::prelude::*;
    use tempfile::NamedTempFile;
    use url::Url;

    use crate::caption::CaptionError;
    use crate::model::ImageSource;
    use super::{AcquireError, Fetcher, HttpClient, OpenGraphResolver};

    struct StaticClient {
        body: Vec<u8>,
        requests: Mutex<Vec<String>>,
    }

    impl HttpClient for StaticClient {
        fn get(&self, url: &Url, _: u64) -> Result<Vec<u8>, AcquireError> {
            self.requests.lock().unwrap().push(url.to_string());
            if url.path().ends_with("missing.png") {
                return Err(AcquireError::Status(404, url.to_string()));
            }
            Ok(self.body.clone())
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 8, Rgb([5, 5, 5])));
        let mut bytes = Cursor::new(vec![]);
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn fetcher(body: Vec<u8>) -> (Fetcher, Arc<StaticClient>) {
        let client = Arc::new(StaticClient{body, requests: Mutex::new(vec![])});
        let fetcher = Fetcher{
            client: client.clone(),
            landing_pages: Arc::new(OpenGraphResolver::new(client.clone())),
            max_download_size: 1024 * 1024,
        };
        (fetcher, client)
    }

    #[test]
    fn http_url() {
        let (fetcher, client) = fetcher(png_bytes());
        let image = fetcher.resolve(ImageSource::Url("https://example.com/a.png".into())).unwrap();
        assert_eq!((10, 8), image.dimensions());
        assert_eq!(vec!["https://example.com/a.png".to_owned()], *client.requests.lock().unwrap());
    }

    #[test]
    fn url_http_error() {
        let (fetcher, _) = fetcher(png_bytes());
        match fetcher.resolve(ImageSource::Url("http://example.com/missing.png".into())) {
            Err(CaptionError::Acquire(AcquireError::Status(404, _))) => {}
            other => panic!("expected HTTP 404, got {:?}", other),
        }
    }

    #[test]
    fn url_bad_scheme() {
        let (fetcher, client) = fetcher(png_bytes());
        match fetcher.resolve(ImageSource::Url("ftp://example.com/a.png".into())) {
            Err(CaptionError::Acquire(AcquireError::Scheme(ref s))) => assert_eq!("ftp", s),
            other => panic!("expected bad scheme, got {:?}", other),
        }
        assert_that!(*client.requests.lock().unwrap()).is_empty();
    }

    #[test]
    fn url_not_an_image() {
        let (fetcher, _) = fetcher(b"<html></html>".to_vec());
        match fetcher.resolve(ImageSource::Url("https://example.com/a.png".into())) {
            Err(CaptionError::Decode(_)) => {}
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn path() {
        let (fetcher, _) = fetcher(vec![]);
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&png_bytes()).unwrap();
        let image = fetcher.resolve(ImageSource::Path(file.path().to_owned())).unwrap();
        assert_eq!((10, 8), image.dimensions());
    }

    #[test]
    fn missing_path() {
        let (fetcher, _) = fetcher(vec![]);
        match fetcher.resolve(ImageSource::Path("/no/such/image.png".into())) {
            Err(CaptionError::Acquire(AcquireError::NotFound(_))) => {}
            other => panic!("expected file not found, got {:?}", other),
        }
    }

    #[test]
    fn bytes() {
        let (fetcher, _) = fetcher(vec![]);
        let image = fetcher.resolve(ImageSource::Bytes(png_bytes())).unwrap();
        assert_eq!(ImageFormat::Png, image.format());
    }
}
