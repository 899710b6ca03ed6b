//! Module for loading fonts used in captions.

use std::fmt;
use std::fs;
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use rusttype::{self, Scale};
use thiserror::Error;


/// Path of the font that's used when no other one is given,
/// relative to the working directory.
pub const DEFAULT_FONT_PATH: &str = "data/fonts/DejaVuSansCondensed-Bold.ttf";


/// Font that can be used to caption images.
#[derive(Clone)]
pub struct Font {
    name: String,
    inner: rusttype::Font<'static>,
}

impl Font {
    /// Load the font from a TrueType/OpenType file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FontError> {
        let path = path.as_ref();
        trace!("Loading font from {}", path.display());

        let bytes = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FontError::NotFound(path.to_owned()),
            _ => FontError::Io(path.to_owned(), e),
        })?;
        let name = path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let font = Self::from_bytes(name, bytes)?;
        debug!("Font `{}` loaded successfully from {}", font.name, path.display());
        Ok(font)
    }

    /// Create the font from raw bytes of a font file.
    pub fn from_bytes<N: Into<String>>(name: N, bytes: Vec<u8>) -> Result<Self, FontError> {
        let name = name.into();
        match rusttype::Font::try_from_vec(bytes) {
            Some(inner) => Ok(Font{name, inner}),
            None => {
                error!("No usable font found in the data for `{}`", name);
                Err(FontError::Invalid(name))
            }
        }
    }
}

impl Font {
    /// Name of the font (usually the stem of its file name).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scale corresponding to given font size in pixels.
    ///
    /// The size is interpreted as em size (like in most typesetting tools)
    /// rather than rusttype's ascent-to-descent height.
    pub fn scale(&self, size: f32) -> Scale {
        let units_per_em = self.inner.units_per_em();
        if units_per_em == 0 {
            return Scale::uniform(size);
        }
        let v_metrics = self.inner.v_metrics_unscaled();
        let height_in_ems = (v_metrics.ascent - v_metrics.descent) / units_per_em as f32;
        Scale::uniform(size * height_in_ems)
    }
}

impl Deref for Font {
    type Target = rusttype::Font<'static>;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Font({:?})", self.name)
    }
}


/// Error that may occur when loading a font.
#[derive(Debug, Error)]
pub enum FontError {
    /// The font file doesn't exist.
    #[error("font file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// The font file couldn't be read.
    #[error("cannot read font file {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),
    /// The data isn't a font that can be used.
    #[error("invalid font data for `{0}`")]
    Invalid(String),
}


#[cfg(test)]
pub(crate) mod tests {
    use spectral::prelude::*;
    use super::{Font, FontError};

    pub(crate) const TEST_FONT: &str = concat!(
        env!("CARGO_MANIFEST_DIR"), "/../../data/fonts/DejaVuSansCondensed-Bold.ttf");

    pub(crate) fn test_font() -> Font {
        Font::from_file(TEST_FONT).unwrap()
    }

    #[test]
    fn load() {
        let font = test_font();
        assert_eq!("DejaVuSansCondensed-Bold", font.name());
        assert_that!(font.glyph_count()).is_greater_than(0);
    }

    #[test]
    fn missing_file() {
        match Font::from_file("/no/such/font.ttf") {
            Err(FontError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn garbage_bytes() {
        let result = Font::from_bytes("garbage", b"this is no font".to_vec());
        assert_that!(result.is_err()).is_true();
    }

    #[test]
    fn scale_is_em_based() {
        let font = test_font();
        let scale = font.scale(40.0);
        // DejaVu's ascent + descent is a bit over one em.
        assert_that!(scale.y).is_greater_than(40.0);
        assert_that!(scale.y).is_less_than(50.0);
    }
}
