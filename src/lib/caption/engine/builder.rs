//! Module implementing the builder for `Engine`.

use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::acquire::{Fetcher, HttpClient, LandingPageResolver, OpenGraphResolver, UreqClient,
                     DEFAULT_HTTP_TIMEOUT};
use crate::resources::{Font, FontError};
use super::config::Config;
use super::{Engine, Inner};


/// Builder for `Engine`.
#[must_use = "unused builder which must be used"]
pub struct Builder {
    errors: Vec<Error>,

    font: Option<FontSource>,

    jpeg_quality: Option<u8>,
    gif_quality: Option<u8>,
    max_download_size: Option<u64>,

    http_timeout: Option<Duration>,
    http_client: Option<Arc<dyn HttpClient>>,
    landing_page_resolver: Option<Arc<dyn LandingPageResolver>>,
}

/// Where the caption font comes from.
enum FontSource {
    File(PathBuf),
    Loaded(Font),
}

impl Builder {
    /// Create a new `Builder`.
    #[inline]
    pub fn new() -> Self {
        Builder::default()
    }
}
impl Default for Builder {
    fn default() -> Self {
        Builder{
            errors: vec![],
            font: None,
            jpeg_quality: None,
            gif_quality: None,
            max_download_size: None,
            http_timeout: None,
            http_client: None,
            landing_page_resolver: None,
        }
    }
}

// Setters.
impl Builder {
    /// Set the path to the font file used for captions.
    ///
    /// The font is loaded when the `Engine` is built.
    #[inline]
    pub fn font_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        if self.font.is_some() {
            return self.err(Error::Conflict("font"));
        }
        self.font = Some(FontSource::File(path.as_ref().to_owned())); self
    }

    /// Set an already loaded font to use for captions.
    #[inline]
    pub fn font(mut self, font: Font) -> Self {
        if self.font.is_some() {
            return self.err(Error::Conflict("font"));
        }
        self.font = Some(FontSource::Loaded(font)); self
    }

    /// Set the quality percentage of JPEG images generated by the `Engine`.
    #[inline]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        if quality > 100 {
            return self.err(Error::Quality("JPEG", quality));
        }
        self.jpeg_quality = Some(quality); self
    }

    /// Set the quality percentage of GIF images generated by the `Engine`.
    ///
    /// Lower quality makes color quantization considerably faster.
    #[inline]
    pub fn gif_quality(mut self, quality: u8) -> Self {
        if quality > 100 {
            return self.err(Error::Quality("GIF", quality));
        }
        self.gif_quality = Some(quality); self
    }

    /// Set the maximum size of images (and landing pages) downloaded from the web.
    #[inline]
    pub fn max_download_size(mut self, bytes: u64) -> Self {
        self.max_download_size = Some(bytes); self
    }

    /// Set the timeout of HTTP requests made by the default HTTP client.
    #[inline]
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        if self.http_client.is_some() {
            return self.err(Error::Conflict("HTTP client"));
        }
        self.http_timeout = Some(timeout); self
    }

    /// Set a custom client for fetching remote images.
    #[inline]
    pub fn http_client<C: HttpClient + 'static>(mut self, client: C) -> Self {
        if self.http_timeout.is_some() || self.http_client.is_some() {
            return self.err(Error::Conflict("HTTP client"));
        }
        self.http_client = Some(Arc::new(client)); self
    }

    /// Set a custom resolver for image landing pages.
    #[inline]
    pub fn landing_page_resolver<R: LandingPageResolver + 'static>(mut self, resolver: R) -> Self {
        self.landing_page_resolver = Some(Arc::new(resolver)); self
    }
}

// Validation & building.
impl Builder {
    /// Build the `Engine`.
    pub fn build(mut self) -> Result<Engine, Error> {
        self.check_errors()?;

        let config = self.build_config();
        let font = match self.font.take() {
            Some(FontSource::File(path)) => Font::from_file(path)?,
            Some(FontSource::Loaded(font)) => font,
            None => return Err(Error::NoFont),
        };

        let client = self.http_client.take().unwrap_or_else(|| {
            let timeout = self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT);
            Arc::new(UreqClient::with_timeout(timeout))
        });
        let landing_pages = self.landing_page_resolver.take()
            .unwrap_or_else(|| Arc::new(OpenGraphResolver::new(client.clone())));
        let fetcher = Fetcher{
            client,
            landing_pages,
            max_download_size: config.max_download_size,
        };

        debug!("Captioning engine built with font `{}` and {:?}", font.name(), config);
        Ok(Engine::from(Inner{config, font, fetcher}))
    }

    #[doc(hidden)]
    fn build_config(&self) -> Config {
        let mut config = Config::default();
        if let Some(quality) = self.jpeg_quality {
            config.jpeg_quality = quality;
        }
        if let Some(quality) = self.gif_quality {
            config.gif_quality = quality;
        }
        if let Some(size) = self.max_download_size {
            config.max_download_size = size;
        }
        config
    }

    #[doc(hidden)]
    fn check_errors(&mut self) -> Result<(), Error> {
        let errors = mem::take(&mut self.errors);
        if let Some(error) = errors.into_iter().next() {
            return Err(error);
        }
        Ok(())
    }

    #[doc(hidden)]
    fn err(mut self, error: Error) -> Self {
        self.errors.push(error); self
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let font = match self.font {
            Some(FontSource::File(ref p)) => format!("{}", p.display()),
            Some(FontSource::Loaded(ref f)) => format!("{:?}", f),
            None => "<none>".into(),
        };
        fmt.debug_struct("Builder")
            .field("errors", &self.errors)
            .field("font", &font)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("gif_quality", &self.gif_quality)
            .field("max_download_size", &self.max_download_size)
            .field("http_timeout", &self.http_timeout)
            .field("http_client", &self.http_client.as_ref().map(|_| "<custom>"))
            .field("landing_page_resolver", &self.landing_page_resolver.as_ref().map(|_| "<custom>"))
            .finish()
    }
}


/// Error that resulted from misconfiguration of the `Engine` via its `Builder`.
#[derive(Debug, Error)]
pub enum Error {
    /// No font has been set up.
    #[error("no caption font configured")]
    NoFont,
    /// The font couldn't be loaded.
    #[error(transparent)]
    Font(#[from] FontError),
    /// Quality percentage out of range.
    #[error("invalid {0} quality: {1}% (expected 0-100)")]
    Quality(&'static str, u8),
    /// Incompatible configuration parameters have been given.
    #[error("invalid combination of configuration parameters for setting up {0}")]
    Conflict(&'static str),
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use spectral::prelude::*;

    use crate::acquire::UreqClient;
    use crate::resources::FontError;
    use crate::resources::tests::{test_font, TEST_FONT};
    use super::{Builder, Error};

    #[test]
    fn defaults() {
        let engine = Builder::new().font_path(TEST_FONT).build().unwrap();
        let config = engine.config();
        assert_eq!(85, config.jpeg_quality);
        assert_eq!(60, config.gif_quality);
        assert_eq!(32 * 1024 * 1024, config.max_download_size);
    }

    #[test]
    fn custom_config() {
        let engine = Builder::new()
            .font(test_font())
            .jpeg_quality(70).gif_quality(100).max_download_size(1024)
            .http_timeout(Duration::from_secs(3))
            .build().unwrap();
        let config = engine.config();
        assert_eq!(70, config.jpeg_quality);
        assert_eq!(100, config.gif_quality);
        assert_eq!(1024, config.max_download_size);
    }

    #[test]
    fn no_font() {
        match Builder::new().build() {
            Err(Error::NoFont) => {}
            other => panic!("expected NoFont, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn missing_font() {
        match Builder::new().font_path("/no/such/font.ttf").build() {
            Err(Error::Font(FontError::NotFound(_))) => {}
            other => panic!("expected font not found, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn invalid_quality() {
        let result = Builder::new().font(test_font()).jpeg_quality(101).build();
        assert_that!(result.is_err()).is_true();
    }

    #[test]
    fn conflicting_setup() {
        let result = Builder::new().font(test_font()).font_path(TEST_FONT).build();
        assert_that!(matches!(result, Err(Error::Conflict(_)))).is_true();

        let result = Builder::new().font(test_font())
            .http_client(UreqClient::new()).http_timeout(Duration::from_secs(1))
            .build();
        assert_that!(matches!(result, Err(Error::Conflict(_)))).is_true();
    }
}
