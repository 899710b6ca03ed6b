//! Module which defines the captioning engine.

mod builder;
mod config;

pub use self::builder::{Builder, Error as BuildError};
pub use self::config::{Config, DEFAULT_GIF_QUALITY, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DOWNLOAD_SIZE};


use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::acquire::Fetcher;
use crate::model::{DecodedImage, ImageSource};
use crate::resources::Font;
use super::error::CaptionError;
use super::output::CaptionOutput;
use super::task::CaptionTask;


/// Image captioning engine.
///
/// The engine is thread-safe (`Sync`) since normally you'd want the captioning
/// to be performed in a background thread.
///
/// *Note*: `Engine` implements `Clone`
/// by merely cloning a shared reference to the underlying object.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

/// Shared state of the engine that caption tasks have access to.
pub(super) struct Inner {
    pub config: Config,
    pub font: Font,
    pub fetcher: Fetcher,
}

impl From<Inner> for Engine {
    fn from(inner: Inner) -> Self {
        Engine{inner: Arc::new(inner)}
    }
}

// Constructors.
impl Engine {
    /// Create an Engine which uses the font from given file
    /// and default values for everything else.
    ///
    /// For other ways of creating `Engine`, see the `EngineBuilder`.
    #[inline]
    pub fn new<P: AsRef<Path>>(font_path: P) -> Result<Self, BuildError> {
        Builder::new().font_path(font_path).build()
    }
}

// Captioning.
impl Engine {
    /// Obtain & decode the image from given source.
    ///
    /// This may involve fetching it from the web, which is a blocking operation.
    #[inline]
    pub fn resolve(&self, source: ImageSource) -> Result<DecodedImage, CaptionError> {
        self.inner.fetcher.resolve(source)
    }

    /// Draw the caption text onto the image (every frame of it, if animated)
    /// and encode the result.
    ///
    /// Note that captioning is a CPU-intensive process and can be relatively lengthy,
    /// especially if the image is an animation.
    /// It is recommended to execute it in a separate thread.
    #[inline]
    pub fn overlay(&self, image: DecodedImage, text: &str) -> Result<CaptionOutput, CaptionError> {
        CaptionTask::new(image, text, self.inner.clone()).perform()
    }

    /// Obtain the image from given source and caption it with given text.
    pub fn caption<S>(&self, source: S, text: &str) -> Result<CaptionOutput, CaptionError>
        where S: Into<ImageSource>
    {
        if text.trim().is_empty() {
            return Err(CaptionError::EmptyText);
        }
        let image = self.resolve(source.into())?;
        self.overlay(image, text)
    }
}

// Accessors.
impl Engine {
    /// The `Engine`'s configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Font used for captions.
    #[inline]
    pub fn font(&self) -> &Font {
        &self.inner.font
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Engine")
            .field("config", &self.inner.config)
            .field("font", &self.inner.font)
            .field("fetcher", &self.inner.fetcher)
            .finish()
    }
}
