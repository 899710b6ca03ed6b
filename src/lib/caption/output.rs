//! Defines the output of a captioning operation.

use std::ops::Deref;

use image::ImageFormat;
use mime::{self, Mime};


/// Output of the captioning process.
#[derive(Clone, Debug)]
#[must_use = "unused caption output which must be used"]
pub struct CaptionOutput {
    format: ImageFormat,
    bytes: Vec<u8>,
}

impl CaptionOutput {
    #[inline]
    pub(super) fn new(format: ImageFormat, bytes: Vec<u8>) -> Self {
        CaptionOutput{format, bytes}
    }
}

impl CaptionOutput {
    /// Image format of the output.
    #[inline]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Raw bytes of the output.
    ///
    /// See `CaptionOutput::format` for how to interpret it.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..]
    }

    /// Convert the output into a vector of bytes.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// File extension matching output's format, e.g. "png" or "gif".
    pub fn extension(&self) -> &'static str {
        format_extension(self.format)
    }

    /// Suggested file name of the output, e.g. "result.gif".
    #[inline]
    pub fn filename(&self) -> String {
        format!("result.{}", self.extension())
    }

    /// The MIME type that matches output's format.
    pub fn mime_type(&self) -> Option<Mime> {
        match self.format {
            ImageFormat::Gif => Some(mime::IMAGE_GIF),
            ImageFormat::Jpeg => Some(mime::IMAGE_JPEG),
            ImageFormat::Png => Some(mime::IMAGE_PNG),
            ImageFormat::Bmp => Some(mime::IMAGE_BMP),
            f => f.to_mime_type().parse().ok(),
        }
    }
}

/// Lowercase name of the image format, used as file extension.
pub(crate) fn format_extension(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Ico => "ico",
        f => f.extensions_str().first().copied().unwrap_or("bin"),
    }
}

impl Deref for CaptionOutput {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.bytes()
    }
}

impl From<CaptionOutput> for Vec<u8> {
    fn from(output: CaptionOutput) -> Self {
        output.into_bytes()
    }
}
