//! Captioning errors.

use std::io;

use image::ImageError;
use thiserror::Error;

use crate::acquire::AcquireError;
use crate::model::UnsupportedInput;


/// Error that may occur during the captioning.
#[derive(Debug, Error)]
pub enum CaptionError {
    /// Caption text is empty (or all whitespace).
    #[error("caption text is empty")]
    EmptyText,
    /// The image source isn't of any supported kind.
    #[error(transparent)]
    Unsupported(#[from] UnsupportedInput),
    /// The image couldn't be obtained.
    #[error("cannot acquire image: {0}")]
    Acquire(#[from] AcquireError),
    /// The image data couldn't be decoded.
    #[error("cannot decode image: {0}")]
    Decode(#[from] DecodeError),
    /// The captioned image couldn't be encoded.
    #[error("failed to encode the final image: {0}")]
    Encode(#[from] EncodeError),
}


/// Error while decoding image data.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Data is not an image in any supported format, or it is corrupted.
    #[error("{0}")]
    Format(#[from] ImageError),
    /// Error arising from the `gif` crate decoding process.
    #[error("invalid GIF: {0}")]
    Gif(#[from] gif::DecodingError),
    /// Error arising from the `gif-dispose` crate "rendering" process.
    #[error("GIF rendering error: {0}")]
    Dispose(String),
    /// Animation without any frames.
    #[error("animation has no frames")]
    NoFrames,
    /// Frames of an animation differ in size (or don't match their canvas).
    #[error("animation frames have inconsistent dimensions")]
    FrameSize,
}


/// Error while encoding the final image.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("{0}")]
    Image(#[from] ImageError),
    #[error("{0}")]
    Gif(#[from] gif::EncodingError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Image is too large for the GIF format.
    #[error("image of {0}x{1} pixels is too large for GIF")]
    TooLarge(u32, u32),
}
