//! Module implementing image captioning.

mod engine;
mod error;
mod fit;
mod output;
mod task;

#[cfg(test)]
mod tests;


pub use self::engine::{Builder as EngineBuilder,
                       BuildError as EngineBuildError,
                       Config as EngineConfig,
                       Engine,
                       DEFAULT_GIF_QUALITY, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DOWNLOAD_SIZE};
pub use self::error::{CaptionError, DecodeError, EncodeError};
pub use self::fit::{fit, fits, FitResult, TextBox, LINE_SPACING, MAX_LINES, MIN_FONT_SIZE};
pub use self::output::CaptionOutput;
