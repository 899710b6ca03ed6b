//! Data structures for command-line arguments.

use std::path::PathBuf;

use thiserror::Error;


/// Structure to hold options received from the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Verbosity of the logging output.
    ///
    /// Corresponds to the number of times the -v flag has been passed.
    /// If -q has been used instead, this will be negative.
    pub verbosity: isize,

    /// Image to caption.
    pub image: ImageArg,
    /// Caption text, with all the TEXT arguments joined by spaces.
    pub text: String,
    /// Path to write the captioned image to.
    ///
    /// If absent, it shall be written to standard output.
    pub output_path: Option<PathBuf>,

    /// Font file to use instead of the default one.
    pub font_path: Option<PathBuf>,
    /// Quality of JPEG images produced.
    pub jpeg_quality: Option<u8>,
    /// Quality of GIF images & animations produced.
    pub gif_quality: Option<u8>,
}

#[allow(dead_code)]
impl Options {
    #[inline]
    pub fn verbose(&self) -> bool { self.verbosity > 0 }
    #[inline]
    pub fn quiet(&self) -> bool { self.verbosity < 0 }
}


/// Where the image to caption should come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageArg {
    /// Image bytes are read from standard input.
    Stdin,
    /// URL or path of the image.
    Locator(String),
}


/// Error that can occur while parsing of command line arguments.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// General error when parsing the arguments.
    #[error("invalid arguments: {0}")]
    Parse(#[from] clap::Error),
    /// Caption consists only of whitespace.
    #[error("caption text cannot be empty")]
    EmptyText,
}
