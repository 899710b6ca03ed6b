//! Module defining the data model of captioning.

mod color;
mod image;
mod source;


pub use self::color::Color;
pub use self::image::{Animation, ColorMode, DecodedImage, Frame, StillImage};
pub use self::source::{ImageSource, UnsupportedInput};
