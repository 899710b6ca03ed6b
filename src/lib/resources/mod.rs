//! Module handling the resources used for captioning.

mod fonts;


pub use self::fonts::{Font, FontError, DEFAULT_FONT_PATH};

#[cfg(test)]
pub(crate) use self::fonts::tests;
