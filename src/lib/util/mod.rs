//! Utility modules.

pub mod animated_gif;
pub mod text;
