//!
//! memecap  -- Captioned memes on demand
//!

             extern crate color_quant;
             extern crate gif;
             extern crate gif_dispose;
             extern crate html_escape;
             extern crate image;
             extern crate itertools;
#[macro_use] extern crate lazy_static;
#[macro_use] extern crate log;
             extern crate mime;
             extern crate regex;
             extern crate rusttype;
             extern crate serde;
             extern crate thiserror;
             extern crate unicode_normalization;
             extern crate ureq;
             extern crate url;


#[cfg(test)] #[macro_use] extern crate maplit;
#[cfg(test)]              extern crate png;
#[cfg(test)]              extern crate proptest;
#[cfg(test)] #[macro_use] extern crate serde_json;
#[cfg(test)] #[macro_use] extern crate spectral;
#[cfg(test)]              extern crate tempfile;


mod acquire;
mod caption;
mod model;
mod resources;
mod util;

pub mod rps;


pub use acquire::*;
pub use caption::*;
pub use model::*;
pub use resources::*;
