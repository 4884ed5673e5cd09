//! Command implementations for the quinto CLI

mod misc;
mod parse;
mod scrape;

pub use misc::*;
pub use parse::*;
pub use scrape::*;
