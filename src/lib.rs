pub mod classify;
pub mod cli;
pub mod collect;
pub mod config;
pub mod dom;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod record;
pub mod structured;

pub use error::{QuintoError, Result};
pub use parser::Extractor;
pub use record::{PropertyRecord, Status};
