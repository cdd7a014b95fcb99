//! Config file loading and option resolution

mod file;
mod resolver;

pub use file::*;
pub use resolver::*;
