mod connection;
mod driver;
mod engine;
mod parse;
mod table;

pub use connection::*;
pub use driver::{MemoryDriver, Transfer};
pub use table::*;
