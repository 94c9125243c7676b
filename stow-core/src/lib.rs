mod as_value;
pub mod bulk;
mod config;
mod connection;
mod decode_type;
mod driver;
mod error;
mod logger;
mod materialize;
mod record;
mod service;
mod sql_writer;
mod staging;
mod statement;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use config::*;
pub use connection::*;
pub use decode_type::*;
pub use driver::*;
pub use error::*;
pub use logger::*;
pub use materialize::*;
pub use record::*;
pub use service::*;
pub use sql_writer::*;
pub use staging::*;
pub use statement::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
