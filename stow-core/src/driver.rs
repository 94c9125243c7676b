use crate::{Config, Connection, Result, SqlWriter};
use std::future::Future;

/// Entry point of a store implementation.
pub trait Driver: Send + Sync + Sized {
    type Connection: Connection<Driver = Self>;
    type SqlWriter: SqlWriter;

    /// Human readable name, used in logs.
    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;

    /// Open a new connection described by `config`.
    fn connect(&self, config: &Config) -> impl Future<Output = Result<Self::Connection>> + Send;
}
