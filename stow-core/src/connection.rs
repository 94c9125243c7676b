use crate::{
    Driver, QueryResult, Result, RowLabeled, RowsAffected, StagingTable, Statement,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::{future::Future, time::Duration};

/// One open session with the store.
///
/// Obtained from [`Driver::connect`] already opened. Statements on the same
/// connection run sequentially, temporary tables live as long as the session.
pub trait Connection: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// Establish the session, drivers call it from [`Driver::connect`](crate::Driver::connect).
    /// No-op when already open.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send any statement and stream back rows and affected counts as they come.
    fn run(&mut self, statement: Statement) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Execute the statement and return the rows.
    fn fetch(&mut self, statement: Statement) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(statement).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute the statement and return the total number of rows affected.
    fn execute(&mut self, statement: Statement) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(statement)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }

    /// Move every row of `staging` into `table` in a single round trip.
    ///
    /// Columns are mapped by name, in the staging table order.
    fn bulk_transfer(
        &mut self,
        table: &str,
        staging: &StagingTable,
        timeout: Duration,
    ) -> impl Future<Output = Result<RowsAffected>> + Send;

    /// Release the session. Must be safe to call on a connection in any state.
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}
