use crate::memory::{MemoryDriver, MemoryTable};
use async_stream::stream;
use std::{collections::BTreeMap, future::Future, time::Duration};
use stow::{
    Connection, Error, QueryResult, Result, RowsAffected, StagingTable, Statement,
    stream::Stream,
};

pub struct MemoryConnection {
    driver: MemoryDriver,
    open: bool,
    temporary: BTreeMap<String, MemoryTable>,
}

impl MemoryConnection {
    pub(crate) fn new(driver: MemoryDriver) -> Self {
        Self {
            driver,
            open: false,
            temporary: BTreeMap::new(),
        }
    }

    fn closed() -> Error {
        Error::msg("The connection is closed")
    }
}

impl Connection for MemoryConnection {
    type Driver = MemoryDriver;

    fn driver(&self) -> &MemoryDriver {
        &self.driver
    }

    fn open(&mut self) -> impl Future<Output = Result<()>> + Send {
        async move {
            if self.open {
                return Ok(());
            }
            if let Err(e) = self.driver.store.lock().await.connect() {
                log::error!("{e:#}");
                return Err(e);
            }
            self.open = true;
            Ok(())
        }
    }

    fn run(&mut self, statement: Statement) -> impl Stream<Item = Result<QueryResult>> + Send {
        let connection = self;
        stream! {
            let results = if connection.open {
                connection
                    .driver
                    .store
                    .lock()
                    .await
                    .execute(&mut connection.temporary, &statement)
            } else {
                Err(MemoryConnection::closed())
            };
            match results {
                Ok(results) => {
                    for result in results {
                        yield Ok(result);
                    }
                }
                Err(e) => {
                    let e = e.context(format!("While executing: {statement}"));
                    log::error!("{e:#}");
                    yield Err(e);
                }
            }
        }
    }

    fn bulk_transfer(
        &mut self,
        table: &str,
        staging: &StagingTable,
        timeout: Duration,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        async move {
            if !self.open {
                return Err(MemoryConnection::closed());
            }
            let result = self.driver.store.lock().await.transfer(
                &mut self.temporary,
                table,
                staging,
                timeout,
            );
            if let Err(e) = &result {
                log::error!("{e:#}");
            }
            result
        }
    }

    fn close(mut self) -> impl Future<Output = Result<()>> + Send {
        async move {
            if self.open {
                self.open = false;
                let temporary = std::mem::take(&mut self.temporary);
                self.driver.store.lock().await.disconnect(temporary.len());
            }
            Ok(())
        }
    }
}
