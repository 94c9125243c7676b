use crate::memory::{MemoryConnection, MemoryTable, engine::Engine};
use std::{collections::BTreeMap, future::Future, sync::Arc, time::Duration};
use stow::{
    CommandKind, Config, Driver, Error, GenericSqlWriter, QueryResult, Result, RowLabeled,
    RowsAffected, StagingTable, Statement,
};
use tokio::sync::Mutex;

/// A bulk transfer received by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub table: String,
    pub rows: usize,
    pub timeout: Duration,
}

#[derive(Default, Debug)]
struct Failures {
    connect: bool,
    transfer: bool,
    /// Statements containing any of these fragments fail.
    statements: Vec<String>,
}

#[derive(Default, Debug)]
pub(crate) struct MemoryStore {
    tables: BTreeMap<String, MemoryTable>,
    /// Procedure bodies by lowercase name.
    procedures: BTreeMap<String, String>,
    history: Vec<Statement>,
    transfers: Vec<Transfer>,
    failures: Failures,
    opened: usize,
    open: usize,
    leaked: usize,
}

impl MemoryStore {
    pub(crate) fn connect(&mut self) -> Result<()> {
        if self.failures.connect {
            return Err(Error::msg("Injected failure: the store is unreachable"));
        }
        self.opened += 1;
        self.open += 1;
        Ok(())
    }

    pub(crate) fn disconnect(&mut self, temporary: usize) {
        self.open = self.open.saturating_sub(1);
        self.leaked += temporary;
    }

    pub(crate) fn execute(
        &mut self,
        temporary: &mut BTreeMap<String, MemoryTable>,
        statement: &Statement,
    ) -> Result<Vec<QueryResult>> {
        self.history.push(statement.clone());
        let sql = statement.sql.to_ascii_lowercase();
        if let Some(fragment) = self
            .failures
            .statements
            .iter()
            .find(|v| sql.contains(&v.to_ascii_lowercase()))
        {
            return Err(Error::msg(format!(
                "Injected failure on statement containing `{fragment}`"
            )));
        }
        let procedure;
        let statement = match statement.kind {
            CommandKind::Text => statement,
            CommandKind::StoredProcedure => {
                let name = statement.sql.trim();
                let Some(body) = self.procedures.get(&name.to_ascii_lowercase()) else {
                    return Err(Error::msg(format!(
                        "Could not find stored procedure '{name}'"
                    )));
                };
                procedure = Statement::new(body.as_str())
                    .with_parameters(statement.parameters.iter().cloned());
                &procedure
            }
        };
        Engine {
            tables: &mut self.tables,
            temporary,
        }
        .execute(statement)
    }

    pub(crate) fn transfer(
        &mut self,
        temporary: &mut BTreeMap<String, MemoryTable>,
        table: &str,
        staging: &StagingTable,
        timeout: Duration,
    ) -> Result<RowsAffected> {
        self.transfers.push(Transfer {
            table: table.into(),
            rows: staging.len(),
            timeout,
        });
        if self.failures.transfer {
            return Err(Error::msg(format!(
                "Injected failure: bulk transfer into {table} was interrupted"
            )));
        }
        Engine {
            tables: &mut self.tables,
            temporary,
        }
        .transfer(table, staging)
    }
}

/// In-memory store understanding the statements Stow generates.
///
/// Clones share the same store. Temporary tables (`#` prefixed) belong to the
/// connection that created them.
#[derive(Default, Clone, Debug)]
pub struct MemoryDriver {
    pub(crate) store: Arc<Mutex<MemoryStore>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Default::default()
    }

    /// Create or replace a table.
    pub async fn create_table(&self, table: MemoryTable) {
        self.store
            .lock()
            .await
            .tables
            .insert(table.name.to_ascii_lowercase(), table);
    }

    /// Create or replace a stored procedure. `body` is a batch that reads the
    /// arguments through its `@name` placeholders.
    pub async fn create_procedure(&self, name: &str, body: &str) {
        self.store
            .lock()
            .await
            .procedures
            .insert(name.to_ascii_lowercase(), body.into());
    }

    pub async fn table(&self, name: &str) -> Option<MemoryTable> {
        self.store
            .lock()
            .await
            .tables
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    pub async fn rows(&self, table: &str) -> Vec<RowLabeled> {
        self.table(table)
            .await
            .map(|t| t.labeled_rows())
            .unwrap_or_default()
    }

    /// Every statement received, in order, including the failed ones.
    pub async fn history(&self) -> Vec<Statement> {
        self.store.lock().await.history.clone()
    }

    pub async fn transfers(&self) -> Vec<Transfer> {
        self.store.lock().await.transfers.clone()
    }

    pub async fn clear_history(&self) {
        let mut store = self.store.lock().await;
        store.history.clear();
        store.transfers.clear();
    }

    pub async fn fail_on(&self, fragment: &str) {
        self.store
            .lock()
            .await
            .failures
            .statements
            .push(fragment.into());
    }

    pub async fn fail_connect(&self, fail: bool) {
        self.store.lock().await.failures.connect = fail;
    }

    pub async fn fail_transfer(&self, fail: bool) {
        self.store.lock().await.failures.transfer = fail;
    }

    pub async fn clear_failures(&self) {
        self.store.lock().await.failures = Default::default();
    }

    /// Connections opened since the driver was created.
    pub async fn connections_opened(&self) -> usize {
        self.store.lock().await.opened
    }

    /// Connections currently open.
    pub async fn connections_open(&self) -> usize {
        self.store.lock().await.open
    }

    /// Temporary tables still alive when their connection was closed.
    pub async fn leaked_temporary_tables(&self) -> usize {
        self.store.lock().await.leaked
    }
}

impl Driver for MemoryDriver {
    type Connection = MemoryConnection;
    type SqlWriter = GenericSqlWriter;

    const NAME: &'static str = "memory";

    fn sql_writer(&self) -> GenericSqlWriter {
        GenericSqlWriter::new()
    }

    fn connect(&self, config: &Config) -> impl Future<Output = Result<MemoryConnection>> + Send {
        log::debug!(
            "Connecting to the memory store `{}`",
            config.connection_string
        );
        let mut connection = MemoryConnection::new(self.clone());
        async move {
            stow::Connection::open(&mut connection).await?;
            Ok(connection)
        }
    }
}
