use crate::{
    Config, Connection, Context, Driver, Error, InsertStatement, Logger, Materialize, Parameter,
    Record, Result, RowLabeled, SqlCommand, SqlWriter, StagingTable, Statement, StowError, bulk,
    stream::TryStreamExt,
};
use std::{fmt, sync::Arc};

fn store_failure(operation: &'static str) -> StowError {
    StowError::StoreExecutionFailure { operation }
}

/// Typed access to a store.
///
/// Every operation opens its own connection through the driver, runs to completion
/// and closes it, so a service can be shared between tasks. Failures are reported
/// to the `log` facade and to the configured [`Logger`], after the connection is
/// closed and before the error is returned.
pub struct DataService<D: Driver> {
    driver: D,
    config: Config,
    logger: Option<Arc<dyn Logger>>,
}

impl<D: Driver> DataService<D> {
    pub fn new(driver: D, config: Config) -> Self {
        Self {
            driver,
            config,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run arbitrary SQL, or a stored procedure given as [`SqlCommand::procedure`],
    /// and return the raw rows.
    pub async fn query_rows(
        &self,
        command: impl Into<SqlCommand>,
        parameters: impl IntoIterator<Item = Parameter>,
    ) -> Result<Vec<RowLabeled>> {
        const OPERATION: &str = "query";
        let result: Result<Vec<RowLabeled>> = async {
            let statement = self.raw_statement(command.into(), parameters)?;
            self.fetch(statement, OPERATION).await
        }
        .await;
        self.reported(OPERATION, result)
    }

    /// Run arbitrary SQL and return the rows as a JSON array of objects, keys in
    /// column order.
    pub async fn query_document(
        &self,
        command: impl Into<SqlCommand>,
        parameters: impl IntoIterator<Item = Parameter>,
    ) -> Result<serde_json::Value> {
        const OPERATION: &str = "query document";
        let result: Result<serde_json::Value> = async {
            let statement = self.raw_statement(command.into(), parameters)?;
            let rows = self.fetch(statement, OPERATION).await?;
            let mut document = Vec::with_capacity(rows.len());
            for row in rows {
                let mut object = serde_json::Map::with_capacity(row.labels.len());
                for (label, value) in row.labels.iter().zip(row.values.iter()) {
                    object.insert(label.clone(), serde_json::to_value(value)?);
                }
                document.push(serde_json::Value::Object(object));
            }
            Ok(serde_json::Value::Array(document))
        }
        .await;
        self.reported(OPERATION, result)
    }

    /// Run arbitrary SQL and materialize every row as `T`, a record or a scalar.
    pub async fn query<T: Materialize>(
        &self,
        command: impl Into<SqlCommand>,
        parameters: impl IntoIterator<Item = Parameter>,
    ) -> Result<Vec<T>> {
        const OPERATION: &str = "query";
        let result: Result<Vec<T>> = async {
            let statement = self.raw_statement(command.into(), parameters)?;
            self.fetch(statement, OPERATION)
                .await?
                .into_iter()
                .map(T::materialize)
                .collect()
        }
        .await;
        self.reported(OPERATION, result)
    }

    /// `SELECT * FROM <table> <where_clause>`, the table defaults to the record's.
    ///
    /// `where_clause` is written verbatim, it must come from trusted code.
    pub async fn query_table<T: Record>(
        &self,
        where_clause: Option<&str>,
        table_name: Option<&str>,
    ) -> Result<Vec<T>> {
        const OPERATION: &str = "query table";
        let result: Result<Vec<T>> = async {
            let table = T::descriptor().table_or(table_name);
            let statement = self.timed(self.driver.sql_writer().build_select(table, where_clause));
            self.fetch(statement, OPERATION)
                .await?
                .into_iter()
                .map(T::materialize)
                .collect()
        }
        .await;
        self.reported(OPERATION, result)
    }

    /// Insert one record.
    ///
    /// When the record has a primary key the identity generated by the store is
    /// written back into it and the result tells whether one came back, otherwise
    /// the result tells whether any row was inserted.
    pub async fn insert<T: Record>(&self, record: &mut T, table_name: Option<&str>) -> Result<bool> {
        const OPERATION: &str = "insert";
        let result: Result<bool> = async {
            let descriptor = T::descriptor();
            let table = descriptor.table_or(table_name);
            let InsertStatement {
                statement,
                primary_key,
            } = self.driver.sql_writer().build_insert(record, table);
            let statement = self.timed(statement);
            let Some(primary_key) = primary_key.and_then(|v| descriptor.field(v)) else {
                return Ok(self.execute(statement, OPERATION).await? > 0);
            };
            let identity = self
                .fetch(statement, OPERATION)
                .await?
                .into_iter()
                .next()
                .and_then(|row| {
                    let index = row
                        .labels
                        .iter()
                        .position(|v| primary_key.matches(v))
                        .unwrap_or_default();
                    row.values.into_vec().into_iter().nth(index)
                })
                .filter(|v| !v.is_null());
            let Some(identity) = identity else {
                return Ok(false);
            };
            (primary_key.set)(record, identity).with_context(|| {
                format!(
                    "While writing the generated identity back to `{}::{}`",
                    descriptor.type_name, primary_key.name
                )
            })?;
            Ok(true)
        }
        .await;
        self.reported(OPERATION, result)
    }

    /// Insert a batch with a single bulk transfer. An empty batch does nothing and
    /// returns `false`.
    pub async fn bulk_insert<T: Record>(&self, records: &[T], table_name: Option<&str>) -> Result<bool> {
        const OPERATION: &str = "bulk insert";
        if records.is_empty() {
            return Ok(false);
        }
        let staging = StagingTable::for_insert(records);
        let result: Result<bool> = async {
            let table = T::descriptor().table_or(table_name);
            let mut connection = self.connect(OPERATION).await?;
            let result = bulk::insert(
                &mut connection,
                table,
                &staging,
                self.config.bulk_timeout(),
            )
            .await
            .context(store_failure(OPERATION));
            self.close(connection).await;
            result.map(|_| true)
        }
        .await;
        self.reported_batch(OPERATION, Some(&staging), result)
    }

    /// Update one record. Absent fields are left untouched in the store.
    ///
    /// A non blank `where_clause` is written verbatim after the `SET` list and
    /// replaces the primary key predicate.
    pub async fn update<T: Record>(
        &self,
        record: &T,
        where_clause: Option<&str>,
        table_name: Option<&str>,
    ) -> Result<bool> {
        const OPERATION: &str = "update";
        let result: Result<bool> = async {
            let table = T::descriptor().table_or(table_name);
            let statement = self.driver.sql_writer().build_update(record, table, where_clause)?;
            Ok(self.execute(self.timed(statement), OPERATION).await? > 0)
        }
        .await;
        self.reported(OPERATION, result)
    }

    /// Update a batch through a temporary table merged on the primary key.
    ///
    /// Every record must carry its key, this is checked before connecting. Unlike
    /// [`DataService::update`] every field is copied, absent ones included.
    pub async fn bulk_update<T: Record>(&self, records: &[T], table_name: Option<&str>) -> Result<bool> {
        const OPERATION: &str = "bulk update";
        if records.is_empty() {
            return Ok(false);
        }
        let staging = match StagingTable::for_update(records) {
            Ok(staging) => staging,
            Err(error) => return self.reported(OPERATION, Err(error)),
        };
        let result: Result<bool> = async {
            let table = T::descriptor().table_or(table_name);
            let mut connection = self.connect(OPERATION).await?;
            let result = bulk::update(
                &mut connection,
                table,
                &staging,
                self.config.command_timeout,
                self.config.bulk_timeout(),
            )
            .await
            .context(store_failure(OPERATION));
            self.close(connection).await;
            Ok(result?.rows_affected > 0)
        }
        .await;
        self.reported_batch(OPERATION, Some(&staging), result)
    }

    fn raw_statement(
        &self,
        command: SqlCommand,
        parameters: impl IntoIterator<Item = Parameter>,
    ) -> Result<Statement> {
        if command.text.trim().is_empty() {
            return Err(StowError::EmptyStatement.into());
        }
        Ok(self.timed(
            Statement::new(command.text)
                .with_kind(command.kind)
                .with_parameters(parameters),
        ))
    }

    fn timed(&self, statement: Statement) -> Statement {
        statement.with_timeout(self.config.command_timeout)
    }

    async fn connect(&self, operation: &'static str) -> Result<D::Connection> {
        self.driver
            .connect(&self.config)
            .await
            .context(store_failure(operation))
    }

    async fn close(&self, connection: D::Connection) {
        if let Err(e) = connection.close().await {
            log::warn!("Could not close the {} connection: {e:#}", D::NAME);
        }
    }

    async fn fetch(&self, statement: Statement, operation: &'static str) -> Result<Vec<RowLabeled>> {
        let mut connection = self.connect(operation).await?;
        log::debug!("{statement}");
        let result = connection
            .fetch(statement)
            .try_collect::<Vec<_>>()
            .await
            .context(store_failure(operation));
        self.close(connection).await;
        result
    }

    async fn execute(&self, statement: Statement, operation: &'static str) -> Result<u64> {
        let mut connection = self.connect(operation).await?;
        log::debug!("{statement}");
        let result = connection
            .execute(statement)
            .await
            .context(store_failure(operation));
        self.close(connection).await;
        Ok(result?.rows_affected)
    }

    fn reported<T>(&self, operation: &'static str, result: Result<T>) -> Result<T> {
        self.reported_batch(operation, None, result)
    }

    fn reported_batch<T>(
        &self,
        operation: &'static str,
        batch: Option<&StagingTable>,
        result: Result<T>,
    ) -> Result<T> {
        if let Err(error) = &result {
            self.report(operation, batch, error);
        }
        result
    }

    fn report(&self, operation: &'static str, batch: Option<&StagingTable>, error: &Error) {
        let message = match batch {
            Some(batch) => format!("Stow {operation} on {} failed for {}", D::NAME, batch.summary()),
            None => format!("Stow {operation} on {} failed", D::NAME),
        };
        log::error!("{message}: {error:#}");
        if let Some(logger) = &self.logger {
            if !logger.log(&message, Some(error)) {
                log::warn!("The fallback logger could not record the failure");
            }
        }
    }
}

impl<D: Driver + fmt::Debug> fmt::Debug for DataService<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataService")
            .field("driver", &self.driver)
            .field("config", &self.config)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}
