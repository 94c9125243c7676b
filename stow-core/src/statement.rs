use crate::{Value, truncate_long};
use std::{
    fmt::{self, Display},
    sync::Arc,
    time::Duration,
};

/// A value bound to an `@name` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Placeholder name without the `@`.
    pub name: String,
    pub value: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// How the store reads the text of a [`Statement`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// The text is a SQL batch.
    #[default]
    Text,
    /// The text is the name of a stored procedure, parameters are its arguments.
    StoredProcedure,
}

/// SQL text with the values bound to its placeholders.
///
/// Values never appear inside `sql`, drivers send `parameters` separately.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub parameters: Vec<Parameter>,
    /// Per command timeout, `None` leaves the driver default.
    pub timeout: Option<Duration>,
    pub kind: CommandKind,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Default::default()
        }
    }
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.parameters.push(Parameter::new(name, value));
        self
    }
    pub fn with_parameters(mut self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
    pub fn with_kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| &p.value)
    }
}

impl From<&str> for Statement {
    fn from(value: &str) -> Self {
        Statement::new(value)
    }
}

impl From<String> for Statement {
    fn from(value: String) -> Self {
        Statement::new(value)
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == CommandKind::StoredProcedure {
            f.write_str("EXEC ")?;
        }
        write!(f, "{}", truncate_long!(self.sql))
    }
}

/// Caller supplied command for the raw query operations of
/// [`DataService`](crate::DataService).
///
/// Plain strings convert to [`CommandKind::Text`], stored procedures are called by
/// name through [`SqlCommand::procedure`].
#[derive(Default, Debug, Clone, PartialEq)]
pub struct SqlCommand {
    pub text: String,
    pub kind: CommandKind,
}

impl SqlCommand {
    pub fn text(sql: impl Into<String>) -> Self {
        Self {
            text: sql.into(),
            kind: CommandKind::Text,
        }
    }
    pub fn procedure(name: impl Into<String>) -> Self {
        Self {
            text: name.into(),
            kind: CommandKind::StoredProcedure,
        }
    }
}

impl From<&str> for SqlCommand {
    fn from(value: &str) -> Self {
        SqlCommand::text(value)
    }
}

impl From<&String> for SqlCommand {
    fn from(value: &String) -> Self {
        SqlCommand::text(value.as_str())
    }
}

impl From<String> for SqlCommand {
    fn from(value: String) -> Self {
        SqlCommand::text(value)
    }
}

/// Output of the insert builder.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub statement: Statement,
    /// Identity column requested back with `OUTPUT INSERTED`.
    pub primary_key: Option<&'static str>,
}

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names, shared by all the rows of a result set.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    /// Case insensitive column lookup.
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v.eq_ignore_ascii_case(name))
            .map(|i| &self.values[i])
    }
}

/// Heterogeneous items emitted by `Connection::run` combining rows and modify results.
#[derive(Debug)]
pub enum QueryResult {
    Row(RowLabeled),
    Affected(RowsAffected),
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
        }
    }
}

impl From<RowLabeled> for QueryResult {
    fn from(value: RowLabeled) -> Self {
        QueryResult::Row(value)
    }
}

impl From<RowsAffected> for QueryResult {
    fn from(value: RowsAffected) -> Self {
        QueryResult::Affected(value)
    }
}
