use crate::{
    InsertStatement, Parameter, Record, Result, StagingColumn, Statement, StowError, Value,
    separated_by,
};
use std::fmt::Write;

/// Dialect used to turn records into SQL text.
///
/// Every method has a default producing SQL Server flavoured statements: `@name`
/// placeholders, `OUTPUT INSERTED` to read back identities and `#` prefixed
/// temporary tables. Drivers override the fragments their store spells differently.
///
/// Table names and where clauses are written verbatim: they are the only caller
/// text that reaches the SQL, every record value is bound as a [`Parameter`].
pub trait SqlWriter: Send + Sync {
    fn write_identifier(&self, out: &mut String, value: &str) {
        out.push_str(value);
    }

    fn write_table_name(&self, out: &mut String, value: &str) {
        out.push_str(value.trim());
    }

    fn write_placeholder(&self, out: &mut String, name: &str) {
        out.push('@');
        out.push_str(name);
    }

    fn write_column_type(&self, out: &mut String, value: &Value) {
        match value {
            Value::Null => out.push_str("SQL_VARIANT"),
            Value::Boolean(..) => out.push_str("BIT"),
            Value::Int8(..) => out.push_str("SMALLINT"),
            Value::Int16(..) => out.push_str("SMALLINT"),
            Value::Int32(..) => out.push_str("INT"),
            Value::Int64(..) => out.push_str("BIGINT"),
            Value::UInt8(..) => out.push_str("TINYINT"),
            Value::UInt16(..) => out.push_str("INT"),
            Value::UInt32(..) => out.push_str("BIGINT"),
            Value::UInt64(..) => out.push_str("DECIMAL(20,0)"),
            Value::Float32(..) => out.push_str("REAL"),
            Value::Float64(..) => out.push_str("FLOAT"),
            Value::Decimal(.., precision, scale) => {
                if (precision, scale) != (&0, &0) {
                    let _ = write!(out, "DECIMAL({},{})", precision, scale);
                } else {
                    out.push_str("DECIMAL(38,10)");
                }
            }
            Value::Char(..) => out.push_str("NCHAR(1)"),
            Value::Varchar(..) => out.push_str("NVARCHAR(MAX)"),
            Value::Blob(..) => out.push_str("VARBINARY(MAX)"),
            Value::Date(..) => out.push_str("DATE"),
            Value::Time(..) => out.push_str("TIME"),
            Value::Timestamp(..) => out.push_str("DATETIME2"),
            Value::TimestampWithTimezone(..) => out.push_str("DATETIMEOFFSET"),
            Value::Uuid(..) => out.push_str("UNIQUEIDENTIFIER"),
        }
    }

    /// Name of the temporary table staging a bulk update of `table`.
    fn temporary_table_name(&self, table: &str) -> String {
        let mut result = String::from("#Stow");
        result.extend(
            table
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_'),
        );
        result
    }

    /// `INSERT INTO <table> (<cols>) [OUTPUT INSERTED.<pk>] VALUES (<@cols>)`
    ///
    /// The primary key is never listed, absent default keys are left out so the
    /// store applies its default, any other absent value is bound as NULL. Returns the
    /// primary key column, if any.
    fn write_insert<R: Record>(
        &self,
        out: &mut String,
        parameters: &mut Vec<Parameter>,
        record: &R,
        table: &str,
    ) -> Option<&'static str>
    where
        Self: Sized,
    {
        let descriptor = R::descriptor();
        let primary_key = descriptor.primary_key().map(|f| f.name);
        let columns = descriptor
            .fields
            .iter()
            .filter(|f| !f.is_primary_key())
            .map(|f| (f, f.value_of(record)))
            .filter(|(f, v)| !(f.is_default_key() && v.is_null()))
            .collect::<Vec<_>>();
        out.push_str("INSERT INTO ");
        self.write_table_name(out, table);
        if !columns.is_empty() {
            out.push_str(" (");
            separated_by(
                out,
                columns.iter(),
                |out, (f, _)| self.write_identifier(out, f.name),
                ",",
            );
            out.push(')');
        }
        if let Some(primary_key) = primary_key {
            out.push_str(" OUTPUT INSERTED.");
            self.write_identifier(out, primary_key);
        }
        if columns.is_empty() {
            out.push_str(" DEFAULT VALUES");
            return primary_key;
        }
        out.push_str(" VALUES (");
        separated_by(
            out,
            columns.iter(),
            |out, (f, _)| self.write_placeholder(out, f.name),
            ",",
        );
        out.push(')');
        parameters.extend(
            columns
                .into_iter()
                .map(|(f, v)| Parameter::new(f.name, v)),
        );
        primary_key
    }

    /// `UPDATE <table> SET <col> = @<col>, .. <predicate>`
    ///
    /// Only present, non key fields are set, so absent values never overwrite what
    /// is stored. A non blank `where_clause` is appended verbatim, otherwise the
    /// predicate is the primary key.
    fn write_update<R: Record>(
        &self,
        out: &mut String,
        parameters: &mut Vec<Parameter>,
        record: &R,
        table: &str,
        where_clause: Option<&str>,
    ) -> Result<()>
    where
        Self: Sized,
    {
        let descriptor = R::descriptor();
        let where_clause = where_clause.map(str::trim).filter(|v| !v.is_empty());
        let key = match where_clause {
            Some(..) => None,
            None => {
                let key = descriptor
                    .primary_key()
                    .map(|f| (f.name, f.value_of(record)))
                    .filter(|(_, v)| !v.is_null());
                if key.is_none() {
                    return Err(StowError::MissingUpdatePredicate {
                        type_name: descriptor.type_name,
                    }
                    .into());
                }
                key
            }
        };
        let columns = descriptor
            .fields
            .iter()
            .filter(|f| !f.is_primary_key())
            .map(|f| (f.name, f.value_of(record)))
            .filter(|(_, v)| !v.is_null())
            .collect::<Vec<_>>();
        if columns.is_empty() {
            return Err(StowError::EmptyUpdate {
                type_name: descriptor.type_name,
            }
            .into());
        }
        out.push_str("UPDATE ");
        self.write_table_name(out, table);
        out.push_str(" SET ");
        separated_by(
            out,
            columns.iter(),
            |out, (name, _)| {
                self.write_identifier(out, name);
                out.push_str(" = ");
                self.write_placeholder(out, name);
            },
            ", ",
        );
        parameters.extend(columns.into_iter().map(|(n, v)| Parameter::new(n, v)));
        if let Some(where_clause) = where_clause {
            out.push(' ');
            out.push_str(where_clause);
        } else if let Some((name, value)) = key {
            out.push_str(" WHERE ");
            self.write_identifier(out, name);
            out.push_str(" = ");
            self.write_placeholder(out, name);
            parameters.push(Parameter::new(name, value));
        }
        Ok(())
    }

    /// `SELECT * FROM <table> [<where_clause>]`
    fn write_select(&self, out: &mut String, table: &str, where_clause: Option<&str>) {
        out.push_str("SELECT * FROM ");
        self.write_table_name(out, table);
        if let Some(where_clause) = where_clause.map(str::trim).filter(|v| !v.is_empty()) {
            out.push(' ');
            out.push_str(where_clause);
        }
    }

    /// Declares the temporary table receiving a staged batch. Every column is
    /// nullable except the primary key.
    fn write_create_temporary_table(&self, out: &mut String, name: &str, columns: &[StagingColumn]) {
        out.push_str("CREATE TABLE ");
        self.write_table_name(out, name);
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, c| {
                self.write_identifier(out, c.name);
                out.push(' ');
                self.write_column_type(out, &c.value);
                if !c.nullable {
                    out.push_str(" NOT NULL");
                }
            },
            ", ",
        );
        out.push(')');
    }

    /// Copies every staged column but `key` onto the rows of `target` sharing the key,
    /// then drops the staging table.
    fn write_merge_update(
        &self,
        out: &mut String,
        target: &str,
        staging: &str,
        columns: &[StagingColumn],
        key: &str,
    ) {
        out.push_str("UPDATE ");
        self.write_table_name(out, target);
        out.push_str(" SET ");
        separated_by(
            out,
            columns.iter().filter(|c| !c.name.eq_ignore_ascii_case(key)),
            |out, c| {
                self.write_table_name(out, target);
                out.push('.');
                self.write_identifier(out, c.name);
                out.push_str(" = ");
                self.write_table_name(out, staging);
                out.push('.');
                self.write_identifier(out, c.name);
            },
            ", ",
        );
        out.push_str(" FROM ");
        self.write_table_name(out, target);
        out.push_str(" INNER JOIN ");
        self.write_table_name(out, staging);
        out.push_str(" ON ");
        self.write_table_name(out, target);
        out.push('.');
        self.write_identifier(out, key);
        out.push_str(" = ");
        self.write_table_name(out, staging);
        out.push('.');
        self.write_identifier(out, key);
        out.push_str("; ");
        self.write_drop_table(out, staging);
    }

    fn write_drop_table(&self, out: &mut String, name: &str) {
        out.push_str("DROP TABLE ");
        self.write_table_name(out, name);
        out.push(';');
    }

    fn build_insert<R: Record>(&self, record: &R, table: &str) -> InsertStatement
    where
        Self: Sized,
    {
        let mut statement = Statement::default();
        statement.sql.reserve(128);
        let primary_key =
            self.write_insert(&mut statement.sql, &mut statement.parameters, record, table);
        InsertStatement {
            statement,
            primary_key,
        }
    }

    fn build_update<R: Record>(
        &self,
        record: &R,
        table: &str,
        where_clause: Option<&str>,
    ) -> Result<Statement>
    where
        Self: Sized,
    {
        let mut statement = Statement::default();
        statement.sql.reserve(128);
        self.write_update(
            &mut statement.sql,
            &mut statement.parameters,
            record,
            table,
            where_clause,
        )?;
        Ok(statement)
    }

    fn build_select(&self, table: &str, where_clause: Option<&str>) -> Statement {
        let mut statement = Statement::default();
        self.write_select(&mut statement.sql, table, where_clause);
        statement
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for GenericSqlWriter {}
