use stow::{AsValue, Error, Record, Result, Row, RowLabeled, RowNames, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryColumn {
    pub name: String,
    /// Typed absent value, `Value::Null` when the type is unknown.
    pub value: Value,
    pub identity: bool,
    pub not_null: bool,
    pub default: Option<Value>,
}

/// Table held by the [`MemoryDriver`](crate::MemoryDriver).
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryTable {
    pub name: String,
    pub columns: Vec<MemoryColumn>,
    pub rows: Vec<Row>,
    next_identity: i64,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            next_identity: 1,
        }
    }

    /// Table mirroring the descriptor of `R`: the primary key becomes the identity.
    pub fn for_record<R: Record>(table_name: Option<&str>) -> Self {
        let descriptor = R::descriptor();
        let mut result = Self::new(descriptor.table_or(table_name));
        for field in descriptor.fields.iter() {
            result.columns.push(MemoryColumn {
                name: field.name.into(),
                value: field.value.clone(),
                identity: field.is_primary_key(),
                not_null: field.is_primary_key(),
                default: None,
            });
        }
        result
    }

    pub fn column(mut self, name: impl Into<String>, value: Value) -> Self {
        self.columns.push(MemoryColumn {
            name: name.into(),
            value,
            identity: false,
            not_null: false,
            default: None,
        });
        self
    }

    /// Value stored when an insert leaves `column` out or a bulk transfer sends NULL.
    pub fn with_default(mut self, column: &str, value: impl AsValue) -> Self {
        if let Some(c) = self.columns.iter_mut().find(|c| c.name.eq_ignore_ascii_case(column)) {
            c.default = Some(value.as_value());
        }
        self
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::msg(format!("Invalid column name '{name}' in {}", self.name)))
    }

    pub fn labels(&self) -> RowNames {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn labeled_rows(&self) -> Vec<RowLabeled> {
        let labels = self.labels();
        self.rows
            .iter()
            .map(|row| RowLabeled::new(labels.clone(), row.clone()))
            .collect()
    }

    /// Row of absent values, with defaults and the next identity applied.
    pub(crate) fn blank_row(&mut self) -> Row {
        let next = self.next_identity;
        let mut generated = false;
        let row = self
            .columns
            .iter()
            .map(|c| {
                if c.identity {
                    generated = true;
                    identity_value(&c.value, next)
                } else {
                    c.default.clone().unwrap_or_else(|| c.value.as_null())
                }
            })
            .collect();
        if generated {
            self.next_identity += 1;
        }
        row
    }

    pub(crate) fn check_row(&self, row: &Row) -> Result<()> {
        for (column, value) in self.columns.iter().zip(row.iter()) {
            if column.not_null && value.is_null() {
                return Err(Error::msg(format!(
                    "Cannot insert the value NULL into column '{}', table '{}'",
                    column.name, self.name
                )));
            }
        }
        Ok(())
    }
}

fn identity_value(template: &Value, n: i64) -> Value {
    match template {
        Value::Int8(..) => (n as i8).as_value(),
        Value::Int16(..) => (n as i16).as_value(),
        Value::Int32(..) => (n as i32).as_value(),
        Value::UInt8(..) => (n as u8).as_value(),
        Value::UInt16(..) => (n as u16).as_value(),
        Value::UInt32(..) => (n as u32).as_value(),
        Value::UInt64(..) => (n as u64).as_value(),
        Value::Decimal(.., precision, scale) => {
            Value::Decimal(Some(rust_decimal::Decimal::from(n)), *precision, *scale)
        }
        _ => n.as_value(),
    }
}
