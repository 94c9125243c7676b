use crate::{KeyRole, Record, RecordDescriptor, Result, Row, StowError, Value, truncate_long};

#[derive(Debug, Clone, PartialEq)]
pub struct StagingColumn {
    pub name: &'static str,
    /// Typed absent value describing the column type.
    pub value: Value,
    pub nullable: bool,
    pub role: KeyRole,
}

/// Columnar buffer holding one row per record, columns in descriptor order.
///
/// Drivers map columns to the destination by position and name, so the order of
/// `columns` and of every row is the order of the record's field descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct StagingTable {
    pub columns: Box<[StagingColumn]>,
    pub rows: Vec<Row>,
}

impl StagingTable {
    fn with_columns<R>(descriptor: &RecordDescriptor<R>, capacity: usize) -> Self {
        Self {
            columns: descriptor
                .fields
                .iter()
                .map(|f| StagingColumn {
                    name: f.name,
                    value: f.value.clone(),
                    nullable: !f.is_primary_key(),
                    role: f.role,
                })
                .collect(),
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Stage records for a bulk insert.
    ///
    /// Primary keys are always staged as NULL, the store assigns them. Absent
    /// default keys and absent values are staged as NULL as well.
    pub fn for_insert<R: Record>(records: &[R]) -> Self {
        let descriptor = R::descriptor();
        let mut result = Self::with_columns(descriptor, records.len());
        for record in records {
            let row = descriptor
                .fields
                .iter()
                .map(|field| {
                    if field.is_primary_key() {
                        field.value.as_null()
                    } else {
                        field.value_of(record)
                    }
                })
                .collect();
            result.rows.push(row);
        }
        result
    }

    /// Stage records for a bulk update, including the primary key column.
    ///
    /// Fails with [`StowError::MissingKeyForUpdate`] when the type has no primary
    /// key or any record lacks its value, and with [`StowError::EmptyUpdate`] when
    /// the key is the only field.
    pub fn for_update<R: Record>(records: &[R]) -> Result<Self> {
        let descriptor = R::descriptor();
        let Some(key) = descriptor.primary_key() else {
            return Err(StowError::MissingKeyForUpdate {
                type_name: descriptor.type_name,
                index: None,
            }
            .into());
        };
        if descriptor.fields.iter().all(|f| f.is_primary_key()) {
            return Err(StowError::EmptyUpdate {
                type_name: descriptor.type_name,
            }
            .into());
        }
        let mut result = Self::with_columns(descriptor, records.len());
        for (i, record) in records.iter().enumerate() {
            if key.value_of(record).is_null() {
                return Err(StowError::MissingKeyForUpdate {
                    type_name: descriptor.type_name,
                    index: Some(i),
                }
                .into());
            }
            result.rows.push(
                descriptor
                    .fields
                    .iter()
                    .map(|field| field.value_of(record))
                    .collect(),
            );
        }
        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn key_column(&self) -> Option<&StagingColumn> {
        self.columns.iter().find(|c| c.role == KeyRole::PrimaryKey)
    }

    /// Compact description of the batch used in failure reports: row count,
    /// columns and the staged keys, if any.
    pub fn summary(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(",");
        let mut result = format!("{} rows ({columns})", self.len());
        let Some(index) = self.columns.iter().position(|c| c.role == KeyRole::PrimaryKey) else {
            return result;
        };
        let keys = self
            .rows
            .iter()
            .map(|row| &row[index])
            .filter(|v| !v.is_null())
            .map(|v| serde_json::to_string(v).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(",");
        if !keys.is_empty() {
            result.push_str(&format!(" keys {}", truncate_long!(keys)));
        }
        result
    }
}
