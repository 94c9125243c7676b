use crate::memory::{
    parse::{ColumnRef, Command, Join, Operand, Predicate, Projection, parse},
    table::{MemoryColumn, MemoryTable},
};
use std::collections::BTreeMap;
use stow::{
    AsValue, Error, QueryResult, Result, Row, RowLabeled, RowNames, RowsAffected, StagingTable,
    Statement, Value,
};
use uuid::Uuid;

/// Tables visible from one session: the shared ones and the session's temporary ones.
pub(crate) struct Engine<'a> {
    pub(crate) tables: &'a mut BTreeMap<String, MemoryTable>,
    pub(crate) temporary: &'a mut BTreeMap<String, MemoryTable>,
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// SQL equality: NULL never matches.
fn same(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    if let (Ok(a), Ok(b)) = (
        i64::try_from_value(a.clone()),
        i64::try_from_value(b.clone()),
    ) {
        return a == b;
    }
    if matches!(a, Value::Uuid(..)) || matches!(b, Value::Uuid(..)) {
        return match (Uuid::try_from_value(a.clone()), Uuid::try_from_value(b.clone())) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
    }
    a == b
}

impl Engine<'_> {
    fn table(&self, name: &str) -> Result<&MemoryTable> {
        let map = if name.starts_with('#') {
            &*self.temporary
        } else {
            &*self.tables
        };
        map.get(&key(name))
            .ok_or_else(|| Error::msg(format!("Invalid object name '{name}'")))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut MemoryTable> {
        let map = if name.starts_with('#') {
            &mut *self.temporary
        } else {
            &mut *self.tables
        };
        map.get_mut(&key(name))
            .ok_or_else(|| Error::msg(format!("Invalid object name '{name}'")))
    }

    pub(crate) fn execute(&mut self, statement: &Statement) -> Result<Vec<QueryResult>> {
        let mut results = Vec::new();
        for command in parse(&statement.sql)? {
            results.extend(self.command(command, statement)?);
        }
        Ok(results)
    }

    fn command(&mut self, command: Command, statement: &Statement) -> Result<Vec<QueryResult>> {
        match command {
            Command::Insert {
                table,
                columns,
                output,
                values,
            } => {
                let table = self.table_mut(&table)?;
                let mut row = table.blank_row();
                for (column, operand) in columns.iter().zip(values.iter()) {
                    let i = table.column_index(column)?;
                    if table.columns[i].identity {
                        return Err(Error::msg(format!(
                            "Cannot insert explicit value for identity column in table '{}'",
                            table.name
                        )));
                    }
                    row[i] = evaluate(operand, statement, &|c: &ColumnRef| {
                        Err(Error::msg(format!("Column `{}` is not allowed here", c.name)))
                    })?;
                }
                table.check_row(&row)?;
                let mut results = Vec::new();
                if let Some(output) = output {
                    let i = table.column_index(&output)?;
                    results.push(QueryResult::Row(RowLabeled::new(
                        RowNames::from([table.columns[i].name.clone()]),
                        Row::from([row[i].clone()]),
                    )));
                }
                table.rows.push(row);
                results.push(RowsAffected { rows_affected: 1 }.into());
                Ok(results)
            }
            Command::Update {
                table,
                set,
                join,
                predicate,
            } => {
                let affected = match join {
                    None => self.update(&table, &set, &predicate, statement)?,
                    Some(join) => self.update_join(&table, &set, &join, statement)?,
                };
                Ok(vec![RowsAffected { rows_affected: affected }.into()])
            }
            Command::Delete { table, predicate } => {
                let table = self.table_mut(&table)?;
                let columns = table.columns.clone();
                let before = table.rows.len();
                let mut error = None;
                table.rows.retain(|row| {
                    match matches(&predicate, statement, &columns, row) {
                        Ok(v) => !v,
                        Err(e) => {
                            error.get_or_insert(e);
                            true
                        }
                    }
                });
                if let Some(error) = error {
                    return Err(error);
                }
                Ok(vec![
                    RowsAffected {
                        rows_affected: (before - table.rows.len()) as u64,
                    }
                    .into(),
                ])
            }
            Command::Select {
                projection,
                table,
                predicate,
            } => self.select(projection, table.as_deref(), &predicate, statement),
            Command::CreateTable { table, columns } => {
                let map = if table.starts_with('#') {
                    &mut *self.temporary
                } else {
                    &mut *self.tables
                };
                if map.contains_key(&key(&table)) {
                    return Err(Error::msg(format!(
                        "There is already an object named '{table}' in the database"
                    )));
                }
                let mut created = MemoryTable::new(&table);
                created.columns = columns
                    .into_iter()
                    .map(|(name, not_null)| MemoryColumn {
                        name,
                        value: Value::Null,
                        identity: false,
                        not_null,
                        default: None,
                    })
                    .collect();
                map.insert(key(&table), created);
                Ok(vec![RowsAffected::default().into()])
            }
            Command::DropTable { table } => {
                let map = if table.starts_with('#') {
                    &mut *self.temporary
                } else {
                    &mut *self.tables
                };
                if map.remove(&key(&table)).is_none() {
                    return Err(Error::msg(format!(
                        "Cannot drop the table '{table}', because it does not exist"
                    )));
                }
                Ok(vec![RowsAffected::default().into()])
            }
        }
    }

    fn update(
        &mut self,
        table: &str,
        set: &[(ColumnRef, Operand)],
        predicate: &Predicate,
        statement: &Statement,
    ) -> Result<u64> {
        let table = self.table_mut(table)?;
        let targets = assignments(table, set)?;
        let columns = table.columns.clone();
        let mut affected = 0;
        for row in table.rows.iter_mut() {
            if !matches(predicate, statement, &columns, row)? {
                continue;
            }
            let values = targets
                .iter()
                .map(|(i, operand)| {
                    let value = evaluate(operand, statement, &|c: &ColumnRef| {
                        lookup(&columns, &*row, c)
                    })?;
                    Ok((*i, value))
                })
                .collect::<Result<Vec<_>>>()?;
            for (i, value) in values {
                row[i] = value;
            }
            affected += 1;
        }
        Ok(affected)
    }

    fn update_join(
        &mut self,
        table: &str,
        set: &[(ColumnRef, Operand)],
        join: &Join,
        statement: &Statement,
    ) -> Result<u64> {
        let source = self.table(&join.table)?.clone();
        let target = self.table_mut(table)?;
        let is_source = |c: &ColumnRef| {
            c.qualifier
                .as_deref()
                .is_some_and(|q| q.eq_ignore_ascii_case(&source.name))
        };
        let (target_key, source_key) = if is_source(&join.on.0) {
            (&join.on.1, &join.on.0)
        } else {
            (&join.on.0, &join.on.1)
        };
        let target_key = target.column_index(&target_key.name)?;
        let source_key = source.column_index(&source_key.name)?;
        let targets = assignments(target, set)?;
        let columns = target.columns.clone();
        let mut affected = 0;
        for row in target.rows.iter_mut() {
            let Some(matched) = source
                .rows
                .iter()
                .find(|s| same(&row[target_key], &s[source_key]))
            else {
                continue;
            };
            let values = targets
                .iter()
                .map(|(i, operand)| {
                    let value = evaluate(operand, statement, &|c: &ColumnRef| {
                        if is_source(c) {
                            lookup(&source.columns, matched, c)
                        } else {
                            lookup(&columns, &*row, c)
                        }
                    })?;
                    Ok((*i, value))
                })
                .collect::<Result<Vec<_>>>()?;
            for (i, value) in values {
                row[i] = value;
            }
            affected += 1;
        }
        Ok(affected)
    }

    fn select(
        &self,
        projection: Projection,
        table: Option<&str>,
        predicate: &Predicate,
        statement: &Statement,
    ) -> Result<Vec<QueryResult>> {
        let Some(table) = table else {
            let Projection::Items(items) = projection else {
                return Err(Error::msg("SELECT * requires a FROM clause"));
            };
            let labels: RowNames = items.iter().map(|(_, label)| label.clone()).collect();
            let values = items
                .iter()
                .map(|(operand, _)| {
                    evaluate(operand, statement, &|c: &ColumnRef| {
                        Err(Error::msg(format!("Invalid column name '{}'", c.name)))
                    })
                })
                .collect::<Result<Row>>()?;
            return Ok(vec![RowLabeled::new(labels, values).into()]);
        };
        let table = self.table(table)?;
        let mut results = Vec::new();
        let labels: RowNames = match &projection {
            Projection::All => table.labels(),
            Projection::Items(items) => items.iter().map(|(_, label)| label.clone()).collect(),
        };
        for row in &table.rows {
            if !matches(predicate, statement, &table.columns, row)? {
                continue;
            }
            let values = match &projection {
                Projection::All => row.clone(),
                Projection::Items(items) => items
                    .iter()
                    .map(|(operand, _)| {
                        evaluate(operand, statement, &|c: &ColumnRef| {
                            lookup(&table.columns, row, c)
                        })
                    })
                    .collect::<Result<Row>>()?,
            };
            results.push(RowLabeled::new(labels.clone(), values).into());
        }
        Ok(results)
    }

    /// Append every staged row to `table`, columns matched by name. Identity columns
    /// are generated and NULLs take the column default.
    pub(crate) fn transfer(&mut self, table: &str, staging: &StagingTable) -> Result<RowsAffected> {
        let target = self.table_mut(table)?;
        let mapping = staging
            .columns
            .iter()
            .map(|c| target.column_index(c.name))
            .collect::<Result<Vec<_>>>()?;
        let mut rows = Vec::with_capacity(staging.len());
        for staged in &staging.rows {
            let mut row = target.blank_row();
            for (i, value) in mapping.iter().zip(staged.iter()) {
                let column = &target.columns[*i];
                if column.identity || (value.is_null() && column.default.is_some()) {
                    continue;
                }
                row[*i] = value.clone();
            }
            target.check_row(&row)?;
            rows.push(row);
        }
        let rows_affected = rows.len() as u64;
        target.rows.extend(rows);
        Ok(RowsAffected { rows_affected })
    }
}

fn assignments(table: &MemoryTable, set: &[(ColumnRef, Operand)]) -> Result<Vec<(usize, Operand)>> {
    set.iter()
        .map(|(column, operand)| {
            if let Some(qualifier) = &column.qualifier {
                if !qualifier.eq_ignore_ascii_case(&table.name) {
                    return Err(Error::msg(format!(
                        "The column `{qualifier}.{}` cannot be updated",
                        column.name
                    )));
                }
            }
            let i = table.column_index(&column.name)?;
            if table.columns[i].identity {
                return Err(Error::msg(format!(
                    "Cannot update identity column '{}'",
                    column.name
                )));
            }
            Ok((i, operand.clone()))
        })
        .collect()
}

fn lookup(columns: &[MemoryColumn], row: &Row, column: &ColumnRef) -> Result<Value> {
    columns
        .iter()
        .position(|c| c.name.eq_ignore_ascii_case(&column.name))
        .map(|i| row[i].clone())
        .ok_or_else(|| Error::msg(format!("Invalid column name '{}'", column.name)))
}

fn evaluate(
    operand: &Operand,
    statement: &Statement,
    column: &dyn Fn(&ColumnRef) -> Result<Value>,
) -> Result<Value> {
    match operand {
        Operand::Column(c) => column(c),
        Operand::Parameter(name) => statement
            .parameter(name)
            .cloned()
            .ok_or_else(|| Error::msg(format!("Must declare the scalar variable \"@{name}\""))),
        Operand::Literal(v) => Ok(v.clone()),
    }
}

fn matches(
    predicate: &Predicate,
    statement: &Statement,
    columns: &[MemoryColumn],
    row: &Row,
) -> Result<bool> {
    for (column, operand) in predicate {
        let left = lookup(columns, row, column)?;
        let right = evaluate(operand, statement, &|c: &ColumnRef| lookup(columns, row, c))?;
        if !same(&left, &right) {
            return Ok(false);
        }
    }
    Ok(true)
}
