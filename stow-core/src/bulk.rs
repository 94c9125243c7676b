use crate::{
    Connection, Driver, Error, Result, RowsAffected, SqlWriter, StagingTable, Statement,
};
use std::time::Duration;

/// Transfer a staged batch straight into `table`.
pub async fn insert<C: Connection>(
    connection: &mut C,
    table: &str,
    staging: &StagingTable,
    timeout: Duration,
) -> Result<RowsAffected> {
    log::debug!(
        "Bulk inserting {} rows into {} ({})",
        staging.len(),
        table,
        <C::Driver as Driver>::NAME
    );
    connection.bulk_transfer(table, staging, timeout).await
}

/// Two phase update: stage the batch in a temporary table, then merge it into
/// `table` joining on the primary key.
///
/// `timeout` applies to the table creation, `bulk_timeout` to the transfer and the
/// merge. Once the temporary table exists any failure issues a best effort drop
/// before the error is returned.
pub async fn update<C: Connection>(
    connection: &mut C,
    table: &str,
    staging: &StagingTable,
    timeout: Duration,
    bulk_timeout: Duration,
) -> Result<RowsAffected> {
    let Some(key) = staging.key_column() else {
        return Err(Error::msg(format!(
            "Cannot merge into {table}: the staging table has no primary key column"
        )));
    };
    if staging.columns.iter().all(|c| c.name == key.name) {
        return Err(Error::msg(format!(
            "Cannot merge into {table}: the staging table has no column to set"
        )));
    }
    let writer = connection.driver().sql_writer();
    let temporary = writer.temporary_table_name(table);

    let mut create = Statement::default().with_timeout(timeout);
    writer.write_create_temporary_table(&mut create.sql, &temporary, &staging.columns);
    log::debug!("{create}");
    connection.execute(create).await?;

    let result = async {
        log::debug!(
            "Bulk transferring {} rows into {} ({})",
            staging.len(),
            temporary,
            <C::Driver as Driver>::NAME
        );
        connection
            .bulk_transfer(&temporary, staging, bulk_timeout)
            .await?;
        let mut merge = Statement::default().with_timeout(bulk_timeout);
        writer.write_merge_update(&mut merge.sql, table, &temporary, &staging.columns, key.name);
        log::debug!("{merge}");
        connection.execute(merge).await
    }
    .await;

    if result.is_err() {
        let mut drop = Statement::default().with_timeout(timeout);
        writer.write_drop_table(&mut drop.sql, &temporary);
        if let Err(e) = connection.execute(drop).await {
            log::warn!("Could not drop the temporary table {temporary}: {e:#}");
        }
    }
    result
}
