#[cfg(not(feature = "disable-bulk"))]
mod bulk;
mod logs;
mod memory;
mod scalars;

#[cfg(not(feature = "disable-bulk"))]
use crate::bulk::bulk;
use crate::scalars::scalars;
pub use crate::{logs::*, memory::*};
use log::LevelFilter;
use std::{env, sync::LazyLock};
use stow::{DataService, Driver};
use time::macros::datetime;
use tokio::sync::Mutex;

/// Scenarios share the Logs table.
static SCENARIO: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Create the tables and procedures the scenarios expect in a memory store.
pub async fn create_memory_tables(driver: &MemoryDriver) {
    driver
        .create_table(
            MemoryTable::for_record::<Log>(None).with_default("Date", datetime!(2024-01-01 0:00)),
        )
        .await;
    driver
        .create_procedure(
            "LogsByApplication",
            "SELECT * FROM Logs WHERE ApplicationId = @ApplicationId",
        )
        .await;
}

pub async fn execute_tests<D: Driver>(service: &DataService<D>) {
    logs(service).await;
    scalars(service).await;
    #[cfg(not(feature = "disable-bulk"))]
    bulk(service).await;
}
