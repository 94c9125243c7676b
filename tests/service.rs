#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };
    use stow::{
        CommandKind, Config, Connection, DataService, Driver, Error, KeyRole, Logger, Parameter,
        Record, SqlCommand, StagingColumn, StagingTable, Statement, StowError, Value, bulk,
        stream::TryStreamExt,
    };
    use stow_tests::{Log, MemoryDriver, create_memory_tables, execute_tests, init_logs};

    async fn service() -> DataService<MemoryDriver> {
        init_logs();
        let driver = MemoryDriver::new();
        create_memory_tables(&driver).await;
        DataService::new(driver, Config::new("memory://stow"))
    }

    #[derive(Record, Default, Debug, Clone)]
    #[stow(table = "Tokens")]
    struct Token {
        #[stow(primary_key)]
        id: Option<i64>,
    }

    #[derive(Default)]
    struct CountingLogger {
        entries: AtomicUsize,
        messages: Mutex<Vec<String>>,
    }

    impl Logger for CountingLogger {
        fn log(&self, message: &str, error: Option<&Error>) -> bool {
            assert!(message.contains("memory"));
            assert!(error.is_some());
            self.entries.fetch_add(1, Ordering::SeqCst);
            self.messages.lock().unwrap().push(message.into());
            true
        }
    }

    #[tokio::test]
    async fn memory() {
        let service = service().await;
        execute_tests(&service).await;
        let driver = service.driver();
        assert_eq!(driver.connections_open().await, 0);
        assert_eq!(driver.leaked_temporary_tables().await, 0);
    }

    #[tokio::test]
    async fn insert_statement() {
        let service = service().await;
        let mut log = Log {
            application_id: 3,
            message: Some("Test".into()),
            ..Default::default()
        };
        assert!(service.insert(&mut log, None).await.unwrap());
        assert_eq!(log.log_id, Some(1));
        let history = service.driver().history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(
            history[0].sql,
            "INSERT INTO Logs (ApplicationId,Message,StackTrace,ExceptionAsJson,ExceptionMessage) OUTPUT INSERTED.LogId VALUES (@ApplicationId,@Message,@StackTrace,@ExceptionAsJson,@ExceptionMessage)"
        );
        assert_eq!(history[0].parameter("Message"), Some(&Value::Varchar(Some("Test".into()))));
        assert_eq!(history[0].timeout, Some(Duration::from_secs(30)));

        let mut second = log.clone();
        second.log_id = None;
        assert!(service.insert(&mut second, None).await.unwrap());
        assert_eq!(second.log_id, Some(2));
        let rows = service.driver().rows("Logs").await;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| !r.get_column("Date").unwrap().is_null()));
    }

    #[tokio::test]
    async fn update_without_predicate() {
        let service = service().await;
        let log = Log {
            application_id: 3,
            message: Some("orphan".into()),
            ..Default::default()
        };
        let error = service.update(&log, None, None).await.unwrap_err();
        assert_eq!(
            error.downcast_ref::<StowError>(),
            Some(&StowError::MissingUpdatePredicate { type_name: "Log" })
        );
        assert!(service.driver().history().await.is_empty());
        assert_eq!(service.driver().connections_opened().await, 0);
    }

    #[tokio::test]
    async fn bulk_update_without_keys() {
        let service = service().await;
        let logs = [Log::default(), Log::default()];
        let error = service.bulk_update(&logs, None).await.unwrap_err();
        assert_eq!(
            error.downcast_ref::<StowError>(),
            Some(&StowError::MissingKeyForUpdate {
                type_name: "Log",
                index: Some(0)
            })
        );
        assert_eq!(service.driver().connections_opened().await, 0);
        assert!(service.driver().transfers().await.is_empty());
    }

    #[tokio::test]
    async fn bulk_update_key_only() {
        let service = service().await;
        let error = service
            .bulk_update(&[Token { id: Some(1) }, Token { id: Some(2) }], None)
            .await
            .unwrap_err();
        assert_eq!(
            error.downcast_ref::<StowError>(),
            Some(&StowError::EmptyUpdate { type_name: "Token" })
        );
        assert!(service.driver().history().await.is_empty());
        assert!(service.driver().transfers().await.is_empty());
        assert_eq!(service.driver().connections_opened().await, 0);

        let staging = StagingTable {
            columns: [StagingColumn {
                name: "id",
                value: Value::Int64(None),
                nullable: false,
                role: KeyRole::PrimaryKey,
            }]
            .into(),
            rows: vec![[Value::Int64(Some(1))].into()],
        };
        let mut connection = service.driver().connect(service.config()).await.unwrap();
        let result = bulk::update(
            &mut connection,
            "Tokens",
            &staging,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .await;
        connection.close().await.unwrap();
        assert!(format!("{:#}", result.unwrap_err()).contains("no column to set"));
        assert!(service.driver().history().await.is_empty());
    }

    #[tokio::test]
    async fn empty_batches() {
        let service = service().await;
        assert!(!service.bulk_insert::<Log>(&[], None).await.unwrap());
        assert!(!service.bulk_update::<Log>(&[], None).await.unwrap());
        assert_eq!(service.driver().connections_opened().await, 0);
    }

    #[tokio::test]
    async fn bulk_timeouts() {
        let service = DataService::new(
            MemoryDriver::new(),
            Config::new("memory://stow").with_command_timeout(Duration::from_secs(10)),
        );
        create_memory_tables(service.driver()).await;
        let logs = (1..=3)
            .map(|i| Log {
                application_id: i,
                ..Default::default()
            })
            .collect::<Vec<_>>();
        assert!(service.bulk_insert(&logs, None).await.unwrap());
        let mut stored = service.query_table::<Log>(None, None).await.unwrap();
        assert_eq!(stored.len(), 3);
        for log in &mut stored {
            log.message = Some("merged".into());
        }
        service.driver().clear_history().await;
        assert!(service.bulk_update(&stored, None).await.unwrap());

        let transfers = service.driver().transfers().await;
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].table, "#StowLogs");
        assert_eq!(transfers[0].rows, 3);
        assert_eq!(transfers[0].timeout, Duration::from_secs(30));
        let history = service.driver().history().await;
        assert_eq!(history.len(), 2);
        assert!(history[0].sql.starts_with("CREATE TABLE #StowLogs"));
        assert_eq!(history[0].timeout, Some(Duration::from_secs(10)));
        assert!(history[1].sql.starts_with("UPDATE Logs SET"));
        assert_eq!(history[1].timeout, Some(Duration::from_secs(30)));
        let messages = service
            .query::<String>("SELECT Message FROM Logs", [])
            .await
            .unwrap();
        assert_eq!(messages, ["merged", "merged", "merged"]);
    }

    #[tokio::test]
    async fn failed_merge_drops_temporary_table() {
        let service = service().await;
        let mut log = Log {
            application_id: 9,
            ..Default::default()
        };
        service.insert(&mut log, None).await.unwrap();
        service.driver().fail_on("INNER JOIN").await;
        log.message = Some("never".into());
        let error = service.bulk_update(&[log], None).await.unwrap_err();
        assert_eq!(
            error.downcast_ref::<StowError>(),
            Some(&StowError::StoreExecutionFailure {
                operation: "bulk update"
            })
        );
        assert!(format!("{:#}", error.root_cause()).contains("INNER JOIN"));
        let history = service.driver().history().await;
        let last = history.last().unwrap();
        assert_eq!(last.sql, "DROP TABLE #StowLogs;");
        assert_eq!(service.driver().leaked_temporary_tables().await, 0);
        assert_eq!(service.driver().connections_open().await, 0);
        service.driver().clear_failures().await;
        let stored = service.query_table::<Log>(None, None).await.unwrap();
        assert_eq!(stored[0].message, None);
    }

    #[tokio::test]
    async fn failed_transfer_drops_temporary_table() {
        let service = service().await;
        let mut log = Log {
            application_id: 9,
            ..Default::default()
        };
        service.insert(&mut log, None).await.unwrap();
        service.driver().fail_transfer(true).await;
        assert!(service.bulk_update(&[log.clone()], None).await.is_err());
        assert_eq!(
            service.driver().history().await.last().map(|v| v.sql.clone()),
            Some("DROP TABLE #StowLogs;".into())
        );
        assert!(service.bulk_insert(&[log], None).await.is_err());
        assert_eq!(service.driver().leaked_temporary_tables().await, 0);
        assert_eq!(service.driver().rows("Logs").await.len(), 1);
    }

    #[tokio::test]
    async fn failures_are_reported_once() {
        let logger = Arc::new(CountingLogger::default());
        let service = service().await.with_logger(logger.clone());
        service.driver().fail_connect(true).await;
        let error = service
            .query_rows("SELECT * FROM Logs", [])
            .await
            .unwrap_err();
        assert_eq!(
            error.downcast_ref::<StowError>(),
            Some(&StowError::StoreExecutionFailure { operation: "query" })
        );
        assert_eq!(logger.entries.load(Ordering::SeqCst), 1);
        assert_eq!(service.driver().connections_open().await, 0);

        service.driver().fail_connect(false).await;
        let error = service
            .query::<String>("", [Parameter::new("Unused", 1)])
            .await
            .unwrap_err();
        assert_eq!(error.downcast_ref::<StowError>(), Some(&StowError::EmptyStatement));
        assert_eq!(logger.entries.load(Ordering::SeqCst), 2);

        assert!(service.query_rows("SELECT * FROM Missing", []).await.is_err());
        assert_eq!(logger.entries.load(Ordering::SeqCst), 3);
        assert_eq!(service.driver().connections_open().await, 0);
    }

    #[tokio::test]
    async fn parameters_are_bound() {
        let service = service().await;
        let mut log = Log {
            application_id: 5,
            message: Some("x'); DROP TABLE Logs; --".into()),
            ..Default::default()
        };
        service.insert(&mut log, None).await.unwrap();
        let found = service
            .query::<Log>(
                "SELECT * FROM Logs WHERE Message = @Message",
                [Parameter::new("Message", "x'); DROP TABLE Logs; --")],
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].log_id, log.log_id);
        assert_eq!(found[0].message, log.message);
        assert!(
            service
                .driver()
                .history()
                .await
                .iter()
                .all(|s| !s.sql.contains("DROP TABLE"))
        );
    }

    #[tokio::test]
    async fn bulk_failures_describe_the_batch() {
        let logger = Arc::new(CountingLogger::default());
        let service = service().await.with_logger(logger.clone());
        let logs = (1..=2)
            .map(|i| Log {
                application_id: i,
                ..Default::default()
            })
            .collect::<Vec<_>>();
        assert!(service.bulk_insert(&logs, None).await.unwrap());
        let stored = service.query_table::<Log>(None, None).await.unwrap();

        service.driver().fail_on("INNER JOIN").await;
        assert!(service.bulk_update(&stored, None).await.is_err());
        service.driver().clear_failures().await;
        service.driver().fail_transfer(true).await;
        assert!(service.bulk_insert(&logs[..1], None).await.is_err());

        let messages = logger.messages.lock().unwrap().clone();
        assert_eq!(
            messages,
            [
                "Stow bulk update on memory failed for 2 rows (LogId,ApplicationId,Date,Message,StackTrace,ExceptionAsJson,ExceptionMessage) keys 1,2",
                "Stow bulk insert on memory failed for 1 rows (LogId,ApplicationId,Date,Message,StackTrace,ExceptionAsJson,ExceptionMessage)",
            ]
        );
    }

    #[tokio::test]
    async fn stored_procedure() {
        let service = service().await;
        let mut log = Log {
            application_id: 7,
            message: Some("from a procedure".into()),
            ..Default::default()
        };
        service.insert(&mut log, None).await.unwrap();
        service.driver().clear_history().await;

        let found = service
            .query::<Log>(
                SqlCommand::procedure("LogsByApplication"),
                [Parameter::new("ApplicationId", 7)],
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, log.message);
        let history = service.driver().history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sql, "LogsByApplication");
        assert_eq!(history[0].kind, CommandKind::StoredProcedure);
        assert_eq!(history[0].to_string(), "EXEC LogsByApplication");

        let document = service
            .query_document(
                SqlCommand::procedure("LogsByApplication"),
                [Parameter::new("ApplicationId", 8)],
            )
            .await
            .unwrap();
        assert_eq!(document.as_array().map(Vec::len), Some(0));

        let error = service
            .query_rows(SqlCommand::procedure("MissingProcedure"), [])
            .await
            .unwrap_err();
        assert_eq!(
            error.downcast_ref::<StowError>(),
            Some(&StowError::StoreExecutionFailure { operation: "query" })
        );
        assert!(format!("{:#}", error.root_cause()).contains("MissingProcedure"));
        let error = service
            .query_rows(SqlCommand::procedure(" "), [])
            .await
            .unwrap_err();
        assert_eq!(error.downcast_ref::<StowError>(), Some(&StowError::EmptyStatement));
        assert_eq!(
            service.driver().history().await.last().map(|v| v.kind),
            Some(CommandKind::StoredProcedure)
        );
        assert_eq!(service.driver().connections_open().await, 0);
    }

    #[tokio::test]
    async fn reopen_connection() {
        let driver = MemoryDriver::new();
        create_memory_tables(&driver).await;
        let config = Config::new("memory://stow");
        let mut connection = driver.connect(&config).await.unwrap();
        assert_eq!(driver.connections_opened().await, 1);
        connection.open().await.unwrap();
        assert_eq!(driver.connections_opened().await, 1);
        assert_eq!(driver.connections_open().await, 1);
        let rows = connection
            .fetch(Statement::new("SELECT * FROM Logs"))
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert!(rows.is_empty());
        connection.close().await.unwrap();
        assert_eq!(driver.connections_open().await, 0);

        driver.fail_connect(true).await;
        assert!(driver.connect(&config).await.is_err());
        assert_eq!(driver.connections_opened().await, 1);
        assert_eq!(driver.connections_open().await, 0);
    }
}
