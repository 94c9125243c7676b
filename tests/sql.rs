#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rust_decimal::Decimal;
    use stow::{GenericSqlWriter, Parameter, Record, SqlWriter, StagingTable, StowError, Value};
    use stow_tests::Log;
    use time::{PrimitiveDateTime, macros::datetime};

    const WRITER: GenericSqlWriter = GenericSqlWriter::new();

    #[derive(Record, Default, Debug, Clone)]
    struct Stamp {
        #[stow(primary_key)]
        id: Option<i64>,
        #[stow(default_key)]
        at: Option<PrimitiveDateTime>,
    }

    #[derive(Record, Default, Debug, Clone)]
    #[stow(table = "Notes")]
    struct Note {
        body: Option<String>,
        #[stow(default_key)]
        created: Option<PrimitiveDateTime>,
    }

    #[derive(Record, Default, Debug, Clone)]
    #[stow(table = "Tokens")]
    struct Token {
        #[stow(primary_key)]
        id: Option<i64>,
    }

    fn one_single_line(sql: &str) -> String {
        sql.trim().lines().map(str::trim).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn insert_log() {
        let log = Log {
            application_id: 3,
            message: Some("Test".into()),
            ..Default::default()
        };
        let insert = WRITER.build_insert(&log, Log::table_name());
        assert_eq!(
            insert.statement.sql,
            "INSERT INTO Logs (ApplicationId,Message,StackTrace,ExceptionAsJson,ExceptionMessage) OUTPUT INSERTED.LogId VALUES (@ApplicationId,@Message,@StackTrace,@ExceptionAsJson,@ExceptionMessage)"
        );
        assert_eq!(insert.primary_key, Some("LogId"));
        assert_eq!(
            insert.statement.parameters,
            [
                Parameter::new("ApplicationId", 3),
                Parameter::new("Message", "Test"),
                Parameter::new("StackTrace", Value::Varchar(None)),
                Parameter::new("ExceptionAsJson", Value::Varchar(None)),
                Parameter::new("ExceptionMessage", Value::Varchar(None)),
            ]
        );
        assert_eq!(insert.statement.timeout, None);
    }

    #[test]
    fn insert_present_default_key() {
        let log = Log {
            log_id: Some(99),
            application_id: 1,
            date: Some(datetime!(2024-05-06 7:08:09)),
            ..Default::default()
        };
        let insert = WRITER.build_insert(&log, "Archive");
        assert_eq!(
            insert.statement.sql,
            "INSERT INTO Archive (ApplicationId,Date,Message,StackTrace,ExceptionAsJson,ExceptionMessage) OUTPUT INSERTED.LogId VALUES (@ApplicationId,@Date,@Message,@StackTrace,@ExceptionAsJson,@ExceptionMessage)"
        );
        assert!(insert.statement.parameter("LogId").is_none());
        assert_eq!(
            insert.statement.parameter("date"),
            Some(&Value::Timestamp(Some(datetime!(2024-05-06 7:08:09))))
        );
    }

    #[test]
    fn insert_without_key() {
        let note = Note {
            body: Some("remember".into()),
            created: None,
        };
        let insert = WRITER.build_insert(&note, Note::table_name());
        assert_eq!(insert.statement.sql, "INSERT INTO Notes (body) VALUES (@body)");
        assert_eq!(insert.primary_key, None);
    }

    #[test]
    fn insert_default_values() {
        let insert = WRITER.build_insert(&Stamp::default(), Stamp::table_name());
        assert_eq!(
            insert.statement.sql,
            "INSERT INTO Stamps OUTPUT INSERTED.id DEFAULT VALUES"
        );
        assert!(insert.statement.parameters.is_empty());
        assert_eq!(insert.primary_key, Some("id"));
    }

    #[test]
    fn update_by_key() {
        let log = Log {
            log_id: Some(5),
            application_id: 3,
            message: Some("Updated".into()),
            ..Default::default()
        };
        let statement = WRITER
            .build_update(&log, Log::table_name(), None)
            .expect("Failed to build the update");
        assert_eq!(
            statement.sql,
            "UPDATE Logs SET ApplicationId = @ApplicationId, Message = @Message WHERE LogId = @LogId"
        );
        assert_eq!(
            statement.parameters,
            [
                Parameter::new("ApplicationId", 3),
                Parameter::new("Message", "Updated"),
                Parameter::new("LogId", 5),
            ]
        );
    }

    #[test]
    fn update_with_where_clause() {
        let log = Log {
            log_id: Some(5),
            application_id: 3,
            exception_message: Some("boom".into()),
            ..Default::default()
        };
        let statement = WRITER
            .build_update(&log, "Logs", Some("  WHERE ApplicationId = 3 "))
            .expect("Failed to build the update");
        assert_eq!(
            statement.sql,
            "UPDATE Logs SET ApplicationId = @ApplicationId, ExceptionMessage = @ExceptionMessage WHERE ApplicationId = 3"
        );
        assert!(statement.parameter("LogId").is_none());
    }

    #[test]
    fn update_errors() {
        let log = Log {
            application_id: 3,
            ..Default::default()
        };
        let error = WRITER
            .build_update(&log, "Logs", Some("   "))
            .expect_err("A blank where clause and no key must fail");
        assert_eq!(
            error.downcast_ref::<StowError>(),
            Some(&StowError::MissingUpdatePredicate { type_name: "Log" })
        );
        let note = Note::default();
        let error = WRITER
            .build_update(&note, "Notes", Some("WHERE body IS NULL"))
            .expect_err("An update without fields must fail");
        assert_eq!(
            error.downcast_ref::<StowError>(),
            Some(&StowError::EmptyUpdate { type_name: "Note" })
        );
    }

    #[test]
    fn select() {
        assert_eq!(
            WRITER.build_select("Logs", Some("WHERE LogId = 1")).sql,
            "SELECT * FROM Logs WHERE LogId = 1"
        );
        assert_eq!(WRITER.build_select(" Logs ", Some("  ")).sql, "SELECT * FROM Logs");
        assert_eq!(WRITER.build_select("Logs", None).sql, "SELECT * FROM Logs");
    }

    #[test]
    fn column_types() {
        let cases = [
            (Value::Boolean(None), "BIT"),
            (Value::Int8(None), "SMALLINT"),
            (Value::Int32(None), "INT"),
            (Value::Int64(None), "BIGINT"),
            (Value::UInt8(None), "TINYINT"),
            (Value::UInt64(None), "DECIMAL(20,0)"),
            (Value::Float32(None), "REAL"),
            (Value::Float64(None), "FLOAT"),
            (Value::Decimal(None, 0, 0), "DECIMAL(38,10)"),
            (Value::Decimal(Some(Decimal::ONE), 12, 4), "DECIMAL(12,4)"),
            (Value::Char(None), "NCHAR(1)"),
            (Value::Varchar(None), "NVARCHAR(MAX)"),
            (Value::Blob(None), "VARBINARY(MAX)"),
            (Value::Timestamp(None), "DATETIME2"),
            (Value::TimestampWithTimezone(None), "DATETIMEOFFSET"),
            (Value::Uuid(None), "UNIQUEIDENTIFIER"),
            (Value::Null, "SQL_VARIANT"),
        ];
        for (value, expected) in cases {
            let mut out = String::new();
            WRITER.write_column_type(&mut out, &value);
            assert_eq!(out, expected, "Column type of {value:?}");
        }
    }

    #[test]
    fn bulk_update_statements() {
        let logs = [Log {
            log_id: Some(1),
            application_id: 2,
            ..Default::default()
        }];
        let staging = StagingTable::for_update(&logs).expect("Failed to stage the logs");
        let temporary = WRITER.temporary_table_name("Logs");
        assert_eq!(temporary, "#StowLogs");
        assert_eq!(WRITER.temporary_table_name("dbo.[Logs]"), "#StowdboLogs");

        let mut out = String::new();
        WRITER.write_create_temporary_table(&mut out, &temporary, &staging.columns);
        assert_eq!(
            out,
            one_single_line(indoc! {"
                CREATE TABLE #StowLogs (LogId INT NOT NULL,
                ApplicationId INT,
                Date DATETIME2,
                Message NVARCHAR(MAX),
                StackTrace NVARCHAR(MAX),
                ExceptionAsJson NVARCHAR(MAX),
                ExceptionMessage NVARCHAR(MAX))
            "})
        );

        let mut out = String::new();
        WRITER.write_merge_update(&mut out, "Logs", &temporary, &staging.columns, "LogId");
        assert_eq!(
            out,
            one_single_line(indoc! {"
                UPDATE Logs SET Logs.ApplicationId = #StowLogs.ApplicationId,
                Logs.Date = #StowLogs.Date,
                Logs.Message = #StowLogs.Message,
                Logs.StackTrace = #StowLogs.StackTrace,
                Logs.ExceptionAsJson = #StowLogs.ExceptionAsJson,
                Logs.ExceptionMessage = #StowLogs.ExceptionMessage
                FROM Logs INNER JOIN #StowLogs ON Logs.LogId = #StowLogs.LogId; DROP TABLE #StowLogs;
            "})
        );
    }

    #[test]
    fn staging() {
        let logs = [
            Log {
                log_id: Some(10),
                application_id: 1,
                message: Some("a".into()),
                ..Default::default()
            },
            Log {
                application_id: 2,
                ..Default::default()
            },
        ];
        let staging = StagingTable::for_insert(&logs);
        assert_eq!(staging.len(), 2);
        assert_eq!(staging.columns.len(), 7);
        assert_eq!(staging.rows[0][0], Value::Int32(None));
        assert_eq!(staging.rows[0][3], Value::Varchar(Some("a".into())));
        assert_eq!(staging.rows[1][1], Value::Int32(Some(2)));
        assert_eq!(staging.key_column().map(|c| c.name), Some("LogId"));

        let error = StagingTable::for_update(&logs).expect_err("The second log has no key");
        assert_eq!(
            error.downcast_ref::<StowError>(),
            Some(&StowError::MissingKeyForUpdate {
                type_name: "Log",
                index: Some(1)
            })
        );
        let error = StagingTable::for_update(&[Note::default()]).expect_err("Notes have no key");
        assert_eq!(
            error.downcast_ref::<StowError>(),
            Some(&StowError::MissingKeyForUpdate {
                type_name: "Note",
                index: None
            })
        );
        let error = StagingTable::for_update(&[Token { id: Some(1) }])
            .expect_err("Tokens have nothing to set");
        assert_eq!(
            error.downcast_ref::<StowError>(),
            Some(&StowError::EmptyUpdate { type_name: "Token" })
        );
    }
}
