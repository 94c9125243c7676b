use crate::{Log, SCENARIO};
use stow::{DataService, Driver, Parameter, SqlCommand, StowError};

pub async fn scalars<D: Driver>(service: &DataService<D>) {
    let _lock = SCENARIO.lock().await;

    // Setup
    service
        .query_rows("DELETE FROM Logs", [])
        .await
        .expect("Failed to clear the Logs table");
    for (message, json) in [("alpha", Some("{\"code\":1}")), ("bravo", None)] {
        let mut log = Log {
            application_id: 4,
            message: Some(message.into()),
            exception_as_json: json.map(Into::into),
            ..Default::default()
        };
        service
            .insert(&mut log, None)
            .await
            .expect("Failed to insert the log");
    }

    // Strings, NULL becomes empty
    let mut values = service
        .query::<String>(
            "SELECT ExceptionAsJson FROM Logs WHERE ApplicationId = @ApplicationId",
            [Parameter::new("ApplicationId", 4)],
        )
        .await
        .expect("Failed to query the strings");
    values.sort();
    assert_eq!(values, ["", "{\"code\":1}"]);

    // Optional scalars keep NULL
    let mut values = service
        .query::<Option<String>>(
            "SELECT ExceptionAsJson FROM Logs WHERE ApplicationId = 4",
            [],
        )
        .await
        .expect("Failed to query the optional strings");
    values.sort();
    assert_eq!(values, [None, Some("{\"code\":1}".to_string())]);

    // Records from raw SQL
    let mut logs = service
        .query::<Log>("SELECT * FROM Logs WHERE ApplicationId = 4", [])
        .await
        .expect("Failed to query the logs");
    logs.sort_by(|a, b| a.message.cmp(&b.message));
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].message.as_deref(), Some("alpha"));
    assert!(logs.iter().all(|v| v.log_id.is_some()));

    // Stored procedure
    let logs = service
        .query::<Log>(
            SqlCommand::procedure("LogsByApplication"),
            [Parameter::new("ApplicationId", 4)],
        )
        .await
        .expect("Failed to call LogsByApplication");
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|v| v.application_id == 4));

    // Document
    let document = service
        .query_document(
            "SELECT Message, ApplicationId FROM Logs WHERE ApplicationId = @ApplicationId",
            [Parameter::new("ApplicationId", 4)],
        )
        .await
        .expect("Failed to query the document");
    let rows = document.as_array().expect("The document must be an array");
    assert_eq!(rows.len(), 2);
    for row in rows {
        let keys = row
            .as_object()
            .expect("Every row must be an object")
            .keys()
            .collect::<Vec<_>>();
        assert_eq!(keys, ["Message", "ApplicationId"]);
        assert_eq!(row["ApplicationId"], 4);
    }

    // Blank statement
    let error = service
        .query::<String>("  ", [])
        .await
        .expect_err("A blank statement must fail");
    assert!(matches!(
        error.downcast_ref::<StowError>(),
        Some(StowError::EmptyStatement)
    ));
}
