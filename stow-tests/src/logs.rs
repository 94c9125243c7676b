use crate::SCENARIO;
use stow::{DataService, Driver, Record, StowError};
use time::PrimitiveDateTime;

#[derive(Record, Default, Debug, Clone, PartialEq)]
#[stow(rename_all = "PascalCase")]
pub struct Log {
    #[stow(primary_key)]
    pub log_id: Option<i32>,
    pub application_id: i32,
    #[stow(default_key)]
    pub date: Option<PrimitiveDateTime>,
    pub message: Option<String>,
    pub stack_trace: Option<String>,
    pub exception_as_json: Option<String>,
    pub exception_message: Option<String>,
}

pub async fn logs<D: Driver>(service: &DataService<D>) {
    let _lock = SCENARIO.lock().await;

    // Setup
    service
        .query_rows("DELETE FROM Logs", [])
        .await
        .expect("Failed to clear the Logs table");

    // Insert
    let mut log = Log {
        application_id: 3,
        message: Some("Test".into()),
        ..Default::default()
    };
    assert!(
        service
            .insert(&mut log, None)
            .await
            .expect("Failed to insert the log")
    );
    let log_id = log.log_id.expect("The generated identity was not written back");

    // Update by key
    log.stack_trace = Some("at scenario::logs".into());
    log.exception_message = Some("First failure".into());
    assert!(
        service
            .update(&log, None, None)
            .await
            .expect("Failed to update the log")
    );

    // Partial update, absent fields keep their value
    let mut partial = Log {
        log_id: Some(log_id),
        application_id: 3,
        message: Some("Second".into()),
        ..Default::default()
    };
    assert!(
        service
            .update(&partial, None, None)
            .await
            .expect("Failed to update the log again")
    );
    let stored = service
        .query_table::<Log>(Some(&format!("WHERE LogId = {log_id}")), None)
        .await
        .expect("Failed to read the log back");
    assert_eq!(stored.len(), 1);
    let stored = &stored[0];
    assert_eq!(stored.log_id, Some(log_id));
    assert_eq!(stored.message.as_deref(), Some("Second"));
    assert_eq!(stored.stack_trace.as_deref(), Some("at scenario::logs"));
    assert_eq!(stored.exception_message.as_deref(), Some("First failure"));
    assert_eq!(stored.exception_as_json, None);
    #[cfg(not(feature = "disable-default-values"))]
    assert!(stored.date.is_some(), "The store default was not applied");

    // Explicit where clause wins over the key
    partial.log_id = None;
    partial.message = Some("Third".into());
    assert!(
        service
            .update(&partial, Some(&format!("WHERE LogId = {log_id}")), Some("Logs"))
            .await
            .expect("Failed to update the log with a where clause")
    );
    let stored = service
        .query_table::<Log>(Some("WHERE ApplicationId = 3"), Some("Logs"))
        .await
        .expect("Failed to read the logs");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].message.as_deref(), Some("Third"));

    // No predicate at all
    let error = service
        .update(&partial, None, None)
        .await
        .expect_err("An update without predicate must fail");
    assert!(matches!(
        error.downcast_ref::<StowError>(),
        Some(StowError::MissingUpdatePredicate { type_name: "Log" })
    ));

    // Nothing matches
    let missing = Log {
        log_id: Some(log_id + 1000),
        application_id: 3,
        ..Default::default()
    };
    assert!(
        !service
            .update(&missing, None, None)
            .await
            .expect("Failed to run an update matching nothing")
    );
    assert_eq!(Log::table_name(), "Logs");
}
