use crate::{Log, SCENARIO};
use stow::{DataService, Driver, StowError};

pub async fn bulk<D: Driver>(service: &DataService<D>) {
    let _lock = SCENARIO.lock().await;

    // Setup
    service
        .query_rows("DELETE FROM Logs", [])
        .await
        .expect("Failed to clear the Logs table");

    // Empty batches do nothing
    assert!(
        !service
            .bulk_insert::<Log>(&[], None)
            .await
            .expect("An empty bulk insert must succeed")
    );
    assert!(
        !service
            .bulk_update::<Log>(&[], None)
            .await
            .expect("An empty bulk update must succeed")
    );

    // Insert
    let logs = (0..25)
        .map(|i| Log {
            application_id: 7,
            message: Some(format!("Bulk message {i}")),
            stack_trace: (i % 2 == 0).then(|| format!("frame {i}")),
            ..Default::default()
        })
        .collect::<Vec<_>>();
    assert!(
        service
            .bulk_insert(&logs, None)
            .await
            .expect("Failed to bulk insert the logs")
    );
    let mut stored = service
        .query_table::<Log>(Some("WHERE ApplicationId = 7"), None)
        .await
        .expect("Failed to read the inserted logs");
    assert_eq!(stored.len(), logs.len());
    assert!(stored.iter().all(|v| v.log_id.is_some()));
    stored.sort_by_key(|v| v.log_id);
    let mut messages = stored
        .iter()
        .filter_map(|v| v.message.clone())
        .collect::<Vec<_>>();
    messages.sort();
    let mut expected = logs
        .iter()
        .filter_map(|v| v.message.clone())
        .collect::<Vec<_>>();
    expected.sort();
    assert_eq!(messages, expected);

    // Update
    for log in &mut stored {
        log.exception_message = Some(format!("Reviewed {}", log.log_id.unwrap_or_default()));
    }
    assert!(
        service
            .bulk_update(&stored, None)
            .await
            .expect("Failed to bulk update the logs")
    );
    let updated = service
        .query_table::<Log>(Some("WHERE ApplicationId = 7"), None)
        .await
        .expect("Failed to read the updated logs");
    assert_eq!(updated.len(), stored.len());
    for log in &updated {
        assert_eq!(
            log.exception_message,
            Some(format!("Reviewed {}", log.log_id.unwrap_or_default()))
        );
        let before = stored
            .iter()
            .find(|v| v.log_id == log.log_id)
            .expect("Updated log without counterpart");
        assert_eq!(log.message, before.message);
        assert_eq!(log.stack_trace, before.stack_trace);
    }

    // Records without key are rejected
    let error = service
        .bulk_update(&logs, None)
        .await
        .expect_err("A bulk update of records without key must fail");
    assert!(matches!(
        error.downcast_ref::<StowError>(),
        Some(StowError::MissingKeyForUpdate {
            type_name: "Log",
            index: Some(0)
        })
    ));
}
