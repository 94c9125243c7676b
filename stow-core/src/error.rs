use thiserror::Error;

/// Failures raised by Stow itself.
///
/// Every public function returns [`anyhow::Error`](crate::Error). Store failures keep
/// the driver error as the root cause and carry [`StowError::StoreExecutionFailure`]
/// as context, so both can be inspected:
///
/// ```rust,ignore
/// match error.downcast_ref::<StowError>() {
///     Some(StowError::MissingUpdatePredicate { .. }) => { /* caller bug */ }
///     Some(StowError::StoreExecutionFailure { .. }) => { /* see error.root_cause() */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StowError {
    #[error("SQL statement was empty")]
    EmptyStatement,

    #[error(
        "Cannot update `{type_name}`: no where clause was provided and the primary key is not set"
    )]
    MissingUpdatePredicate { type_name: &'static str },

    #[error("Cannot bulk update `{type_name}`: {}", missing_key_reason(.index))]
    MissingKeyForUpdate {
        type_name: &'static str,
        /// Position of the offending record, `None` when the type has no key at all.
        index: Option<usize>,
    },

    #[error("Cannot update `{type_name}`: there is no non key value to set")]
    EmptyUpdate { type_name: &'static str },

    #[error("Store failure during {operation}")]
    StoreExecutionFailure { operation: &'static str },
}

fn missing_key_reason(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!("record {i} has no primary key value, use insert instead"),
        None => "the type declares no primary key".into(),
    }
}
