//! Human-readable operation descriptions.

use chrono::{DateTime, Local};

use crate::model::operation::{OperationStatus, OperationType};

/// Format an RFC 3339 timestamp for display in local time.
///
/// Falls back to the raw input when it does not parse, so opaque or empty
/// timestamps degrade gracefully instead of erroring.
#[must_use]
pub fn readable_date(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp).map_or_else(
        |_| timestamp.to_string(),
        |ts| {
            ts.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        },
    )
}

/// One sentence describing an operation's progress.
///
/// `create`/`retry_create` and `delete`/`retry_delete` share wording. Pairs
/// outside the table return `None` — a contract gap callers must surface,
/// not paper over with a default string.
#[must_use]
pub fn describe_operation(
    op_type: OperationType,
    status: OperationStatus,
    last_updated: &str,
) -> Option<String> {
    let (noun, gerund) = match op_type {
        OperationType::Create | OperationType::RetryCreate => ("creation", "creating"),
        OperationType::Update => ("update", "updating"),
        OperationType::Delete | OperationType::RetryDelete => ("deletion", "deleting"),
    };

    match status {
        OperationStatus::Starting => Some(format!(
            "infrastructure {noun} in progress, started at {}",
            readable_date(last_updated)
        )),
        OperationStatus::Completed => Some(format!(
            "infrastructure {noun} completed at {}",
            readable_date(last_updated)
        )),
        OperationStatus::Errored => Some(format!(
            "this infrastructure encountered an error while {gerund}."
        )),
    }
}
