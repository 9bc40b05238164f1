use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The five lifecycle actions an operation can perform.
///
/// Retry variants are distinct on the wire but share display wording with
/// their base action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Create,
    RetryCreate,
    Update,
    Delete,
    RetryDelete,
}

impl OperationType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::RetryCreate => "retry_create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::RetryDelete => "retry_delete",
        }
    }

    /// Past-tense verb for the progress caption (`3 / 5 Created`).
    #[must_use]
    pub const fn progress_verb(self) -> &'static str {
        match self {
            Self::Create | Self::RetryCreate => "Created",
            Self::Update => "Updated",
            Self::Delete | Self::RetryDelete => "Deleted",
        }
    }
}

/// Overall status of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Starting,
    Completed,
    Errored,
}

impl OperationStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Completed => "completed",
            Self::Errored => "errored",
        }
    }

    /// A terminal operation expects no further state events.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored)
    }
}

/// Metadata record for one operation, as returned by the operations API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub status: OperationStatus,
    /// RFC 3339 timestamp of the operation's last update. Kept opaque here;
    /// [`crate::describe::readable_date`] formats it for display.
    #[serde(default)]
    pub last_updated: String,
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {expected}: '{got}'")]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "retry_create" => Ok(Self::RetryCreate),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "retry_delete" => Ok(Self::RetryDelete),
            _ => Err(ParseEnumError {
                expected: "operation type",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for OperationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starting" => Ok(Self::Starting),
            "completed" => Ok(Self::Completed),
            "errored" => Ok(Self::Errored),
            _ => Err(ParseEnumError {
                expected: "operation status",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Operation, OperationStatus, OperationType};
    use std::str::FromStr;

    #[test]
    fn type_json_roundtrips() {
        assert_eq!(
            serde_json::to_string(&OperationType::RetryCreate).unwrap(),
            "\"retry_create\""
        );
        assert_eq!(
            serde_json::from_str::<OperationType>("\"retry_delete\"").unwrap(),
            OperationType::RetryDelete
        );
    }

    #[test]
    fn display_parse_roundtrips() {
        for value in [
            OperationType::Create,
            OperationType::RetryCreate,
            OperationType::Update,
            OperationType::Delete,
            OperationType::RetryDelete,
        ] {
            assert_eq!(OperationType::from_str(&value.to_string()).unwrap(), value);
        }
        for value in [
            OperationStatus::Starting,
            OperationStatus::Completed,
            OperationStatus::Errored,
        ] {
            assert_eq!(
                OperationStatus::from_str(&value.to_string()).unwrap(),
                value
            );
        }
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert!(OperationType::from_str("rollback").is_err());
        assert!(OperationStatus::from_str("pending").is_err());
    }

    #[test]
    fn progress_verbs() {
        assert_eq!(OperationType::Create.progress_verb(), "Created");
        assert_eq!(OperationType::RetryCreate.progress_verb(), "Created");
        assert_eq!(OperationType::Update.progress_verb(), "Updated");
        assert_eq!(OperationType::RetryDelete.progress_verb(), "Deleted");
    }

    #[test]
    fn terminal_statuses() {
        assert!(!OperationStatus::Starting.is_terminal());
        assert!(OperationStatus::Completed.is_terminal());
        assert!(OperationStatus::Errored.is_terminal());
    }

    #[test]
    fn operation_wire_field_names() {
        let op: Operation = serde_json::from_str(
            r#"{"id":"op-1","type":"create","status":"starting","last_updated":"2024-03-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(op.op_type, OperationType::Create);
        assert_eq!(op.status, OperationStatus::Starting);

        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["type"], "create");
    }
}
