use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of one provisioned resource.
///
/// The provisioner emits a small set of well-known phases, but individual
/// operation kinds may report additional values; those round-trip losslessly
/// through [`ResourceStatus::Other`] instead of failing to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceStatus {
    PlannedCreate,
    Creating,
    Created,
    Errored,
    Deleted,
    /// Operation-specific phase not in the well-known set.
    Other(String),
}

impl ResourceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::PlannedCreate => "planned_create",
            Self::Creating => "creating",
            Self::Created => "created",
            Self::Errored => "errored",
            Self::Deleted => "deleted",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Whether this phase removes the resource from the snapshot.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl From<&str> for ResourceStatus {
    fn from(s: &str) -> Self {
        match s {
            "planned_create" => Self::PlannedCreate,
            "creating" => Self::Creating,
            "created" => Self::Created,
            "errored" => Self::Errored,
            "deleted" => Self::Deleted,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ResourceStatus {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ResourceStatus> for String {
    fn from(status: ResourceStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one provisioned resource within an operation's snapshot.
///
/// `error` is present only when the resource's last observed transition
/// failed; a later event without an error clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Opaque identifier, unique within the snapshot. Also the map key.
    pub id: String,
    /// Current lifecycle phase.
    pub status: ResourceStatus,
    /// Human-readable failure message from the last transition, if any.
    #[serde(default)]
    pub error: Option<String>,
}

impl ResourceState {
    pub fn new(id: impl Into<String>, status: ResourceStatus, error: Option<String>) -> Self {
        Self {
            id: id.into(),
            status,
            error,
        }
    }
}
