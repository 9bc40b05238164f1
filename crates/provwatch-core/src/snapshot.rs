//! The resource-state snapshot for one operation.
//!
//! A [`StateSnapshot`] is the aggregate the reconciler owns: the full set of
//! per-resource states for one infrastructure operation at a point in time.
//! It is created from the initial state fetch (or synthesized as a
//! placeholder when that fetch fails), folded forward by
//! [`crate::reconcile::apply_event`], and discarded when the watch ends or
//! the operation identity changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::resource::ResourceState;

/// Full set of resource states for one operation.
///
/// Reconciliation replaces the snapshot wholesale rather than mutating it in
/// place, so consumers can detect change by comparing values. Only the full
/// fetch sets `last_updated`; incremental events never touch it, nor
/// `operation_id`, nor the snapshot-level `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// RFC 3339 timestamp of the last successful full fetch. Empty for
    /// placeholder snapshots.
    #[serde(default)]
    pub last_updated: String,

    /// The operation this snapshot belongs to. Immutable for the snapshot's
    /// lifetime.
    pub operation_id: String,

    /// Overall operation status as of snapshot creation.
    pub status: String,

    /// Per-resource state, keyed by resource id. Every key maps to a present
    /// entry; deletion removes the key rather than leaving a tombstone.
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceState>,
}

impl StateSnapshot {
    /// Placeholder synthesized when the initial state fetch fails, so a
    /// watch can proceed instead of staying stuck loading.
    #[must_use]
    pub fn placeholder(operation_id: impl Into<String>) -> Self {
        Self {
            last_updated: String::new(),
            operation_id: operation_id.into(),
            status: "creating".to_string(),
            resources: BTreeMap::new(),
        }
    }

    /// Number of resources currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::StateSnapshot;
    use crate::model::resource::{ResourceState, ResourceStatus};

    #[test]
    fn placeholder_shape() {
        let snapshot = StateSnapshot::placeholder("op-1");
        assert_eq!(snapshot.operation_id, "op-1");
        assert_eq!(snapshot.status, "creating");
        assert_eq!(snapshot.last_updated, "");
        assert!(snapshot.is_empty());
    }

    #[test]
    fn wire_shape_roundtrips() {
        let mut snapshot = StateSnapshot::placeholder("op-2");
        snapshot.resources.insert(
            "r1".into(),
            ResourceState::new("r1", ResourceStatus::Creating, None),
        );

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: StateSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, back);
    }

    #[test]
    fn missing_resources_decodes_as_empty() {
        let snapshot: StateSnapshot = serde_json::from_str(
            r#"{"last_updated":"2024-03-01T10:00:00Z","operation_id":"op-3","status":"creating"}"#,
        )
        .unwrap();
        assert!(snapshot.is_empty());
    }
}
