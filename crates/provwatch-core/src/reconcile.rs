//! The resource-state reconciler.
//!
//! Folds incremental [`StateUpdateEvent`]s into a [`StateSnapshot`] and
//! derives the display buckets the progress view renders. Both operations
//! are pure: `apply_event` is a total function that never fails (malformed
//! events are guarded no-ops), and each call produces a fresh snapshot value
//! so consumers can rely on value comparison for change detection.
//!
//! # Transition rules (in priority order)
//!
//! 1. known resource + `deleted` status → remove the entry;
//! 2. known resource → overwrite `status` and `error` (including clearing a
//!    prior error when the event carries none);
//! 3. unknown resource → insert a new entry.
//!
//! Snapshot-level fields (`last_updated`, `operation_id`, `status`) are
//! carried over unchanged — incremental events never alter them.

use serde::Serialize;
use tracing::debug;

use crate::event::StateUpdateEvent;
use crate::model::operation::OperationType;
use crate::model::resource::{ResourceState, ResourceStatus};
use crate::snapshot::StateSnapshot;

/// Apply one event to a snapshot, producing the next snapshot.
///
/// Events failing the applicability guard (missing or empty `status` /
/// `resource_id`) leave the resource set untouched; the returned value is an
/// identity-preserving copy.
#[must_use]
pub fn apply_event(snapshot: &StateSnapshot, event: &StateUpdateEvent) -> StateSnapshot {
    let mut next = snapshot.clone();

    let Some((resource_id, status)) = event.applicable() else {
        debug!(?event, "dropping non-applicable event");
        return next;
    };

    let status = ResourceStatus::from(status);

    if status.is_deleted() {
        // Removes the key when present; idempotent when absent. Never
        // inserts a tombstone.
        next.resources.remove(resource_id);
    } else if let Some(resource) = next.resources.get_mut(resource_id) {
        resource.status = status;
        resource.error = event.error.clone();
    } else {
        next.resources.insert(
            resource_id.to_string(),
            ResourceState::new(resource_id, status, event.error.clone()),
        );
    }

    next
}

/// The three display buckets derived from a snapshot.
///
/// The buckets are independently computed filters, not a partition: a
/// resource whose status is `created` but which also carries an error
/// appears in both `created` and `errored`. The progress denominator counts
/// it twice — observable behavior the progress caption depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceBuckets {
    /// Resources with a present, non-null error, in map enumeration order.
    pub errored: Vec<ResourceState>,
    /// Resources whose status is `created`.
    pub created: Vec<ResourceState>,
    /// Resources whose status is `planned_create`.
    pub planned: Vec<ResourceState>,
}

/// Derive the display buckets from a snapshot.
#[must_use]
pub fn classify(snapshot: &StateSnapshot) -> ResourceBuckets {
    let mut buckets = ResourceBuckets::default();

    for resource in snapshot.resources.values() {
        if resource.error.is_some() {
            buckets.errored.push(resource.clone());
        }
        if resource.status == ResourceStatus::Created {
            buckets.created.push(resource.clone());
        }
        if resource.status == ResourceStatus::PlannedCreate {
            buckets.planned.push(resource.clone());
        }
    }

    buckets
}

/// Progress of an operation, as shown by the loading bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Number of resources in the `created` bucket.
    pub completed: usize,
    /// `created + errored + planned` — double counts resources matching two
    /// bucket predicates, matching the rendered denominator.
    pub total: usize,
    /// Past-tense verb for the caption (`Created` / `Updated` / `Deleted`).
    pub verb: &'static str,
}

impl Progress {
    #[must_use]
    pub fn from_buckets(buckets: &ResourceBuckets, op_type: OperationType) -> Self {
        Self {
            completed: buckets.created.len(),
            total: buckets.created.len() + buckets.errored.len() + buckets.planned.len(),
            verb: op_type.progress_verb(),
        }
    }

    /// Completion percentage in `0.0..=100.0`. An empty denominator reports
    /// 0.0 rather than NaN.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        100.0 * self.completed as f64 / self.total as f64
    }

    /// The `3 / 5 Created` caption.
    #[must_use]
    pub fn caption(&self) -> String {
        format!("{} / {} {}", self.completed, self.total, self.verb)
    }
}
