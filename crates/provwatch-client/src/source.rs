//! Transport seams: the fetch API and the event stream.
//!
//! Both collaborators are abstract here. The traits are transport-agnostic
//! in the same spirit as a wire-protocol seam: any request/response client
//! and any ordered event stream can back a watch session — HTTP and
//! websockets in production, recorded fixtures in tests and the CLI replay
//! mode. Higher-level behavior (reconnects, auth, batching) belongs to the
//! implementations, not the traits.

use std::fmt;

use provwatch_core::{Operation, StateSnapshot, StateUpdateEvent};

/// Identity of one operation's event channel.
///
/// The channel is derived from all three ids so a stale subscription can
/// never cross-apply events to a different operation's snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    pub project_id: u64,
    pub infra_id: u64,
    pub operation_id: String,
}

impl ChannelKey {
    pub fn new(project_id: u64, infra_id: u64, operation_id: impl Into<String>) -> Self {
        Self {
            project_id,
            infra_id,
            operation_id: operation_id.into(),
        }
    }

    /// Path of the state channel under the API root.
    #[must_use]
    pub fn channel_path(&self) -> String {
        format!(
            "projects/{}/infras/{}/operations/{}/state",
            self.project_id, self.infra_id, self.operation_id
        )
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.channel_path())
    }
}

/// Request/response client for the initial snapshot and operation metadata.
///
/// The two fetches are independent: they may complete in either order and
/// write to disjoint parts of the session.
pub trait FetchClient {
    /// Error type for fetch operations.
    type Error: fmt::Debug + fmt::Display;

    /// Fetch the current state snapshot for an infrastructure.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the session recovers from this failure by
    /// synthesizing a placeholder snapshot.
    fn get_infra_state(
        &self,
        project_id: u64,
        infra_id: u64,
    ) -> Result<StateSnapshot, Self::Error>;

    /// Fetch metadata for one operation.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the session surfaces this failure as
    /// terminal.
    fn get_operation(
        &self,
        project_id: u64,
        infra_id: u64,
        operation_id: &str,
    ) -> Result<Operation, Self::Error>;
}

/// One pull from a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// An event frame arrived.
    Event(StateUpdateEvent),
    /// Nothing available right now; poll again later.
    Pending,
    /// The stream ended normally; no further events will arrive.
    Closed,
}

/// An ordered stream of update events for one channel.
pub trait EventSource {
    /// Error type shared with this source's subscriptions.
    type Error: fmt::Debug + fmt::Display;

    /// The subscription handle type.
    type Subscription: Subscription<Error = Self::Error>;

    /// Open a subscription for the given channel.
    ///
    /// Events are delivered strictly after the subscription is established;
    /// there is no replay of earlier events.
    ///
    /// # Errors
    ///
    /// Implementation-defined (unreachable source, rejected channel, ...).
    fn subscribe(&mut self, key: &ChannelKey) -> Result<Self::Subscription, Self::Error>;
}

/// Handle to one open event subscription.
///
/// Dropping the handle (or calling [`close`](Subscription::close)) is the
/// only cancellation primitive; sessions close it when they are torn down or
/// when the operation identity changes.
pub trait Subscription {
    /// Error type for pulls.
    type Error: fmt::Debug + fmt::Display;

    /// Pull the next delivery without blocking.
    ///
    /// # Errors
    ///
    /// A transport error; the caller must treat the subscription as dead
    /// and not pull again.
    fn try_next(&mut self) -> Result<Delivery, Self::Error>;

    /// Close the subscription. Default: drop semantics are sufficient.
    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::ChannelKey;

    #[test]
    fn channel_path_shape() {
        let key = ChannelKey::new(12, 34, "op-9");
        assert_eq!(key.channel_path(), "projects/12/infras/34/operations/op-9/state");
        assert_eq!(key.to_string(), key.channel_path());
    }

    #[test]
    fn keys_differing_in_any_id_are_distinct() {
        let base = ChannelKey::new(1, 2, "op");
        assert_ne!(base, ChannelKey::new(9, 2, "op"));
        assert_ne!(base, ChannelKey::new(1, 9, "op"));
        assert_ne!(base, ChannelKey::new(1, 2, "other"));
    }
}
