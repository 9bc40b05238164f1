//! The watch session: one operation's live view, from loading to settled.
//!
//! A [`WatchSession`] ties the pieces together: it fetches operation
//! metadata, opens the event subscription (exactly once, keyed by operation
//! identity), installs the initial snapshot — or a placeholder when the
//! state fetch fails — and folds pulled events into the snapshot through
//! [`provwatch_core::apply_event`].
//!
//! # Phases
//!
//! `Loading` → `Subscribed` → `Settled`. Events pulled while still loading
//! are queued (bounded, oldest dropped on overflow) and drained through the
//! normal apply path once the snapshot installs, so no update that arrives
//! during the initial fetch is lost and ordering is preserved.
//!
//! Everything is single-threaded and pull-driven: the caller decides when to
//! poll, and no locking is needed because each applied event produces a
//! fresh snapshot value.

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, info, warn};

use provwatch_core::{
    ErrorCode, Operation, Progress, ResourceBuckets, StateSnapshot, apply_event, classify,
};

use crate::source::{ChannelKey, Delivery, EventSource, FetchClient, Subscription};

/// Default bound for the pre-snapshot event queue.
pub const DEFAULT_QUEUE_CAP: usize = 256;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial snapshot fetch still outstanding.
    Loading,
    /// Snapshot installed, subscription open.
    Subscribed,
    /// Terminal: no further snapshot changes will be delivered.
    Settled,
}

impl Phase {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Subscribed => "subscribed",
            Self::Settled => "settled",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables for a watch session.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Maximum number of events buffered while the snapshot is loading.
    pub queue_cap: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            queue_cap: DEFAULT_QUEUE_CAP,
        }
    }
}

/// Counters a session keeps about its event handling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Events applied to the snapshot.
    pub applied: u64,
    /// Non-applicable events dropped by the guard.
    pub dropped: u64,
    /// Events buffered while loading.
    pub queued: u64,
    /// Queued events discarded because the queue was full.
    pub overflowed: u64,
}

/// Terminal failures of a watch session.
///
/// The reconciler itself never fails; these all originate in the external
/// collaborators.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The operation metadata fetch failed. Unlike the state fetch, there is
    /// no placeholder to degrade to — the session cannot start.
    #[error("operation metadata fetch failed for {channel}: {message}")]
    OperationFetch { channel: String, message: String },

    /// The event subscription could not be opened.
    #[error("failed to subscribe to {channel}: {message}")]
    Subscribe { channel: String, message: String },

    /// An open subscription failed; it has been closed, with no automatic
    /// reconnect.
    #[error("subscription lost on {channel}: {message}")]
    Subscription { channel: String, message: String },
}

impl WatchError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::OperationFetch { .. } => ErrorCode::OperationFetchFailed,
            Self::Subscribe { .. } => ErrorCode::SubscribeFailed,
            Self::Subscription { .. } => ErrorCode::SubscriptionLost,
        }
    }

    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        self.error_code().hint()
    }
}

/// Outcome of one [`WatchSession::poll`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polled {
    /// Events were applied to the snapshot.
    Applied(usize),
    /// Events were queued while the snapshot is still loading.
    Queued(usize),
    /// Nothing available right now.
    Idle,
    /// The stream has ended; the session is settled.
    Closed,
}

/// Live view of one infrastructure operation.
#[derive(Debug)]
pub struct WatchSession<S: Subscription> {
    key: ChannelKey,
    phase: Phase,
    operation: Operation,
    snapshot: Option<StateSnapshot>,
    pending: VecDeque<provwatch_core::StateUpdateEvent>,
    queue_cap: usize,
    subscription: Option<S>,
    stats: SessionStats,
}

impl<S: Subscription> WatchSession<S> {
    /// Open a session: fetch operation metadata and, if the operation is
    /// still in flight, subscribe to its event channel.
    ///
    /// The subscription is opened exactly once per operation identity; it
    /// does not depend on snapshot contents, so later snapshot changes never
    /// resubscribe. Operations already terminal get no subscription and
    /// settle as soon as the snapshot resolves.
    ///
    /// # Errors
    ///
    /// [`WatchError::OperationFetch`] when the metadata fetch fails (no
    /// placeholder exists for metadata), [`WatchError::Subscribe`] when the
    /// channel cannot be opened.
    pub fn open<F, E>(
        fetcher: &F,
        source: &mut E,
        key: ChannelKey,
        options: SessionOptions,
    ) -> Result<Self, WatchError>
    where
        F: FetchClient,
        E: EventSource<Subscription = S>,
    {
        let operation = fetcher
            .get_operation(key.project_id, key.infra_id, &key.operation_id)
            .map_err(|err| WatchError::OperationFetch {
                channel: key.channel_path(),
                message: err.to_string(),
            })?;

        let subscription = if operation.status.is_terminal() {
            debug!(channel = %key, status = %operation.status, "operation already terminal; not subscribing");
            None
        } else {
            let subscription = source.subscribe(&key).map_err(|err| WatchError::Subscribe {
                channel: key.channel_path(),
                message: err.to_string(),
            })?;
            info!(channel = %key, "subscribed to state events");
            Some(subscription)
        };

        Ok(Self {
            key,
            phase: Phase::Loading,
            operation,
            snapshot: None,
            pending: VecDeque::new(),
            queue_cap: options.queue_cap.max(1),
            subscription,
            stats: SessionStats::default(),
        })
    }

    /// Resolve the initial snapshot.
    ///
    /// A failed state fetch degrades to a placeholder snapshot so the watch
    /// proceeds instead of staying stuck loading. Events queued while
    /// loading are drained through the normal apply path, in arrival order.
    pub fn fetch_initial_state<F: FetchClient>(&mut self, fetcher: &F) {
        let snapshot = match fetcher.get_infra_state(self.key.project_id, self.key.infra_id) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(channel = %self.key, %err, "state fetch failed; synthesizing placeholder snapshot");
                StateSnapshot::placeholder(&self.key.operation_id)
            }
        };
        self.install_snapshot(snapshot);
    }

    /// Install an already-fetched snapshot and drain the pending queue.
    pub fn install_snapshot(&mut self, snapshot: StateSnapshot) {
        let mut snapshot = snapshot;
        let drained = self.pending.len();
        while let Some(event) = self.pending.pop_front() {
            snapshot = apply_event(&snapshot, &event);
            self.stats.applied += 1;
        }
        if drained > 0 {
            debug!(channel = %self.key, drained, "drained pre-snapshot event queue");
        }
        self.snapshot = Some(snapshot);

        self.phase = if self.subscription.is_some() {
            Phase::Subscribed
        } else {
            Phase::Settled
        };
        info!(channel = %self.key, phase = %self.phase, "initial snapshot installed");
    }

    /// Pull all currently-available deliveries from the subscription.
    ///
    /// Applicable events are applied to the snapshot (or queued while still
    /// loading); non-applicable events are dropped silently. A closed stream
    /// settles the session.
    ///
    /// # Errors
    ///
    /// [`WatchError::Subscription`] on a transport error. The subscription
    /// is closed first; there is no automatic reconnect.
    pub fn poll(&mut self) -> Result<Polled, WatchError> {
        if self.subscription.is_none() {
            return Ok(Polled::Closed);
        }

        let mut applied = 0usize;
        let mut queued = 0usize;

        loop {
            let delivery = match self.subscription.as_mut() {
                Some(subscription) => subscription.try_next(),
                None => break,
            };

            match delivery {
                Ok(Delivery::Event(event)) => {
                    if event.applicable().is_none() {
                        debug!(channel = %self.key, ?event, "dropping non-applicable event");
                        self.stats.dropped += 1;
                        continue;
                    }
                    match self.snapshot.as_ref() {
                        Some(snapshot) => {
                            self.snapshot = Some(apply_event(snapshot, &event));
                            self.stats.applied += 1;
                            applied += 1;
                        }
                        None => {
                            if self.pending.len() == self.queue_cap {
                                self.pending.pop_front();
                                self.stats.overflowed += 1;
                                warn!(
                                    channel = %self.key,
                                    code = %ErrorCode::EventQueueOverflow,
                                    cap = self.queue_cap,
                                    "pre-snapshot queue full; dropping oldest event"
                                );
                            }
                            self.pending.push_back(event);
                            self.stats.queued += 1;
                            queued += 1;
                        }
                    }
                }
                Ok(Delivery::Pending) => break,
                Ok(Delivery::Closed) => {
                    info!(channel = %self.key, "event stream closed");
                    self.close();
                    if applied == 0 && queued == 0 {
                        return Ok(Polled::Closed);
                    }
                    break;
                }
                Err(err) => {
                    let message = err.to_string();
                    self.close();
                    return Err(WatchError::Subscription {
                        channel: self.key.channel_path(),
                        message,
                    });
                }
            }
        }

        Ok(match (applied, queued) {
            (0, 0) => Polled::Idle,
            (n, 0) => Polled::Applied(n),
            (_, n) => Polled::Queued(n),
        })
    }

    /// Close the subscription and settle the session.
    ///
    /// Idempotent. Must run before the operation identity changes hands so
    /// late events cannot mutate a stale operation's snapshot; dropping the
    /// session does the same.
    pub fn close(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.close();
            info!(channel = %self.key, "subscription closed");
        }
        self.phase = Phase::Settled;
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn key(&self) -> &ChannelKey {
        &self.key
    }

    #[must_use]
    pub const fn operation(&self) -> &Operation {
        &self.operation
    }

    /// The current snapshot; `None` until the initial fetch resolves.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&StateSnapshot> {
        self.snapshot.as_ref()
    }

    /// Display buckets for the current snapshot (empty while loading).
    #[must_use]
    pub fn buckets(&self) -> ResourceBuckets {
        self.snapshot.as_ref().map(classify).unwrap_or_default()
    }

    /// Progress derived from the current buckets and the operation type.
    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress::from_buckets(&self.buckets(), self.operation.op_type)
    }

    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }
}

impl<S: Subscription> Drop for WatchSession<S> {
    fn drop(&mut self) {
        self.close();
    }
}
