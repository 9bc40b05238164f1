//! Recorded transports: fetch fixtures and scripted event streams.
//!
//! These back the CLI's offline replay mode and the test suite. Delivery is
//! deterministic: frames come out exactly in script order, with `Pending`
//! ticks and mid-stream errors available for exercising the session's
//! loading and failure paths.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::Context;

use provwatch_core::{Operation, StateSnapshot, StateUpdateEvent, event::decode_frame};

use crate::source::{ChannelKey, Delivery, EventSource, FetchClient, Subscription};

/// Error produced by the recorded transports.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RecordedError(String);

impl RecordedError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Fetch client answering from in-memory fixtures.
///
/// Either fetch can be scripted to fail, for exercising the placeholder
/// fallback and the terminal metadata-fetch error.
#[derive(Debug, Clone, Default)]
pub struct RecordedFetchClient {
    snapshot: Option<StateSnapshot>,
    operation: Option<Operation>,
}

impl RecordedFetchClient {
    #[must_use]
    pub fn new(snapshot: StateSnapshot, operation: Operation) -> Self {
        Self {
            snapshot: Some(snapshot),
            operation: Some(operation),
        }
    }

    /// Load both fixtures from JSON files.
    ///
    /// # Errors
    ///
    /// Returns an error when either file cannot be read or parsed.
    pub fn from_files(state_path: &Path, operation_path: &Path) -> anyhow::Result<Self> {
        let snapshot = read_json(state_path)?;
        let operation = read_json(operation_path)?;
        Ok(Self::new(snapshot, operation))
    }

    /// Script the state fetch to fail.
    #[must_use]
    pub fn with_state_failure(mut self) -> Self {
        self.snapshot = None;
        self
    }

    /// Script the operation metadata fetch to fail.
    #[must_use]
    pub fn with_operation_failure(mut self) -> Self {
        self.operation = None;
        self
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

impl FetchClient for RecordedFetchClient {
    type Error = RecordedError;

    fn get_infra_state(
        &self,
        _project_id: u64,
        _infra_id: u64,
    ) -> Result<StateSnapshot, Self::Error> {
        self.snapshot
            .clone()
            .ok_or_else(|| RecordedError::new("recorded state fetch failure"))
    }

    fn get_operation(
        &self,
        _project_id: u64,
        _infra_id: u64,
        operation_id: &str,
    ) -> Result<Operation, Self::Error> {
        let operation = self
            .operation
            .clone()
            .ok_or_else(|| RecordedError::new("recorded operation fetch failure"))?;
        if operation.id != operation_id {
            return Err(RecordedError::new(format!(
                "no recorded operation '{operation_id}' (have '{}')",
                operation.id
            )));
        }
        Ok(operation)
    }
}

/// One scripted delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedFrame {
    /// Deliver an event.
    Event(StateUpdateEvent),
    /// Deliver "nothing available yet".
    Pending,
    /// Fail the subscription with this message.
    Error(String),
}

/// Event source replaying a fixed script, in order.
///
/// The script can be built programmatically or parsed from a JSONL event
/// log (one JSON frame per line, blank lines skipped). The source counts
/// subscriptions and remembers the last channel key, so tests can assert
/// the subscribe-exactly-once rule.
#[derive(Debug, Default)]
pub struct ScriptedEventSource {
    frames: Vec<RecordedFrame>,
    subscriptions: usize,
    last_key: Option<ChannelKey>,
}

impl ScriptedEventSource {
    #[must_use]
    pub fn new(events: Vec<StateUpdateEvent>) -> Self {
        Self {
            frames: events.into_iter().map(RecordedFrame::Event).collect(),
            subscriptions: 0,
            last_key: None,
        }
    }

    #[must_use]
    pub fn from_frames(frames: Vec<RecordedFrame>) -> Self {
        Self {
            frames,
            subscriptions: 0,
            last_key: None,
        }
    }

    /// Parse a JSONL event log into a script.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending line when a frame is not valid
    /// JSON of the expected shape.
    pub fn from_jsonl(log: &str) -> anyhow::Result<Self> {
        let mut frames = Vec::new();
        for (lineno, line) in log.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let event = decode_frame(line)
                .with_context(|| format!("bad event frame on line {}", lineno + 1))?;
            frames.push(RecordedFrame::Event(event));
        }
        Ok(Self::from_frames(frames))
    }

    /// Load a JSONL event log from a file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or a frame is invalid.
    pub fn from_jsonl_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_jsonl(&content)
    }

    /// How many times `subscribe` has been called.
    #[must_use]
    pub const fn subscriptions(&self) -> usize {
        self.subscriptions
    }

    /// The channel key of the most recent subscription.
    #[must_use]
    pub const fn last_key(&self) -> Option<&ChannelKey> {
        self.last_key.as_ref()
    }
}

impl EventSource for ScriptedEventSource {
    type Error = RecordedError;
    type Subscription = ScriptedSubscription;

    fn subscribe(&mut self, key: &ChannelKey) -> Result<Self::Subscription, Self::Error> {
        self.subscriptions += 1;
        self.last_key = Some(key.clone());
        if self.subscriptions > 1 {
            return Err(RecordedError::new(format!(
                "script already consumed by a previous subscription to {key}"
            )));
        }
        Ok(ScriptedSubscription {
            frames: std::mem::take(&mut self.frames).into(),
            closed: false,
        })
    }
}

/// Subscription handle over a consumed script.
#[derive(Debug)]
pub struct ScriptedSubscription {
    frames: VecDeque<RecordedFrame>,
    closed: bool,
}

impl Subscription for ScriptedSubscription {
    type Error = RecordedError;

    fn try_next(&mut self) -> Result<Delivery, Self::Error> {
        if self.closed {
            return Ok(Delivery::Closed);
        }
        match self.frames.pop_front() {
            Some(RecordedFrame::Event(event)) => Ok(Delivery::Event(event)),
            Some(RecordedFrame::Pending) => Ok(Delivery::Pending),
            Some(RecordedFrame::Error(message)) => {
                self.closed = true;
                Err(RecordedError::new(message))
            }
            None => Ok(Delivery::Closed),
        }
    }

    fn close(&mut self) {
        self.closed = true;
        self.frames.clear();
    }
}
