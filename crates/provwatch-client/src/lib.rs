//! provwatch-client library.
//!
//! The stateful side of provwatch: the [`WatchSession`] that drives one
//! operation's live view from loading through settled, and the trait seams
//! it consumes — a [`FetchClient`] for the initial snapshot and operation
//! metadata, and an [`EventSource`] for the incremental update stream.
//!
//! Real transports (HTTP, websockets) implement the traits elsewhere; this
//! crate ships only the recorded/scripted implementations used by the CLI
//! replay mode and the tests.

pub mod recorded;
pub mod session;
pub mod source;

pub use recorded::{RecordedFetchClient, RecordedFrame, ScriptedEventSource};
pub use session::{Phase, Polled, SessionOptions, SessionStats, WatchError, WatchSession};
pub use source::{ChannelKey, Delivery, EventSource, FetchClient, Subscription};
