//! provwatch-core library.
//!
//! The data model and pure logic for tracking one infrastructure operation:
//! per-resource provisioning state, the snapshot reconciler that folds
//! incremental update events into that state, classification into display
//! buckets, and the human-readable operation description table.
//!
//! Everything here is synchronous and total. Transports (the fetch API and
//! the event stream) live behind trait seams in `provwatch-client`.
//!
//! # Conventions
//!
//! - **Errors**: library types carry [`error::ErrorCode`]; fallible parsing
//!   returns typed errors, reconciliation never fails.
//! - **Logging**: `tracing` macros (`debug!`, `warn!`) — no subscriber is
//!   installed here.

pub mod describe;
pub mod error;
pub mod event;
pub mod model;
pub mod reconcile;
pub mod snapshot;

pub use describe::{describe_operation, readable_date};
pub use error::ErrorCode;
pub use event::StateUpdateEvent;
pub use model::infra::{InfraKind, InfraRecord, InfraStatus};
pub use model::operation::{Operation, OperationStatus, OperationType};
pub use model::resource::{ResourceState, ResourceStatus};
pub use reconcile::{Progress, ResourceBuckets, apply_event, classify};
pub use snapshot::StateSnapshot;
