//! Command handlers for the `pvw` binary.

pub mod describe;
pub mod status;
pub mod watch;

use anyhow::{Context, Result};
use std::path::Path;

use provwatch_core::Operation;

/// Load an operation metadata record from a JSON file.
pub fn load_operation(path: &Path) -> Result<Operation> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
