//! Domain model: resources, operations, and infrastructure records.

pub mod infra;
pub mod operation;
pub mod resource;
