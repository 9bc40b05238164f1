//! `pvw status` — one-shot view of a state snapshot.
//!
//! Classifies a snapshot into display buckets and reports progress, the
//! operation description (when metadata is supplied), and any errored
//! resources.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use provwatch_core::{
    Operation, OperationType, Progress, StateSnapshot, classify, describe_operation,
    readable_date,
};

use crate::output::{OutputMode, pretty_kv, pretty_section, progress_bar, render_mode};

/// Arguments for `pvw status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Path to a state snapshot JSON file.
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Path to operation metadata JSON; enables the description line and
    /// the correct progress verb.
    #[arg(long)]
    pub operation: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct BucketCounts {
    created: usize,
    errored: usize,
    planned: usize,
}

#[derive(Debug, Serialize)]
struct ErroredResource {
    id: String,
    error: String,
}

/// Full status output payload.
#[derive(Debug, Serialize)]
struct StatusOutput {
    operation_id: String,
    status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    last_updated: String,
    buckets: BucketCounts,
    completed: usize,
    total: usize,
    percent: f64,
    caption: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    errored: Vec<ErroredResource>,
}

fn load_snapshot(path: &Path) -> Result<StateSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn build_output(snapshot: &StateSnapshot, operation: Option<&Operation>) -> StatusOutput {
    let buckets = classify(snapshot);
    let op_type = operation.map_or(OperationType::Create, |op| op.op_type);
    let progress = Progress::from_buckets(&buckets, op_type);
    let description =
        operation.and_then(|op| describe_operation(op.op_type, op.status, &op.last_updated));

    StatusOutput {
        operation_id: snapshot.operation_id.clone(),
        status: snapshot.status.clone(),
        last_updated: snapshot.last_updated.clone(),
        buckets: BucketCounts {
            created: buckets.created.len(),
            errored: buckets.errored.len(),
            planned: buckets.planned.len(),
        },
        completed: progress.completed,
        total: progress.total,
        percent: progress.percent(),
        caption: progress.caption(),
        description,
        errored: buckets
            .errored
            .into_iter()
            .map(|resource| ErroredResource {
                id: resource.id,
                error: resource.error.unwrap_or_default(),
            })
            .collect(),
    }
}

fn render_text(report: &StatusOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}",
        report.operation_id, report.status, report.caption
    )?;
    for errored in &report.errored {
        writeln!(w, "errored\t{}\t{}", errored.id, errored.error)?;
    }
    Ok(())
}

fn render_pretty(report: &StatusOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Operation {}", report.operation_id))?;
    pretty_kv(w, "Status", &report.status)?;
    if !report.last_updated.is_empty() {
        pretty_kv(w, "Last updated", readable_date(&report.last_updated))?;
    }
    if let Some(ref description) = report.description {
        pretty_kv(w, "Description", description)?;
    }

    #[allow(clippy::cast_possible_truncation)]
    let pct = report.percent.round() as i64;
    let bar = progress_bar(report.percent / 100.0);
    pretty_kv(w, "Progress", format!("{} ({pct}%) {bar}", report.caption))?;

    if !report.errored.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Errored resources")?;
        for errored in &report.errored {
            writeln!(w, "  {}: {}", errored.id, errored.error)?;
        }
    }
    Ok(())
}

/// Execute `pvw status`.
pub fn run_status(args: &StatusArgs, output: OutputMode) -> Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let operation = args
        .operation
        .as_deref()
        .map(super::load_operation)
        .transpose()?;

    let report = build_output(&snapshot, operation.as_ref());
    render_mode(output, &report, render_text, render_pretty)
}
