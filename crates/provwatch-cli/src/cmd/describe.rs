//! `pvw describe` — the human sentence for one operation's state.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use provwatch_core::{ErrorCode, describe_operation};

use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `pvw describe`.
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Path to operation metadata JSON.
    #[arg(long)]
    pub operation: PathBuf,
}

/// Output payload for `pvw describe`.
#[derive(Debug, Serialize)]
struct DescribeOutput {
    operation_id: String,
    #[serde(rename = "type")]
    op_type: String,
    status: String,
    description: String,
}

fn render_text(report: &DescribeOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "{}", report.description)
}

fn render_pretty(report: &DescribeOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Operation {}", report.operation_id))?;
    pretty_kv(w, "Type", &report.op_type)?;
    pretty_kv(w, "Status", &report.status)?;
    pretty_kv(w, "Description", &report.description)
}

/// Execute `pvw describe`.
///
/// A `(type, status)` pair outside the description table is a contract gap;
/// it is surfaced as a structured error rather than papered over with a
/// default sentence.
pub fn run_describe(args: &DescribeArgs, output: OutputMode) -> Result<()> {
    let operation = super::load_operation(&args.operation)?;

    let Some(description) =
        describe_operation(operation.op_type, operation.status, &operation.last_updated)
    else {
        let code = ErrorCode::DescriptionUnavailable;
        return Err(CliError {
            message: format!(
                "no description for operation type '{}' with status '{}'",
                operation.op_type, operation.status
            ),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
        .into());
    };

    let report = DescribeOutput {
        operation_id: operation.id,
        op_type: operation.op_type.to_string(),
        status: operation.status.to_string(),
        description,
    };
    render_mode(output, &report, render_text, render_pretty)
}
