//! `pvw watch` — drive a full watch session over recorded inputs.
//!
//! The snapshot and operation metadata come from JSON fixture files, the
//! event stream from a JSONL log replayed in order. The session runs the
//! same loading → subscribed → settled machine a live transport would
//! drive; the command prints each poll step and a final summary.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use provwatch_client::{
    ChannelKey, EventSource, FetchClient, Phase, Polled, RecordedFetchClient,
    ScriptedEventSource, SessionOptions, WatchError, WatchSession,
};
use provwatch_core::describe_operation;

use crate::config::CliConfig;
use crate::output::{OutputMode, pretty_kv, pretty_section, progress_bar, render_mode};

/// Arguments for `pvw watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Path to the initial state snapshot JSON file.
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Path to operation metadata JSON.
    #[arg(long)]
    pub operation: PathBuf,

    /// Path to a JSONL event log (one event frame per line).
    #[arg(long)]
    pub events: PathBuf,

    /// Project id for the channel key.
    #[arg(long, default_value_t = 0)]
    pub project_id: u64,

    /// Infrastructure id for the channel key.
    #[arg(long, default_value_t = 0)]
    pub infra_id: u64,

    /// Bound for the pre-snapshot event queue. Wins over the config file.
    #[arg(long)]
    pub queue_cap: Option<usize>,
}

/// One poll step that changed or buffered state.
#[derive(Debug, Serialize)]
struct WatchStep {
    action: &'static str,
    count: usize,
    phase: String,
    caption: String,
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

#[derive(Debug, Serialize)]
struct EventStats {
    applied: u64,
    dropped: u64,
    queued: u64,
    overflowed: u64,
}

/// Full watch output payload.
#[derive(Debug, Serialize)]
struct WatchOutput {
    operation_id: String,
    channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    steps: Vec<WatchStep>,
    phase: String,
    completed: usize,
    total: usize,
    percent: f64,
    caption: String,
    buckets: BucketCounts,
    errored: Vec<ErroredResource>,
    stats: EventStats,
}

/// Run one session to completion over the given transports.
fn replay<F, E>(
    fetcher: &F,
    source: &mut E,
    key: ChannelKey,
    options: SessionOptions,
) -> Result<WatchOutput, WatchError>
where
    F: FetchClient,
    E: EventSource,
{
    let mut session = WatchSession::open(fetcher, source, key, options)?;
    session.fetch_initial_state(fetcher);

    let mut steps = Vec::new();
    while session.phase() != Phase::Settled {
        let polled = session.poll()?;
        let (action, count) = match polled {
            Polled::Applied(n) => ("applied", n),
            Polled::Queued(n) => ("queued", n),
            Polled::Idle => continue,
            Polled::Closed => break,
        };
        steps.push(WatchStep {
            action,
            count,
            phase: session.phase().to_string(),
            caption: session.progress().caption(),
        });
    }

    let operation = session.operation().clone();
    let description =
        describe_operation(operation.op_type, operation.status, &operation.last_updated);
    let buckets = session.buckets();
    let progress = session.progress();
    let stats = session.stats();

    Ok(WatchOutput {
        operation_id: operation.id,
        channel: session.key().channel_path(),
        description,
        steps,
        phase: session.phase().to_string(),
        completed: progress.completed,
        total: progress.total,
        percent: progress.percent(),
        caption: progress.caption(),
        buckets: BucketCounts {
            created: buckets.created.len(),
            errored: buckets.errored.len(),
            planned: buckets.planned.len(),
        },
        errored: buckets
            .errored
            .into_iter()
            .map(|resource| ErroredResource {
                id: resource.id,
                error: resource.error.unwrap_or_default(),
            })
            .collect(),
        stats: EventStats {
            applied: stats.applied,
            dropped: stats.dropped,
            queued: stats.queued,
            overflowed: stats.overflowed,
        },
    })
}

fn render_text(report: &WatchOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for step in &report.steps {
        writeln!(
            w,
            "step\t{}\t{}\t{}\t{}",
            step.action, step.count, step.phase, step.caption
        )?;
    }
    writeln!(
        w,
        "{}\t{}\t{}",
        report.operation_id, report.phase, report.caption
    )?;
    for errored in &report.errored {
        writeln!(w, "errored\t{}\t{}", errored.id, errored.error)?;
    }
    Ok(())
}

fn render_pretty(report: &WatchOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Watching {}", report.channel))?;
    if let Some(ref description) = report.description {
        pretty_kv(w, "Description", description)?;
    }

    if !report.steps.is_empty() {
        writeln!(w)?;
        for step in &report.steps {
            writeln!(
                w,
                "  {} {} event(s), now {} [{}]",
                step.action, step.count, step.caption, step.phase
            )?;
        }
        writeln!(w)?;
    }

    #[allow(clippy::cast_possible_truncation)]
    let pct = report.percent.round() as i64;
    let bar = progress_bar(report.percent / 100.0);
    pretty_kv(w, "Progress", format!("{} ({pct}%) {bar}", report.caption))?;
    pretty_kv(w, "Phase", &report.phase)?;
    pretty_kv(
        w,
        "Events",
        format!(
            "{} applied, {} dropped, {} queued, {} overflowed",
            report.stats.applied, report.stats.dropped, report.stats.queued,
            report.stats.overflowed
        ),
    )?;

    if !report.errored.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Errored resources")?;
        for errored in &report.errored {
            writeln!(w, "  {}: {}", errored.id, errored.error)?;
        }
    }
    Ok(())
}

/// Execute `pvw watch`.
pub fn run_watch(args: &WatchArgs, output: OutputMode, config: &CliConfig) -> Result<()> {
    let operation = super::load_operation(&args.operation)?;
    let key = ChannelKey::new(args.project_id, args.infra_id, operation.id);

    let fetcher = RecordedFetchClient::from_files(&args.snapshot, &args.operation)?;
    let mut source = ScriptedEventSource::from_jsonl_file(&args.events)?;

    let mut options = SessionOptions::default();
    if let Some(cap) = args.queue_cap.or(config.queue_cap) {
        options.queue_cap = cap;
    }

    let report = replay(&fetcher, &mut source, key, options)?;
    render_mode(output, &report, render_text, render_pretty)
}
