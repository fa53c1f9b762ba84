//! SLA telemetry CLI
//!
//! The `slactl` command exercises the integration layer outside the
//! assessment engine.
//!
//! ## Commands
//!
//! - `query`: retrieve metric values for an agreement's variables
//! - `notify`: deliver an assessment result to the configured notifiers
//! - `config`: print the effective settings

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};

use sla_core::model::{
    Agreement, AssessmentResult, Client, MetricValue, RetrievalItem, TimeWindow, Variable,
};
use sla_core::monitor::{CancellationToken, ItemOutcome, RetrievalReport};
use sla_core::notifier::{NotifyOutcome, ViolationNotifier};
use sla_core::{build_notifiers, build_retriever, init_tracing, Settings};

#[derive(Parser)]
#[command(name = "slactl")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "SLA telemetry retrieval and violation notification", long_about = None)]
struct Cli {
    /// Settings file (TOML); SLA_* environment variables override it
    #[arg(short, long, global = true, env = "SLA_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the monitoring backend for an agreement's variables
    Query {
        /// Agreement file (JSON)
        #[arg(short, long, conflicts_with = "monitoring_url")]
        agreement: Option<PathBuf>,

        /// Monitoring backend for an ad-hoc agreement
        #[arg(long)]
        monitoring_url: Option<String>,

        /// Variable to retrieve, as NAME=EXPR (repeatable; defaults to the
        /// agreement's variables)
        #[arg(long = "var", value_parser = parse_variable)]
        vars: Vec<Variable>,

        /// Length of the window ending now, in seconds
        #[arg(long, default_value_t = 60)]
        window_secs: i64,
    },

    /// Deliver an assessment result to the configured notifiers
    Notify {
        /// Agreement file (JSON)
        #[arg(short, long)]
        agreement: PathBuf,

        /// Assessment result file (JSON)
        #[arg(short, long)]
        result: PathBuf,
    },

    /// Print the effective settings as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        settings.log.level()?
    };
    init_tracing(cli.json || settings.log.json, level);

    match cli.command {
        Commands::Query {
            agreement,
            monitoring_url,
            vars,
            window_secs,
        } => cmd_query(&settings, agreement.as_deref(), monitoring_url, vars, window_secs).await,
        Commands::Notify { agreement, result } => {
            cmd_notify(&settings, &agreement, &result).await
        }
        Commands::Config => {
            print!("{}", settings.to_toml()?);
            Ok(())
        }
    }
}

fn parse_variable(raw: &str) -> std::result::Result<Variable, String> {
    match raw.split_once('=') {
        Some((name, expr)) if !name.trim().is_empty() && !expr.trim().is_empty() => {
            Ok(Variable::new(name.trim(), expr.trim()))
        }
        _ => Err(format!("expected NAME=EXPR, got '{raw}'")),
    }
}

fn window_ending_now(window_secs: i64) -> Result<TimeWindow> {
    if window_secs <= 0 {
        bail!("--window-secs must be positive");
    }
    let length = chrono::Duration::try_seconds(window_secs)
        .with_context(|| format!("--window-secs {window_secs} is out of range"))?;
    TimeWindow::ending_at(Utc::now(), length)
        .with_context(|| format!("--window-secs {window_secs} reaches before the earliest date"))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid {what} file {}", path.display()))
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    agreement_id: &'a str,
    fetched: usize,
    failed: usize,
    items: Vec<ItemOutput<'a>>,
}

#[derive(Serialize)]
struct ItemOutput<'a> {
    variable: &'a str,
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    values: &'a [MetricValue],
}

async fn cmd_query(
    settings: &Settings,
    agreement_path: Option<&Path>,
    monitoring_url: Option<String>,
    vars: Vec<Variable>,
    window_secs: i64,
) -> Result<()> {
    let agreement = match (agreement_path, monitoring_url) {
        (Some(path), _) => read_json::<Agreement>(path, "agreement")?,
        (None, url) => {
            let agreement = Agreement::new("adhoc", "ad-hoc query", Client::default());
            match url {
                Some(url) => agreement.with_monitoring_url(url),
                None => agreement,
            }
        }
    };

    let variables = if vars.is_empty() {
        agreement.details.variables.clone()
    } else {
        vars
    };
    if variables.is_empty() {
        bail!("No variables to query: pass --var NAME=EXPR or an agreement with variables");
    }
    let window = window_ending_now(window_secs)?;
    let items: Vec<RetrievalItem> = variables
        .into_iter()
        .map(|variable| RetrievalItem::new(variable, window))
        .collect();

    let retriever = build_retriever(settings)?;
    info!(
        agreement_id = %agreement.id,
        root = %retriever.prometheus_root(&agreement),
        items = items.len(),
        "Querying"
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let report = retriever.retrieve_report(&agreement, &items, &cancel).await;
    println!("{}", serde_json::to_string_pretty(&query_output(&agreement, &report))?);
    Ok(())
}

fn query_output<'a>(agreement: &'a Agreement, report: &'a RetrievalReport) -> QueryOutput<'a> {
    let items = report
        .items
        .iter()
        .map(|item| ItemOutput {
            variable: &item.variable.name,
            url: &item.url,
            error: match &item.outcome {
                ItemOutcome::Failed(err) => Some(err.to_string()),
                ItemOutcome::Fetched { .. } => None,
            },
            values: report
                .values
                .get(&item.variable)
                .map(Vec::as_slice)
                .unwrap_or_default(),
        })
        .collect();

    QueryOutput {
        agreement_id: &agreement.id,
        fetched: report.fetched(),
        failed: report.failed(),
        items,
    }
}

#[derive(Serialize)]
struct SinkOutput {
    sink: &'static str,
    status: &'static str,
    delivered: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl SinkOutput {
    fn new(sink: &'static str, outcome: NotifyOutcome) -> Self {
        let delivered = outcome.delivered();
        match outcome {
            NotifyOutcome::NothingToSend => Self {
                sink,
                status: "skipped",
                delivered,
                failed: None,
                reason: None,
            },
            NotifyOutcome::Delivered { .. } => Self {
                sink,
                status: "delivered",
                delivered,
                failed: None,
                reason: None,
            },
            NotifyOutcome::Failed { failed, reason, .. } => Self {
                sink,
                status: "failed",
                delivered,
                failed: Some(failed),
                reason: Some(reason),
            },
        }
    }
}

async fn cmd_notify(settings: &Settings, agreement_path: &Path, result_path: &Path) -> Result<()> {
    let agreement: Agreement = read_json(agreement_path, "agreement")?;
    let result: AssessmentResult = read_json(result_path, "assessment result")?;

    let notifiers = build_notifiers(settings)?;
    if notifiers.is_empty() {
        bail!("No notifiers configured");
    }
    info!(
        agreement_id = %agreement.id,
        violations = result.violation_count(),
        sinks = ?notifiers.sink_names(),
        "Notifying"
    );

    let outcomes = notifiers.deliver_all(&agreement, &result).await;
    notifiers.shutdown().await;

    let output: Vec<SinkOutput> = outcomes
        .into_iter()
        .map(|(sink, outcome)| SinkOutput::new(sink, outcome))
        .collect();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
