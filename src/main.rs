//! folio-analytics - visitor analytics for a static portfolio site.
//!
//! This binary is the tracker's composition root. The page host pipes
//! JSONL page events into `run`; `stats` prints the composite snapshot;
//! `reset` wipes all analytics data after confirmation.
//!
//! # Commands
//!
//! - `folio-analytics run`: read page events from stdin and track them
//! - `folio-analytics stats`: print the analytics snapshot as JSON
//! - `folio-analytics reset`: wipe all analytics data
//!
//! # Environment Variables
//!
//! See the [`config`](folio_analytics::config) module for available
//! configuration options.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use folio_analytics::config::TrackerConfig;
use folio_analytics::page::{parse_page_event, CounterDisplay, PageEvent};
use folio_analytics::storage::JsonFileStore;
use folio_analytics::tracker::Tracker;

/// folio-analytics - visitor analytics for a static portfolio site.
///
/// Tracks page views, unique visitors, section engagement, referrers, and
/// interaction events fed in by the page host as JSONL.
#[derive(Parser, Debug)]
#[command(name = "folio-analytics")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    FOLIO_CONFIG_URL      Remote config URL (forwarding stays off if unset)
    FOLIO_DATA_DIR        Data directory (default: ~/.folio-analytics)
    FOLIO_TAG_ORIGIN      Tag script origin
    FOLIO_TAG_QUEUE_SIZE  Tag command queue capacity (default: 1000)

EXAMPLES:
    # Track a session from a page-event stream
    page-host | folio-analytics run

    # Print the statistics snapshot
    folio-analytics stats

    # Wipe all analytics data
    folio-analytics reset
")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Read JSONL page events from stdin and track them.
    ///
    /// Expects a `load` event first; clicks, section visibility reports,
    /// and an optional `unload` follow. Malformed lines are skipped.
    Run {
        /// Echo counter updates to stderr.
        #[arg(long)]
        show_counts: bool,
    },

    /// Print the analytics snapshot as pretty JSON.
    Stats,

    /// Reset all analytics data. Irreversible.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },
}

/// Counter display that echoes updates to stderr.
struct StderrDisplay;

impl CounterDisplay for StderrDisplay {
    fn set_view_count(&mut self, count: u64) {
        eprintln!("views: {count}");
    }

    fn set_click_count(&mut self, count: u64) {
        eprintln!("clicks: {count}");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run { show_counts } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to create tokio runtime")?;
            runtime.block_on(run_bridge(show_counts))
        }
        Command::Stats => run_stats(),
        Command::Reset { force } => run_reset(force),
    }
}

/// Builds a tracker over the configured file store.
fn build_tracker() -> Result<Tracker<JsonFileStore>> {
    let config = TrackerConfig::from_env().context("Failed to load configuration")?;
    let store =
        JsonFileStore::open(config.store_path()).context("Failed to open analytics store")?;
    Tracker::new(config, store).context("Failed to build tracker")
}

/// Runs the JSONL bridge: stdin page events in, tracked analytics out.
async fn run_bridge(show_counts: bool) -> Result<()> {
    let mut tracker = build_tracker()?;
    if show_counts {
        tracker = tracker.with_display(Box::new(StderrDisplay));
    }

    info!(visitor_id = tracker.visitor_id(), "Tracker ready");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut loaded = false;
    let mut unloaded = false;

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let Some(event) = parse_page_event(&line) else {
            continue;
        };

        match event {
            PageEvent::Load(context) => {
                if loaded {
                    warn!("Duplicate load event, ignoring");
                    continue;
                }
                loaded = true;
                tracker.init(context).await;
            }
            PageEvent::Click(target) => {
                if !loaded {
                    warn!("Click before load event, ignoring");
                    continue;
                }
                tracker.handle_click(&target);
            }
            PageEvent::Section { id, ratio } => {
                if !loaded {
                    warn!("Section report before load event, ignoring");
                    continue;
                }
                tracker.observe_section(&id, ratio);
            }
            PageEvent::Unload => {
                tracker.end_session();
                unloaded = true;
                break;
            }
        }
    }

    // A closed stream without an unload still ends the session.
    if !unloaded {
        tracker.end_session();
    }

    info!(
        page_views = tracker.state().page_views,
        duration_secs = tracker.last_session_duration().unwrap_or(0),
        "Session ended"
    );
    Ok(())
}

/// Prints the analytics snapshot as pretty JSON.
fn run_stats() -> Result<()> {
    let tracker = build_tracker()?;
    let snapshot = tracker.snapshot();

    let json =
        serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
    println!("{json}");
    Ok(())
}

/// Resets all analytics data after confirmation.
fn run_reset(force: bool) -> Result<()> {
    if !force {
        eprint!("Reset all analytics data? This cannot be undone. [y/N] ");
        io::stderr().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
            eprintln!("Aborted.");
            return Ok(());
        }
    }

    let mut tracker = build_tracker()?;
    tracker.reset_all();
    eprintln!("Analytics data reset.");
    Ok(())
}
