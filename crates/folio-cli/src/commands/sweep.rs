//! Sweep command - send expiration reminders once or on an interval.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Args;
use console::style;
use tokio::task::JoinHandle;
use tracing::{error, info};

use folio_core::expiration::{ExpirationSweep, SweepReport};
use folio_core::models::config::FolioConfig;
use folio_core::notify::{LogTransport, NotificationTransport, OutboxTransport};
use folio_core::store::JsonFileStore;

use super::load_config;
use super::records::parse_due;

/// Arguments for the sweep command.
#[derive(Args)]
pub struct SweepArgs {
    /// Evaluate as of this instant instead of the current time
    #[arg(long, value_parser = parse_due, conflicts_with = "watch")]
    now: Option<DateTime<Utc>>,

    /// Keep running, sweeping on an interval
    #[arg(long)]
    watch: bool,

    /// Seconds between sweeps in watch mode
    #[arg(long, default_value = "3600")]
    interval_secs: u64,

    /// Log messages instead of writing them to the outbox
    #[arg(long)]
    log_only: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

type SharedTransport = Arc<dyn NotificationTransport + Send + Sync>;

pub async fn run(args: SweepArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = Arc::new(load_config(config_path)?);
    let sweep = Arc::new(ExpirationSweep::from_config(&config.expiration));

    let transport: SharedTransport = if args.log_only {
        Arc::new(LogTransport)
    } else {
        Arc::new(OutboxTransport::new(&config.notify.outbox_dir))
    };

    if !args.watch {
        let now = args.now.unwrap_or_else(Utc::now);
        let report = sweep_once(&sweep, &config, transport.as_ref(), now)?;
        print_report(&report, args.json)?;
        return Ok(());
    }

    if args.interval_secs == 0 {
        anyhow::bail!("--interval-secs must be greater than zero");
    }

    println!(
        "{} Sweeping every {}s, press Ctrl-C to stop",
        style("ℹ").blue(),
        args.interval_secs
    );

    let mut interval = tokio::time::interval(Duration::from_secs(args.interval_secs));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let task = {
                    let sweep = Arc::clone(&sweep);
                    let config = Arc::clone(&config);
                    let transport = Arc::clone(&transport);
                    tokio::task::spawn_blocking(move || {
                        sweep_once(&sweep, &config, transport.as_ref(), Utc::now())
                    })
                };
                let (outcome, interrupted) = finish_or_cancel(&sweep, task, ctrl_c()).await;
                match outcome {
                    Ok(report) => print_report(&report, args.json)?,
                    Err(e) => error!("Sweep failed: {}", e),
                }
                if interrupted {
                    break;
                }
            }
            _ = ctrl_c() => break,
        }
    }

    info!("Stopping expiration sweep");
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Wait for a sweep running on the blocking pool. When `shutdown` fires
/// first, the sweep is cancelled and still awaited, so the records it already
/// handled are reported. The flag is true when `shutdown` fired.
async fn finish_or_cancel<F>(
    sweep: &ExpirationSweep,
    mut task: JoinHandle<anyhow::Result<SweepReport>>,
    shutdown: F,
) -> (anyhow::Result<SweepReport>, bool)
where
    F: Future<Output = ()>,
{
    let (joined, interrupted) = tokio::select! {
        joined = &mut task => (joined, false),
        _ = shutdown => {
            info!("Cancelling the running sweep");
            sweep.cancel();
            (task.await, true)
        }
    };
    let outcome = joined.map_err(anyhow::Error::from).and_then(|report| report);
    (outcome, interrupted)
}

fn sweep_once<T>(
    sweep: &ExpirationSweep,
    config: &FolioConfig,
    transport: &T,
    now: DateTime<Utc>,
) -> anyhow::Result<SweepReport>
where
    T: NotificationTransport + ?Sized,
{
    // Reopen every time so edits made between sweeps are seen.
    let mut store = JsonFileStore::open(&config.store.records_path)?;
    Ok(sweep.run(&mut store, transport, now)?)
}

fn print_report(report: &SweepReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    println!(
        "{} Reviewed {} records, sent {} reminders ({} already notified)",
        style("✓").green(),
        report.reviewed,
        style(report.sent.len()).bold(),
        report.already_notified
    );
    for failure in &report.failures {
        println!("  {} {}: {}", style("✗").red(), failure.id, failure.reason);
    }
    if report.cancelled {
        println!("  {}", style("cancelled").yellow());
    }
    Ok(())
}
