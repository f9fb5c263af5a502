//! Record maintenance - move, payment status, due date and delete.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::Args;
use console::style;

use folio_core::ledger::{delete_invoice, move_many, set_due_date, update_payment_status};
use folio_core::models::invoice::{PaymentStatus, RecordId};

use super::{load_config, open_stores};

/// Arguments for the move command.
#[derive(Args)]
pub struct MoveArgs {
    /// Record ids to move
    #[arg(required = true, value_delimiter = ',')]
    ids: Vec<RecordId>,

    /// Target folder
    #[arg(short, long, conflicts_with = "clear", required_unless_present = "clear")]
    folder: Option<String>,

    /// Remove the folder assignment instead
    #[arg(long)]
    clear: bool,
}

/// Arguments for the status command.
#[derive(Args)]
pub struct StatusArgs {
    /// Record id
    id: RecordId,

    /// New payment status (paid, pending, void, overdue)
    status: PaymentStatus,
}

/// Arguments for the due command.
#[derive(Args)]
pub struct DueArgs {
    /// Record id
    id: RecordId,

    /// Due date: YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339
    #[arg(value_parser = parse_due, conflicts_with = "clear", required_unless_present = "clear")]
    at: Option<DateTime<Utc>>,

    /// Remove the due date
    #[arg(long)]
    clear: bool,
}

/// Arguments for the delete command.
#[derive(Args)]
pub struct DeleteArgs {
    /// Record id
    id: RecordId,
}

/// Parse a due instant. A bare date means the end of that day, UTC.
pub(crate) fn parse_due(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Ok(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(23, 59, 59) {
            return Ok(dt.and_utc());
        }
    }
    Err(format!("invalid date '{}', expected YYYY-MM-DD", s))
}

pub async fn run_move(args: MoveArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (mut store, _) = open_stores(&config)?;

    let folder = if args.clear { None } else { args.folder.as_deref() };
    let report = move_many(&mut store, &args.ids, folder, Utc::now());

    println!(
        "{} Moved {} records to {}",
        style("✓").green(),
        report.moved.len(),
        folder.unwrap_or("(sin carpeta)")
    );

    if !report.is_complete() {
        eprintln!("{}", style("Failed records:").red());
        for (id, error) in &report.failed {
            eprintln!("  - {}: {}", id, error);
        }
        anyhow::bail!("{} of {} records could not be moved", report.failed.len(), args.ids.len());
    }
    Ok(())
}

pub async fn run_status(args: StatusArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (mut store, _) = open_stores(&config)?;

    let record = update_payment_status(&mut store, args.id, args.status, Utc::now())?;
    println!(
        "{} Record {} is now {}",
        style("✓").green(),
        record.id,
        record.payment_status.label()
    );
    Ok(())
}

pub async fn run_due(args: DueArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (mut store, _) = open_stores(&config)?;

    let due_at = if args.clear { None } else { args.at };
    let record = set_due_date(&mut store, args.id, due_at, Utc::now())?;

    match record.due_at {
        Some(due) => println!(
            "{} Record {} due {}",
            style("✓").green(),
            record.id,
            due.to_rfc3339()
        ),
        None => println!("{} Record {} has no due date", style("✓").green(), record.id),
    }
    Ok(())
}

pub async fn run_delete(args: DeleteArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (mut store, mut blobs) = open_stores(&config)?;

    let deleted = delete_invoice(&mut store, &mut blobs, args.id)?;
    println!(
        "{} Deleted record {} ({})",
        style("✓").green(),
        deleted.record.id,
        deleted.record.title
    );
    if let Some(error) = deleted.blob_error {
        eprintln!(
            "{} Document {} was not removed: {}",
            style("⚠").yellow(),
            deleted.record.locator,
            error
        );
    }
    Ok(())
}
