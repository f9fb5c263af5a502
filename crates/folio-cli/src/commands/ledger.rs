//! Ledger views - folders, record listings and totals.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;

use folio_core::invoice::rules::{format_clp, format_optional_clp};
use folio_core::ledger::{aggregate, recompute, resolve_folder_key, RecordQuery, SortOrder, StatusSummary, YearMonth};
use folio_core::models::invoice::{InvoiceRecord, PaymentStatus, RecordId};
use folio_core::store::RecordStore;

use super::{load_config, open_stores};

/// Filters shared by the ledger views.
#[derive(Args)]
pub struct QueryArgs {
    /// Only records in this folder
    #[arg(long)]
    folder: Option<String>,

    /// Only records with this payment status (paid, pending, void, overdue)
    #[arg(long)]
    status: Option<PaymentStatus>,

    /// Case-insensitive search over title, folio and provider
    #[arg(short, long)]
    search: Option<String>,

    /// First upload month, YYYY-MM
    #[arg(long)]
    from: Option<YearMonth>,

    /// Last upload month, YYYY-MM
    #[arg(long)]
    to: Option<YearMonth>,

    /// Sort order (date-desc, date-asc, amount-desc, amount-asc)
    #[arg(long, default_value = "date-desc")]
    sort: SortOrder,
}

impl QueryArgs {
    fn query(&self) -> RecordQuery {
        RecordQuery {
            folder: self.folder.clone(),
            status: self.status,
            search: self.search.clone(),
            month_from: self.from,
            month_to: self.to,
            sort: self.sort,
        }
    }
}

/// Arguments for the folders command.
#[derive(Args)]
pub struct FoldersArgs {
    #[command(flatten)]
    query: QueryArgs,

    /// Write the folders to a CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    query: QueryArgs,

    /// Write the records to a CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// Arguments for the totals command.
#[derive(Args)]
pub struct TotalsArgs {
    #[command(flatten)]
    query: QueryArgs,

    /// Selected record ids; when any is in view, totals cover only them
    #[arg(long, value_delimiter = ',')]
    select: Vec<RecordId>,

    /// Print JSON
    #[arg(long)]
    json: bool,
}

fn load_records(config_path: Option<&str>) -> anyhow::Result<Vec<InvoiceRecord>> {
    let config = load_config(config_path)?;
    let (store, _) = open_stores(&config)?;
    Ok(store.list()?)
}

pub async fn run_folders(args: FoldersArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let records = load_records(config_path)?;
    let view = args.query.query().apply(&records);
    let folders = aggregate(&view);

    if let Some(path) = &args.csv {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(["folder", "documents", "net", "tax", "total", "latest_upload"])?;
        for folder in &folders {
            wtr.write_record([
                folder.key.as_str(),
                &folder.totals.count.to_string(),
                &folder.totals.net.to_string(),
                &folder.totals.tax.to_string(),
                &folder.totals.total.to_string(),
                &folder.latest_created_at.to_rfc3339(),
            ])?;
        }
        wtr.flush()?;
        println!("{} Wrote {} folders to {}", style("✓").green(), folders.len(), path.display());
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&folders)?);
        return Ok(());
    }

    if folders.is_empty() {
        println!("{} No records", style("ℹ").blue());
        return Ok(());
    }

    println!(
        "{:<32} {:>5} {:>16} {:>14} {:>16}",
        style("Carpeta").bold(),
        style("Docs").bold(),
        style("Neto").bold(),
        style("IVA").bold(),
        style("Total").bold()
    );
    for folder in &folders {
        println!(
            "{:<32} {:>5} {:>16} {:>14} {:>16}",
            folder.key,
            folder.totals.count,
            format_clp(folder.totals.net),
            format_clp(folder.totals.tax),
            format_clp(folder.totals.total)
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct ListRow<'a> {
    folder: String,
    #[serde(flatten)]
    record: &'a InvoiceRecord,
}

pub async fn run_list(args: ListArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let records = load_records(config_path)?;
    let view = args.query.query().apply(&records);

    if let Some(path) = &args.csv {
        write_records_csv(csv::Writer::from_path(path)?, &view)?;
        println!("{} Wrote {} records to {}", style("✓").green(), view.len(), path.display());
        return Ok(());
    }

    if args.json {
        let rows: Vec<ListRow<'_>> = view
            .iter()
            .map(|record| ListRow {
                folder: resolve_folder_key(record),
                record,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if view.is_empty() {
        println!("{} No records", style("ℹ").blue());
        return Ok(());
    }

    for record in &view {
        println!(
            "{:>5}  {}  {:<24} {:<28} {:>10} {:>14}  {}",
            style(record.id).bold(),
            record.created_at.format("%Y-%m-%d"),
            resolve_folder_key(record),
            record.title,
            record.fields.folio.as_deref().unwrap_or("—"),
            format_optional_clp(record.fields.total_amount),
            status_label(record.payment_status)
        );
    }
    Ok(())
}

fn status_label(status: PaymentStatus) -> console::StyledObject<&'static str> {
    let label = status.label();
    match status {
        PaymentStatus::Paid => style(label).green(),
        PaymentStatus::Pending => style(label).yellow(),
        PaymentStatus::Overdue => style(label).red(),
        PaymentStatus::Void => style(label).dim(),
    }
}

fn write_records_csv<W: io::Write>(mut wtr: csv::Writer<W>, records: &[InvoiceRecord]) -> anyhow::Result<()> {
    wtr.write_record([
        "id",
        "title",
        "folder",
        "folio",
        "provider",
        "payment_status",
        "net_amount",
        "tax_amount",
        "total_amount",
        "issue_date",
        "due_at",
        "created_at",
    ])?;

    for record in records {
        let f = &record.fields;
        wtr.write_record([
            record.id.to_string().as_str(),
            &record.title,
            &resolve_folder_key(record),
            f.folio.as_deref().unwrap_or(""),
            f.provider.as_deref().unwrap_or(""),
            record.payment_status.label(),
            &f.net_amount.map(|d| d.to_string()).unwrap_or_default(),
            &f.tax_amount.map(|d| d.to_string()).unwrap_or_default(),
            &f.total_amount.map(|d| d.to_string()).unwrap_or_default(),
            &f.issue_date.map(|d| d.to_string()).unwrap_or_default(),
            &record.due_at.map(|d| d.to_rfc3339()).unwrap_or_default(),
            &record.created_at.to_rfc3339(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct TotalsReport {
    from_selection: bool,
    documents: usize,
    net: rust_decimal::Decimal,
    tax: rust_decimal::Decimal,
    total: rust_decimal::Decimal,
    status: StatusSummary,
}

pub async fn run_totals(args: TotalsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let records = load_records(config_path)?;
    let view = args.query.query().apply(&records);

    let selection: HashSet<RecordId> = args.select.iter().copied().collect();
    let aggregate = recompute(&view, &selection);
    let basis: Vec<InvoiceRecord> = if aggregate.from_selection {
        view.iter().filter(|r| selection.contains(&r.id)).cloned().collect()
    } else {
        view
    };

    let report = TotalsReport {
        from_selection: aggregate.from_selection,
        documents: aggregate.totals.count,
        net: aggregate.totals.net,
        tax: aggregate.totals.tax,
        total: aggregate.totals.total,
        status: StatusSummary::of(&basis),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let scope = if report.from_selection { "selección" } else { "vista" };
    println!("{} {} documentos ({})", style("ℹ").blue(), report.documents, scope);
    println!("  Monto Neto: {}", format_clp(report.net));
    println!("  IVA:        {}", format_clp(report.tax));
    println!("  Total:      {}", style(format_clp(report.total)).bold());
    println!(
        "  {} pagadas, {} pendientes, {} vencidas, {} anuladas",
        style(report.status.paid).green(),
        style(report.status.pending).yellow(),
        style(report.status.overdue).red(),
        report.status.void
    );
    Ok(())
}
