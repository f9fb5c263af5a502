//! Ingest command - upload an invoice into the ledger.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use console::style;
use tracing::info;

use folio_core::invoice::rules::format_optional_clp;
use folio_core::ledger::{resolve_folder_key, Ingestor, NewInvoice};
use folio_core::pdf::PdfTextSource;

use super::{load_config, open_stores};

/// Arguments for the ingest command.
#[derive(Args)]
pub struct IngestArgs {
    /// PDF file to upload
    #[arg(required = true)]
    input: PathBuf,

    /// Visible title of the document
    #[arg(short, long)]
    title: String,

    /// Folder to file the document under
    #[arg(short, long)]
    folder: Option<String>,

    /// Address of the uploader, used for reminders
    #[arg(long)]
    uploaded_by: Option<String>,

    /// Print the stored record as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: IngestArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let data = fs::read(&args.input)?;
    let (mut store, mut blobs) = open_stores(&config)?;
    let ingestor = Ingestor::new(PdfTextSource, config.upload.clone());

    let upload = NewInvoice {
        title: args.title,
        file_name: args
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned()),
        data,
        uploaded_by: args.uploaded_by,
        folder_name: args.folder,
    };

    let record = ingestor.ingest(&mut store, &mut blobs, upload, Utc::now())?;
    info!("Ingested {} as record {}", args.input.display(), record.id);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!(
        "{} Stored record {} in folder {}",
        style("✓").green(),
        style(record.id).bold(),
        style(resolve_folder_key(&record)).cyan()
    );
    let missing = record.fields.missing_fields();
    if missing.is_empty() {
        println!("  All fields recovered, total {}", format_optional_clp(record.fields.total_amount));
    } else {
        println!(
            "  Total {}; not recovered: {}",
            format_optional_clp(record.fields.total_amount),
            style(missing.join(", ")).yellow()
        );
    }

    Ok(())
}
