//! CLI application for invoice ledgers.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, extract, ingest, ledger, records, sweep};

/// Folio - Invoice ledger with field extraction and expiration reminders
#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract invoice fields from PDF or text files
    Extract(extract::ExtractArgs),

    /// Upload an invoice into the ledger
    Ingest(ingest::IngestArgs),

    /// Show folders with their totals
    Folders(ledger::FoldersArgs),

    /// List records
    List(ledger::ListArgs),

    /// Show totals for a view or a selection
    Totals(ledger::TotalsArgs),

    /// Move records to a folder
    Move(records::MoveArgs),

    /// Set the payment status of a record
    Status(records::StatusArgs),

    /// Set or clear the due date of a record
    Due(records::DueArgs),

    /// Delete a record and its document
    Delete(records::DeleteArgs),

    /// Send expiration reminders
    Sweep(sweep::SweepArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Extract(args) => extract::run(args).await,
        Commands::Ingest(args) => ingest::run(args, config_path).await,
        Commands::Folders(args) => ledger::run_folders(args, config_path).await,
        Commands::List(args) => ledger::run_list(args, config_path).await,
        Commands::Totals(args) => ledger::run_totals(args, config_path).await,
        Commands::Move(args) => records::run_move(args, config_path).await,
        Commands::Status(args) => records::run_status(args, config_path).await,
        Commands::Due(args) => records::run_due(args, config_path).await,
        Commands::Delete(args) => records::run_delete(args, config_path).await,
        Commands::Sweep(args) => sweep::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
