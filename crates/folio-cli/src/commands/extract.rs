//! Extract command - recover invoice fields from one or many files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, warn};

use folio_core::invoice::rules::{format_optional_clp, format_long_date};
use folio_core::invoice::{InvoiceParser, RuleBasedParser};
use folio_core::models::invoice::ExtractedInvoiceFields;
use folio_core::pdf::{PdfTextSource, PlainTextSource, TextSource};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file or glob pattern (PDF or plain text)
    #[arg(required = true)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per file
    Csv,
    /// Plain text summary
    Text,
}

/// Result of extracting a single file.
#[derive(Serialize)]
struct FileResult {
    file: String,
    #[serde(flatten)]
    fields: ExtractedInvoiceFields,
    missing: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run(args: ExtractArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    let files = expand_input(&args.input)?;
    debug!("Extracting {} files", files.len());

    let pb = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let parser = RuleBasedParser::new();
    let mut results = Vec::with_capacity(files.len());

    for path in &files {
        let file = path.display().to_string();
        match extract_file(path, &parser) {
            Ok((fields, missing)) => results.push(FileResult {
                file,
                fields,
                missing,
                error: None,
            }),
            Err(e) if args.continue_on_error => {
                warn!("Failed to extract {}: {}", file, e);
                results.push(FileResult {
                    file,
                    fields: ExtractedInvoiceFields::default(),
                    missing: Vec::new(),
                    error: Some(e.to_string()),
                });
            }
            Err(e) => anyhow::bail!("Failed to extract {}: {}", file, e),
        }
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let output = match args.format {
        OutputFormat::Json if results.len() == 1 => serde_json::to_string_pretty(&results[0])?,
        OutputFormat::Json => serde_json::to_string_pretty(&results)?,
        OutputFormat::Csv => format_csv(&results)?,
        OutputFormat::Text => results.iter().map(format_text).collect::<Vec<_>>().join("\n"),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Extraction finished in {:?}", start.elapsed());
    Ok(())
}

fn expand_input(input: &str) -> anyhow::Result<Vec<PathBuf>> {
    let direct = Path::new(input);
    if direct.is_file() {
        return Ok(vec![direct.to_path_buf()]);
    }

    let files: Vec<PathBuf> = glob(input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", input);
    }
    Ok(files)
}

fn extract_file(path: &Path, parser: &RuleBasedParser) -> anyhow::Result<(ExtractedInvoiceFields, Vec<&'static str>)> {
    let data = fs::read(path)?;
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        || folio_core::pdf::looks_like_pdf(&data);

    let text = if is_pdf {
        PdfTextSource.document_text(&data)?
    } else {
        PlainTextSource.document_text(&data)?
    };

    let result = parser.parse(&text);
    debug!(
        "{}: {} missing fields in {}ms",
        path.display(),
        result.missing.len(),
        result.processing_time_ms
    );
    Ok((result.fields, result.missing))
}

fn format_csv(results: &[FileResult]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "file",
        "provider",
        "folio",
        "issue_date",
        "net_amount",
        "tax_amount",
        "total_amount",
        "error",
    ])?;

    for result in results {
        let f = &result.fields;
        wtr.write_record([
            result.file.as_str(),
            f.provider.as_deref().unwrap_or(""),
            f.folio.as_deref().unwrap_or(""),
            &f.issue_date.map(|d| d.to_string()).unwrap_or_default(),
            &f.net_amount.map(|d| d.to_string()).unwrap_or_default(),
            &f.tax_amount.map(|d| d.to_string()).unwrap_or_default(),
            &f.total_amount.map(|d| d.to_string()).unwrap_or_default(),
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &FileResult) -> String {
    let f = &result.fields;
    let mut output = String::new();

    output.push_str(&format!("{}\n", result.file));
    if let Some(error) = &result.error {
        output.push_str(&format!("  Error: {}\n", error));
        return output;
    }

    output.push_str(&format!("  Proveedor: {}\n", f.provider.as_deref().unwrap_or("—")));
    output.push_str(&format!("  Folio:     {}\n", f.folio.as_deref().unwrap_or("—")));
    output.push_str(&format!(
        "  Emisión:   {}\n",
        f.issue_date.map(format_long_date).unwrap_or_else(|| "—".to_string())
    ));
    output.push_str(&format!("  Neto:      {}\n", format_optional_clp(f.net_amount)));
    output.push_str(&format!("  IVA:       {}\n", format_optional_clp(f.tax_amount)));
    output.push_str(&format!("  Total:     {}\n", format_optional_clp(f.total_amount)));
    output
}
