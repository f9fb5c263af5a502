//! Upload path: validate, store the document, extract fields, create the
//! record.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{Result, UploadError};
use crate::invoice::{InvoiceParser, RuleBasedParser};
use crate::models::config::UploadConfig;
use crate::models::invoice::{ExtractedInvoiceFields, InvoiceRecord};
use crate::pdf::{looks_like_pdf, TextSource};
use crate::store::{BlobStore, RecordStore};

const MAX_SLUG_LEN: usize = 80;

/// An upload as received from a user.
#[derive(Debug, Clone, Default)]
pub struct NewInvoice {
    /// Visible title. Required.
    pub title: String,
    /// Original file name, if known.
    pub file_name: Option<String>,
    pub data: Vec<u8>,
    /// Address of the uploader.
    pub uploaded_by: Option<String>,
    /// Folder to file the record under.
    pub folder_name: Option<String>,
}

/// Turns uploads into stored records.
pub struct Ingestor<T, P = RuleBasedParser> {
    source: T,
    parser: P,
    limits: UploadConfig,
}

impl<T: TextSource> Ingestor<T, RuleBasedParser> {
    pub fn new(source: T, limits: UploadConfig) -> Self {
        Self {
            source,
            parser: RuleBasedParser::new(),
            limits,
        }
    }
}

impl<T: TextSource, P: InvoiceParser> Ingestor<T, P> {
    pub fn with_parser(source: T, parser: P, limits: UploadConfig) -> Self {
        Self { source, parser, limits }
    }

    fn validate(&self, upload: &NewInvoice) -> std::result::Result<(), UploadError> {
        if upload.title.trim().is_empty() {
            return Err(UploadError::MissingTitle);
        }

        let named_pdf = upload
            .file_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().ends_with(".pdf"));
        if !named_pdf && !looks_like_pdf(&upload.data) {
            let name = upload.file_name.clone().unwrap_or_else(|| "upload".to_string());
            return Err(UploadError::NotPdf(name));
        }

        if upload.data.len() > self.limits.max_bytes {
            return Err(UploadError::TooLarge {
                size: upload.data.len(),
                max: self.limits.max_bytes,
            });
        }
        Ok(())
    }

    /// Fields recovered from the document; empty when no text comes out.
    pub fn extract_fields(&self, data: &[u8]) -> ExtractedInvoiceFields {
        match self.source.document_text(data) {
            Ok(text) => {
                let result = self.parser.parse(&text);
                debug!("Missing fields after extraction: {:?}", result.missing);
                result.fields
            }
            Err(e) => {
                warn!("Text extraction failed, storing without fields: {}", e);
                ExtractedInvoiceFields::default()
            }
        }
    }

    /// Validate and store an upload.
    ///
    /// An upload is accepted even when no field can be recovered from it. The
    /// stored document is released again if the record cannot be created.
    pub fn ingest<S, B>(&self, store: &mut S, blobs: &mut B, upload: NewInvoice, now: DateTime<Utc>) -> Result<InvoiceRecord>
    where
        S: RecordStore + ?Sized,
        B: BlobStore + ?Sized,
    {
        self.validate(&upload)?;

        let title = upload.title.trim().to_string();
        let key = blob_key(&title, now);
        let locator = blobs.put(&key, &upload.data)?;

        let fields = self.extract_fields(&upload.data);

        let mut record = InvoiceRecord::new(title, locator.clone(), now).with_fields(fields);
        record.uploaded_by = upload
            .uploaded_by
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        record.folder_name = upload
            .folder_name
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        match store.insert(record) {
            Ok(record) => {
                info!(
                    "Stored record {} ({:?}) at {}",
                    record.id, record.processing_status, record.locator
                );
                Ok(record)
            }
            Err(e) => {
                if let Err(release) = blobs.release(&locator) {
                    warn!("Failed to release orphaned blob {}: {}", locator, release);
                }
                Err(e.into())
            }
        }
    }
}

fn blob_key(title: &str, now: DateTime<Utc>) -> String {
    let slug = slugify(title);
    let slug = if slug.is_empty() { "documento".to_string() } else { slug };
    format!("pdfs/{}-{}.pdf", slug, now.timestamp_millis())
}

/// Lower-case, drop everything but ASCII word characters, whitespace and
/// hyphens, turn whitespace runs into a hyphen, cap at 80 characters.
pub fn slugify(s: &str) -> String {
    let lowered = s.to_lowercase();
    let kept: String = lowered
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }

    out.chars().take(MAX_SLUG_LEN).collect()
}
