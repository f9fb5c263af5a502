//! Core library for the invoice document-to-ledger pipeline.
//!
//! This crate provides:
//! - PDF text extraction
//! - Field extraction from Chilean electronic invoices (provider, folio,
//!   issue date, net, IVA and total)
//! - A ledger of invoice records grouped into derived folders, with totals
//! - Due-date evaluation and reminder delivery

pub mod error;
pub mod expiration;
pub mod invoice;
pub mod ledger;
pub mod models;
pub mod notify;
pub mod pdf;
pub mod store;

pub use error::{FolioError, Result};
pub use expiration::{evaluate, ExpirationDecision, ExpirationPolicy, ExpirationSweep, NotificationPayload, Tier};
pub use invoice::{normalize, ExtractionResult, InvoiceExtractor, InvoiceParser, RuleBasedParser};
pub use ledger::{aggregate, recompute, resolve_folder_key, Folder, Ingestor, NewInvoice, RecordQuery};
pub use models::config::FolioConfig;
pub use models::invoice::{ExtractedInvoiceFields, InvoiceRecord, PaymentStatus, ProcessingStatus, RecordId};
pub use notify::{LogTransport, NotificationTransport, OutboxTransport};
pub use pdf::{PdfProcessor, TextSource};
#[cfg(feature = "pdf")]
pub use pdf::{PdfExtractor, PdfTextSource};
pub use store::{BlobStore, FsBlobStore, JsonFileStore, MemoryBlobStore, MemoryStore, RecordStore};
