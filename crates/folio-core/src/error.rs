//! Error types for the folio-core library.

use thiserror::Error;

use crate::models::invoice::RecordId;

/// Main error type for the folio library.
#[derive(Error, Debug)]
pub enum FolioError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Record or blob storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Upload rejected before anything was stored.
    #[error("upload rejected: {0}")]
    Upload(#[from] UploadError),

    /// Notification delivery error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Expiration sweep error.
    #[error("sweep error: {0}")]
    Sweep(#[from] SweepError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors raised by record stores and blob stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record with this identifier exists.
    #[error("record not found: {0}")]
    NotFound(RecordId),

    /// The backing file could not be read or written.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file holds data that does not deserialize.
    #[error("corrupt store data: {0}")]
    Corrupt(String),

    /// The backing file changed since the store was opened.
    #[error("{0} was modified by another writer, reopen the store")]
    Conflict(String),

    /// A blob locator could not be resolved or released.
    #[error("blob {locator}: {reason}")]
    Blob { locator: String, reason: String },
}

/// Reasons an upload is refused.
#[derive(Error, Debug)]
pub enum UploadError {
    /// The visible title is required.
    #[error("missing title")]
    MissingTitle,

    /// The uploaded file is not a PDF.
    #[error("only PDF files are accepted: {0}")]
    NotPdf(String),

    /// The uploaded file exceeds the size limit.
    #[error("file is {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },
}

/// Errors raised while delivering a notification.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The message was rejected or could not be handed off.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Writing the message failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a whole expiration sweep.
#[derive(Error, Debug)]
pub enum SweepError {
    /// Another sweep is still in progress.
    #[error("a sweep is already running")]
    AlreadyRunning,

    /// The record set could not be listed.
    #[error("failed to list records: {0}")]
    Store(#[from] StoreError),
}

/// Result type for the folio library.
pub type Result<T> = std::result::Result<T, FolioError>;
