//! PDF text extraction module.
//!
//! The ledger only needs one linear string per document; layout, images and
//! OCR are outside its concern.

#[cfg(feature = "pdf")]
mod extractor;

#[cfg(feature = "pdf")]
pub use extractor::{PdfExtractor, PdfTextSource};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from the entire PDF, pages in reading order.
    fn extract_text(&self) -> Result<String>;

    /// Extract text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;
}

/// Produces the linear text of an uploaded document.
pub trait TextSource {
    /// Text of all pages, concatenated in reading order.
    fn document_text(&self, data: &[u8]) -> Result<String>;
}

/// Returns `data` interpreted as UTF-8 text; for documents that are already
/// plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn document_text(&self, data: &[u8]) -> Result<String> {
        Ok(String::from_utf8_lossy(data).into_owned())
    }
}

/// True when `data` starts with the PDF header.
pub fn looks_like_pdf(data: &[u8]) -> bool {
    data.starts_with(b"%PDF")
}
