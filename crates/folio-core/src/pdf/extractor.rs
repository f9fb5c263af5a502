//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::debug;

use super::{PdfProcessor, Result, TextSource};
use crate::error::PdfError;

/// PDF text extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))
    }

    /// Page texts joined with line breaks, used when whole-document
    /// extraction fails on a malformed font or content stream.
    fn extract_text_by_pages(&self) -> Result<String> {
        let mut parts = Vec::new();
        for page in 1..=self.page_count() {
            parts.push(self.extract_page_text(page)?);
        }
        Ok(parts.join("\n"))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        self.document()?;
        match pdf_extract::extract_text_from_mem(&self.raw_data) {
            Ok(text) => Ok(text),
            Err(e) => {
                debug!("pdf-extract failed ({}), extracting page by page", e);
                self.extract_text_by_pages()
                    .map_err(|_| PdfError::TextExtraction(e.to_string()))
            }
        }
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self.document()?;
        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }
        doc.extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

/// [`TextSource`] backed by [`PdfExtractor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextSource;

impl TextSource for PdfTextSource {
    fn document_text(&self, data: &[u8]) -> Result<String> {
        let mut extractor = PdfExtractor::new();
        extractor.load(data)?;
        extractor.extract_text()
    }
}
