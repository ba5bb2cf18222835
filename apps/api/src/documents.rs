//! Document text extraction for uploaded files.

use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is empty")]
    Empty,

    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("document is not valid UTF-8 text")]
    NotText,
}

/// Turns an uploaded document into plain text. May return an empty string
/// when the document has no extractable text; callers decide what that means.
pub trait DocumentTextProvider: Send + Sync {
    fn extract_text(&self, document: &Bytes) -> Result<String, DocumentError>;
}

/// PDF extraction via `pdf-extract`. CPU-bound; run it on a blocking thread.
pub struct PdfTextProvider;

impl DocumentTextProvider for PdfTextProvider {
    fn extract_text(&self, document: &Bytes) -> Result<String, DocumentError> {
        if document.is_empty() {
            return Err(DocumentError::Empty);
        }
        pdf_extract::extract_text_from_mem(document)
            .map_err(|e| DocumentError::Pdf(format!("{e:?}")))
    }
}

/// Treats the upload as UTF-8 text. Used for `.txt` uploads and in tests.
pub struct PlainTextProvider;

impl DocumentTextProvider for PlainTextProvider {
    fn extract_text(&self, document: &Bytes) -> Result<String, DocumentError> {
        std::str::from_utf8(document)
            .map(str::to_string)
            .map_err(|_| DocumentError::NotText)
    }
}
