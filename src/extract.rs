//! Per-page text extraction for source files.
//!
//! Sources supply bytes + content-type; this module returns page texts in
//! reading order. PDFs are split by the PDF's own page tree; plain-text
//! files are split on form feeds (`\x0c`), the page separator written by
//! `pdftotext` and most OCR exporters.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use thiserror::Error;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

const PAGE_BREAK: char = '\x0c';

/// Extraction error. Never a panic; the source records the document as
/// unreadable and the indexer skips it.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("no extractable text")]
    NoText,
}

/// Content type inferred from the file extension.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(MIME_PDF),
        "txt" | "text" | "md" => Some(MIME_TEXT),
        _ => None,
    }
}

/// Extract page texts (page 1 first). Fails when no page has any text.
pub fn extract_pages(bytes: &[u8], content_type: &str) -> Result<Vec<String>, ExtractError> {
    let pages = match content_type {
        MIME_PDF => extract_pdf(bytes)?,
        MIME_TEXT => split_text_pages(&String::from_utf8_lossy(bytes)),
        _ => {
            return Err(ExtractError::UnsupportedContentType(
                content_type.to_string(),
            ))
        }
    };

    if pages.iter().all(|p| p.trim().is_empty()) {
        return Err(ExtractError::NoText);
    }
    Ok(pages)
}

/// `pdf_extract` panics on some structurally valid but malformed PDFs
/// (e.g. a Type0 font without `/DescendantFonts`); those become errors too.
fn extract_pdf(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    match catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem_by_pages(bytes))) {
        Ok(result) => result.map_err(|e| ExtractError::Pdf(e.to_string())),
        Err(payload) => Err(ExtractError::Pdf(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("parser panicked: {}", detail)
}

/// Split on form feeds. A trailing form feed does not open an extra page.
fn split_text_pages(text: &str) -> Vec<String> {
    let body = text.strip_suffix(PAGE_BREAK).unwrap_or(text);
    body.split(PAGE_BREAK).map(str::to_string).collect()
}
