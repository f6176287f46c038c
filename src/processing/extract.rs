//! PDF text extraction.

use std::panic::AssertUnwindSafe;
use std::path::Path;
use thiserror::Error;

/// Errors raised while turning a file into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// File bytes could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// File was read but its contents could not be parsed.
    #[error("failed to extract text from {path}: {message}")]
    Parse {
        /// Path whose contents failed to parse.
        path: String,
        /// Parser diagnostic.
        message: String,
    },
}

/// Turns a document on disk into plain text.
pub trait TextExtractor: Send + Sync {
    /// Extract the full text of the file at `path`.
    fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Extractor backed by `pdf-extract`, one page at a time.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Construct a new extractor.
    pub const fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let bytes = std::fs::read(path).map_err(|source| ExtractionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        // pdf-extract panics on some malformed fonts and resources.
        let pages = std::panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        }))
        .map_err(|panic| ExtractionError::Parse {
            path: path.display().to_string(),
            message: panic_message(panic.as_ref()),
        })?
        .map_err(|err| ExtractionError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        tracing::debug!(path = %path.display(), pages = pages.len(), "Extracted PDF text");
        Ok(join_pages(pages))
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("extractor panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("extractor panicked: {message}")
    } else {
        "extractor panicked".to_string()
    }
}

/// Concatenate page texts in order; pages without text contribute nothing.
pub(crate) fn join_pages<I>(pages: I) -> String
where
    I: IntoIterator<Item = String>,
{
    pages.into_iter().collect()
}

/// Whether `file_name` ends in `.pdf`, ignoring case.
pub fn is_pdf_candidate(file_name: &str) -> bool {
    file_name.to_lowercase().ends_with(".pdf")
}

/// Single-page PDF with a valid cross-reference table, for extraction tests.
///
/// Object 5 is a Helvetica font; `resources` decides whether the page can reach it.
#[cfg(test)]
pub(crate) fn single_page_pdf(resources: &str, content: &str) -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources {resources} /Contents 4 0 R >>"
        ),
        format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{body}\nendobj\n", index + 1));
    }
    let xref = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.into_bytes()
}

/// Resources exposing the Helvetica font as `/F1`.
#[cfg(test)]
pub(crate) const HELVETICA_RESOURCES: &str = "<< /Font << /F1 5 0 R >> >>";

/// Content stream drawing `Hello world` with `/F1`.
#[cfg(test)]
pub(crate) const HELLO_CONTENT: &str = "BT /F1 12 Tf 72 720 Td (Hello world) Tj ET";
