//! Turns an uploaded document or pasted text into plain resume text.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Where the resume text comes from.
#[derive(Debug, Clone)]
pub enum ResumeSource {
    Pdf(Bytes),
    Text(String),
}

/// Extracts plain text from the source. Pasted text passes through after
/// whitespace normalization; PDFs are parsed on the blocking pool.
pub async fn extract_text(source: ResumeSource) -> Result<String, AppError> {
    let raw = match source {
        ResumeSource::Text(text) => text,
        ResumeSource::Pdf(bytes) => {
            let byte_len = bytes.len();
            // pdf-extract can panic on malformed input; a panicked task is a parse failure.
            let text = tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
                .await
                .map_err(|e| {
                    if e.is_panic() {
                        AppError::Extraction("the PDF could not be parsed".to_string())
                    } else {
                        AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}"))
                    }
                })??;
            debug!("Extracted {} chars from {} byte PDF", text.len(), byte_len);
            text
        }
    };
    Ok(normalize_whitespace(&raw))
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, AppError> {
    if bytes.is_empty() {
        return Err(AppError::Extraction("the uploaded file is empty".to_string()));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(AppError::Extraction(
            "the uploaded file is not a PDF document".to_string(),
        ));
    }

    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        warn!("pdf-extract failed: {e}");
        AppError::Extraction(format!("the PDF could not be parsed ({e})"))
    })?;

    if text.trim().is_empty() {
        return Err(AppError::Extraction(
            "no text found in the PDF; scanned documents are not supported".to_string(),
        ));
    }
    Ok(text)
}

/// Trims trailing whitespace on each line, drops form feeds, and collapses
/// runs of blank lines to a single blank line.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;

    for line in text.lines() {
        let line = line.replace('\u{c}', "");
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue;
            }
            out.push('\n');
        } else {
            blank_run = 0;
            out.push_str(line);
            out.push('\n');
        }
    }

    out.trim_end().to_string()
}
