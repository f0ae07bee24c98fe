//! Plain-text extraction for uploaded documents.
//!
//! The reference deployment accepts PDF; plain text passes through for
//! demos and tests. Extraction never panics — a malformed document surfaces
//! as [`Error::Extraction`] and the upload boundary rolls back.

use crate::error::{Error, Result};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

/// Extract plain UTF-8 text from document bytes.
pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<String> {
    match content_type {
        MIME_PDF => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| Error::Extraction(e.to_string()))
        }
        MIME_TEXT => String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Extraction(e.to_string())),
        other => Err(Error::Validation(format!(
            "unsupported content type: {}",
            other
        ))),
    }
}
