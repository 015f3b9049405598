//! PDF loading: parse raw bytes just far enough to count pages.
//!
//! ## Why spawn_blocking?
//!
//! `lopdf` parses the whole cross-reference table and object graph
//! synchronously. For large documents that is tens of milliseconds of CPU
//! work, which must not run on a Tokio worker thread.

use crate::error::ConvertError;
use lopdf::Document;
use tracing::{debug, info};

/// Parse `bytes` as a PDF and return them together with the page count.
///
/// The buffer moves into the blocking task and comes back out unchanged, so
/// the payload is never copied. A document with zero pages is reported as a
/// count of 0; rejecting it is the caller's decision.
pub async fn page_count(bytes: Vec<u8>) -> Result<(Vec<u8>, usize), ConvertError> {
    tokio::task::spawn_blocking(move || {
        let pages = page_count_blocking(&bytes)?;
        Ok::<_, ConvertError>((bytes, pages))
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("PDF load task panicked: {}", e)))?
}

/// Blocking implementation of page counting.
pub fn page_count_blocking(bytes: &[u8]) -> Result<usize, ConvertError> {
    debug!("Loading PDF from {} bytes", bytes.len());
    let document = Document::load_mem(bytes).map_err(|e| ConvertError::InvalidPdf {
        detail: e.to_string(),
    })?;
    let pages = document.get_pages().len();
    info!("PDF loaded: {} pages", pages);
    Ok(pages)
}
