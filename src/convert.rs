//! The conversion use case: base64 PDF in, ordered page images out.
//!
//! [`ConvertPdfToImages`] knows nothing about HTTP. It decodes, counts pages,
//! and delegates rendering to whatever [`PdfConverter`] it was built with, so
//! the same code path serves the HTTP handler, the CLI, and tests.

use crate::document::{PdfDocument, PdfPage};
use crate::error::ConvertError;
use crate::pipeline::{encode, load};
use crate::rasterize::PdfConverter;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Orchestrates decode → load → convert.
#[derive(Clone)]
pub struct ConvertPdfToImages {
    converter: Arc<dyn PdfConverter>,
}

impl ConvertPdfToImages {
    pub fn new(converter: Arc<dyn PdfConverter>) -> Self {
        Self { converter }
    }

    pub fn converter(&self) -> &Arc<dyn PdfConverter> {
        &self.converter
    }

    /// Convert a base64-encoded PDF into base64 PNG pages.
    ///
    /// # Errors
    /// - [`ConvertError::InvalidBase64`] if the payload does not decode
    /// - [`ConvertError::InvalidPdf`] if the bytes are not a PDF
    /// - [`ConvertError::NoPages`] if the PDF has zero pages; the converter
    ///   is not invoked
    /// - anything the converter returns, unchanged
    pub async fn execute(&self, pdf_base64: &str) -> Result<Vec<PdfPage>, ConvertError> {
        let bytes = encode::decode_base64(pdf_base64)?;
        self.execute_bytes(bytes).await
    }

    /// Same as [`execute`](Self::execute) for callers that already hold raw bytes.
    pub async fn execute_bytes(&self, bytes: Vec<u8>) -> Result<Vec<PdfPage>, ConvertError> {
        let start = Instant::now();
        let (bytes, page_count) = load::page_count(bytes).await?;
        let pdf = PdfDocument::new(bytes, page_count)?;

        let pages = self.converter.convert_to_images(&pdf).await?;
        info!(
            "Conversion complete: {}/{} pages, {}ms total",
            pages.len(),
            page_count,
            start.elapsed().as_millis()
        );
        Ok(pages)
    }
}

/// Convert a local PDF file and write each page to `out_dir/page-<N>.png`.
///
/// Uses atomic writes (temp file + rename) so a reader never sees a partial
/// PNG. Returns the paths written, in page order.
pub async fn convert_file_to_dir(
    use_case: &ConvertPdfToImages,
    input: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
) -> Result<Vec<std::path::PathBuf>, ConvertError> {
    let input = input.as_ref();
    let out_dir = out_dir.as_ref();
    info!("Starting conversion: {}", input.display());

    let bytes = tokio::fs::read(input)
        .await
        .map_err(|e| ConvertError::io("reading input PDF", e))?;
    let pages = use_case.execute_bytes(bytes).await?;

    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|e| ConvertError::io("creating output directory", e))?;

    let mut written = Vec::with_capacity(pages.len());
    for page in &pages {
        let png = encode::decode_base64(&page.image_content)?;
        let path = out_dir.join(format!("page-{}.png", page.page_number));
        let tmp_path = path.with_extension("png.tmp");
        tokio::fs::write(&tmp_path, &png)
            .await
            .map_err(|e| ConvertError::io("writing page image", e))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| ConvertError::io("renaming page image", e))?;
        written.push(path);
    }
    Ok(written)
}
