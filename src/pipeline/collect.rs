//! Output collection: map rasterizer output files back to page numbers.
//!
//! ## File naming contract
//!
//! `pdftoppm -png <input> <prefix>` writes one file per page named
//! `<prefix>-<N>.png`. Poppler zero-pads `N` to the number of digits in the
//! last page number, so a 9-page document yields `page-1.png … page-9.png`
//! while a 12-page document yields `page-01.png … page-12.png`.
//!
//! The expected name is derived from the page count the PDF loader reported.
//! The unpadded name is also checked in case poppler's page count disagrees
//! with ours in digit width.

use crate::document::PdfPage;
use crate::error::ConvertError;
use crate::pipeline::encode::encode_image;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-name prefix handed to the rasterizer inside the scratch directory.
pub const OUTPUT_PREFIX: &str = "page";

/// Number of decimal digits in `n` (`n = 0` has one digit).
fn digits(n: usize) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// Candidate paths for `page`, most likely first.
pub fn expected_image_paths(dir: &Path, page: usize, page_count: usize) -> Vec<PathBuf> {
    let width = digits(page_count);
    let padded = dir.join(format!("{OUTPUT_PREFIX}-{page:0width$}.png"));
    let plain = dir.join(format!("{OUTPUT_PREFIX}-{page}.png"));
    if padded == plain {
        vec![padded]
    } else {
        vec![padded, plain]
    }
}

/// Read every expected page image from `dir`, in page order.
///
/// Pages with no output file are skipped. Fails with
/// [`ConvertError::NoImagesGenerated`] when nothing was found at all.
pub async fn collect_pages(dir: &Path, page_count: usize) -> Result<Vec<PdfPage>, ConvertError> {
    let mut pages = Vec::with_capacity(page_count);

    for page_number in 1..=page_count {
        let mut found = None;
        for candidate in expected_image_paths(dir, page_number, page_count) {
            if tokio::fs::try_exists(&candidate)
                .await
                .map_err(|e| ConvertError::io("probing page image", e))?
            {
                found = Some(candidate);
                break;
            }
        }

        let Some(path) = found else {
            debug!("No image for page {}, skipping", page_number);
            continue;
        };

        let png = tokio::fs::read(&path)
            .await
            .map_err(|e| ConvertError::io("reading page image", e))?;
        debug!("Collected page {} ({} bytes)", page_number, png.len());

        pages.push(PdfPage {
            page_number,
            image_content: encode_image(&png),
        });
    }

    if pages.is_empty() {
        return Err(ConvertError::NoImagesGenerated);
    }
    Ok(pages)
}
