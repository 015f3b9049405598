//! Value types flowing through a conversion.

use crate::error::ConvertError;
use serde::Serialize;

/// A decoded PDF together with its page count.
///
/// Built once per request by [`crate::convert::ConvertPdfToImages`] and
/// dropped after conversion. `page_count` is always ≥ 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDocument {
    content: Vec<u8>,
    page_count: usize,
}

impl PdfDocument {
    /// Pair raw PDF bytes with the page count reported by the loader.
    ///
    /// Returns [`ConvertError::NoPages`] when `page_count` is zero.
    pub fn new(content: Vec<u8>, page_count: usize) -> Result<Self, ConvertError> {
        if page_count == 0 {
            return Err(ConvertError::NoPages);
        }
        Ok(Self {
            content,
            page_count,
        })
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }
}

/// One rendered page: 1-based page number and base64 PNG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfPage {
    pub page_number: usize,
    /// PNG bytes, standard base64 with padding.
    pub image_content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_page_document_is_rejected() {
        let err = PdfDocument::new(b"%PDF-1.7".to_vec(), 0).unwrap_err();
        assert!(matches!(err, ConvertError::NoPages));
    }

    #[test]
    fn page_serialises_camel_case() {
        let page = PdfPage {
            page_number: 2,
            image_content: "iVBORw0KGgo=".into(),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pageNumber"], 2);
        assert_eq!(json["imageContent"], "iVBORw0KGgo=");
    }
}
