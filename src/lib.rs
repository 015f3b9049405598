//! # edgequake-pdf2png
//!
//! Convert base64-encoded PDF documents into per-page PNG images, served over
//! HTTP or used as a library.
//!
//! ## Why shell out?
//!
//! Rasterising PDF correctly (fonts, transparency, broken producers) is a
//! job for a mature renderer. This crate hands that job to poppler's
//! `pdftoppm` and keeps its own code to the plumbing around it: decoding the
//! payload, counting pages, running the tool in a private scratch directory,
//! and mapping output files back to page numbers.
//!
//! ## Pipeline Overview
//!
//! ```text
//! base64 PDF
//!  │
//!  ├─ 1. Decode   base64 → bytes (whitespace-tolerant)
//!  ├─ 2. Load     count pages with lopdf (spawn_blocking); 0 pages is fatal
//!  ├─ 3. Render   pdftoppm -png -r 300 -scale-to 2480 in a scratch dir
//!  ├─ 4. Collect  page-<N>.png → PdfPage { page_number, base64 PNG }
//!  └─ 5. Cleanup  scratch dir removed on every exit path
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2png::{ConvertPdfToImages, PdftoppmConverter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let use_case = ConvertPdfToImages::new(Arc::new(PdftoppmConverter::default()));
//!     let pdf_base64 = std::fs::read_to_string("document.pdf.b64")?;
//!     for page in use_case.execute(&pdf_base64).await? {
//!         println!("page {}: {} base64 chars", page.page_number, page.image_content.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2png` binary (clap + anyhow + tracing-subscriber) |
//!
//! ## Runtime requirement
//!
//! `pdftoppm` must be installed (`apt install poppler-utils`,
//! `brew install poppler`). Point at a specific binary with
//! [`ConverterConfig::program`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod rasterize;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConverterConfig, ConverterConfigBuilder, ServerConfig};
pub use convert::{convert_file_to_dir, ConvertPdfToImages};
pub use document::{PdfDocument, PdfPage};
pub use error::ConvertError;
pub use rasterize::{PdfConverter, PdftoppmConverter, RASTER_DPI, RASTER_SCALE_TO};
pub use server::{router, serve, AppState, CONVERT_ROUTE};
