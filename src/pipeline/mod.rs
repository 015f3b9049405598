//! Pipeline stages for PDF-to-PNG conversion.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested without the others and without `pdftoppm` installed.
//!
//! ## Data Flow
//!
//! ```text
//! encode::decode ──▶ load ──▶ [rasterizer] ──▶ collect ──▶ encode::encode
//!   (base64)        (lopdf)    (pdftoppm)     (page-N.png)   (base64)
//! ```
//!
//! 1. [`encode`]  — base64 in both directions
//! 2. [`load`]    — count pages; runs in `spawn_blocking`
//! 3. [`collect`] — read `<prefix>-<N>.png` files back in page order
//!
//! The rasterizer step itself lives in [`crate::rasterize`] behind the
//! [`crate::rasterize::PdfConverter`] trait.

pub mod collect;
pub mod encode;
pub mod load;
