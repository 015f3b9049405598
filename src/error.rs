//! Error types for the edgequake-pdf2png library.
//!
//! A single fatal error type, [`ConvertError`], covers every way a conversion
//! can stop. Variants are grouped by where the failure originates:
//!
//! * **Environment** — the rasterizer binary is missing or not executable.
//! * **Document** — the payload is not base64, not a PDF, or has no pages.
//! * **Process** — `pdftoppm` could not be launched, exited non-zero, or hung.
//! * **Output** — the rasterizer ran but left no page images behind.
//!
//! A page whose image is missing is *not* an error: it is dropped from the
//! result as long as at least one other page rendered.

use std::process::ExitStatus;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2png library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Environment errors ────────────────────────────────────────────────
    /// The rasterizer did not answer its version check.
    #[error("pdftoppm is not available: {detail}\nInstall poppler-utils or set PDF2PNG_PDFTOPPM.")]
    ToolUnavailable { detail: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// The request payload is not valid base64.
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// The payload is a JSON value that cannot hold base64 text.
    #[error("Invalid base64 payload: expected a string, got {found}")]
    PayloadNotText { found: &'static str },

    /// The decoded bytes could not be parsed as a PDF.
    #[error("Failed to parse PDF document: {detail}")]
    InvalidPdf { detail: String },

    /// The PDF parsed but contains zero pages.
    #[error("PDF has no pages")]
    NoPages,

    // ── Process errors ────────────────────────────────────────────────────
    /// The rasterizer process could not be spawned.
    #[error("PDF conversion failed: could not launch '{program}': {source}")]
    RasterizerLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The rasterizer exited with a non-zero status.
    #[error("PDF conversion failed: pdftoppm exited with {status}: {stderr}")]
    RasterizerFailed { status: ExitStatus, stderr: String },

    /// The rasterizer did not finish in time and was killed.
    #[error("PDF conversion failed: pdftoppm timed out after {secs}s")]
    RasterizerTimeout { secs: u64 },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The rasterizer succeeded but no expected page image exists.
    #[error("No images were generated from the PDF")]
    NoImagesGenerated,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Temporary directory or file handling failed.
    #[error("I/O error while {action}: {source}")]
    Io {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Wrap an I/O error with a short description of what was being done.
    pub fn io(action: &'static str, source: std::io::Error) -> Self {
        ConvertError::Io { action, source }
    }

    /// True when the failure is about the host environment rather than the
    /// submitted document.
    pub fn is_environment(&self) -> bool {
        matches!(self, ConvertError::ToolUnavailable { .. })
    }
}
