//! Configuration types for the converter and the HTTP server.
//!
//! Converter behaviour is controlled through [`ConverterConfig`], built via
//! [`ConverterConfigBuilder`]. Only deployment concerns live here: where the
//! rasterizer binary is, how long it may run, and where scratch files go.
//! Output quality (DPI and pixel scale) is deliberately *not* configurable;
//! see [`crate::rasterize::RASTER_DPI`] and [`crate::rasterize::RASTER_SCALE_TO`].

use crate::error::ConvertError;
use std::path::PathBuf;
use std::time::Duration;

/// Default rasterizer executable, resolved through `PATH`.
pub const DEFAULT_PROGRAM: &str = "pdftoppm";

/// Configuration for the `pdftoppm`-backed converter.
///
/// # Example
/// ```rust
/// use edgequake_pdf2png::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .program("/usr/bin/pdftoppm")
///     .timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout().as_secs(), 60);
/// ```
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Rasterizer executable. Default: `pdftoppm` (looked up on `PATH`).
    pub program: PathBuf,

    /// Upper bound on a single rasterizer invocation, in seconds. Default: 120.
    ///
    /// A hung `pdftoppm` would otherwise hold the request open forever.
    /// When the limit is hit the child process is killed.
    pub timeout_secs: u64,

    /// Parent directory for per-request scratch directories.
    /// If None, uses the OS temp directory.
    pub temp_root: Option<PathBuf>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            timeout_secs: 120,
            temp_root: None,
        }
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.program = program.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn temp_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_root = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, ConvertError> {
        let c = &self.config;
        if c.program.as_os_str().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "Rasterizer program must not be empty".into(),
            ));
        }
        if c.timeout_secs == 0 {
            return Err(ConvertError::InvalidConfig(
                "Timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Listener and request-size settings for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to. Default: 0.0.0.0.
    pub host: String,

    /// Port to listen on. Default: 7071.
    pub port: u16,

    /// Maximum accepted request body in bytes. Default: 64 MiB.
    ///
    /// Base64 inflates a PDF by a third, so this admits documents of roughly
    /// 48 MiB.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7071,
            body_limit_bytes: 64 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
