//! CLI binary for edgequake-pdf2png.
//!
//! A thin shim over the library crate: `serve` runs the HTTP endpoint,
//! `convert` runs the same use case against a local file.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdf2png::server::ConvertResponse;
use edgequake_pdf2png::{
    convert_file_to_dir, serve, AppState, ConvertPdfToImages, ConverterConfig, PdfConverter,
    PdftoppmConverter, ServerConfig, CONVERT_ROUTE,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the HTTP server on :7071
  pdf2png serve

  # Bind elsewhere and use a specific poppler build
  pdf2png serve --host 127.0.0.1 --port 8080 --pdftoppm /opt/poppler/bin/pdftoppm

  # Convert a local file into ./pages/page-N.png
  pdf2png convert document.pdf -o pages

  # Print the JSON the HTTP endpoint would return
  pdf2png convert document.pdf --json > response.json

  # Call the server
  curl -s localhost:7071/api/ConvertPdfToImages \
       -H 'content-type: application/json' \
       -d "{\"pdfBase64\": \"$(base64 -w0 document.pdf)\"}"

ENVIRONMENT VARIABLES:
  PDF2PNG_HOST        Bind address (serve)
  PDF2PNG_PORT        Listen port (serve)
  PDF2PNG_BODY_LIMIT  Max request body in bytes (serve)
  PDF2PNG_PDFTOPPM    Path to the pdftoppm executable
  PDF2PNG_TIMEOUT     Per-invocation pdftoppm timeout in seconds
  PDF2PNG_TEMP_DIR    Parent directory for scratch directories
  RUST_LOG            Overrides the log filter (e.g. edgequake_pdf2png=debug)

SETUP:
  Install poppler-utils (Debian/Ubuntu) or poppler (Homebrew) so that
  `pdftoppm -v` works from your shell.
"#;

/// Convert base64 PDFs to per-page PNG images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2png",
    version,
    about = "Convert PDF documents to per-page PNG images via poppler's pdftoppm",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2PNG_VERBOSE")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP conversion endpoint.
    Serve(ServeArgs),
    /// Convert a local PDF file.
    Convert(ConvertArgs),
}

/// Rasterizer settings shared by every subcommand.
#[derive(Args, Debug)]
struct RasterizerArgs {
    /// pdftoppm executable (looked up on PATH unless absolute).
    #[arg(long, env = "PDF2PNG_PDFTOPPM", default_value = "pdftoppm")]
    pdftoppm: PathBuf,

    /// Per-invocation pdftoppm timeout in seconds.
    #[arg(long, env = "PDF2PNG_TIMEOUT", default_value_t = 120,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Parent directory for scratch directories (default: OS temp dir).
    #[arg(long, env = "PDF2PNG_TEMP_DIR")]
    temp_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Host address to bind to.
    #[arg(long, env = "PDF2PNG_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "PDF2PNG_PORT", default_value_t = 7071)]
    port: u16,

    /// Maximum request body size in bytes.
    #[arg(long, env = "PDF2PNG_BODY_LIMIT", default_value_t = 64 * 1024 * 1024)]
    body_limit: usize,

    #[command(flatten)]
    rasterizer: RasterizerArgs,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Local PDF file.
    input: PathBuf,

    /// Directory for page-N.png files.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Print the JSON response body instead of writing PNG files.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    rasterizer: RasterizerArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Convert(args) => run_convert(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let converter = build_converter(&args.rasterizer)?;
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        body_limit_bytes: args.body_limit,
    };

    info!(
        "Starting pdf2png server on {} (POST {})",
        config.bind_addr(),
        CONVERT_ROUTE
    );
    info!(
        "Rasterizer: {} (timeout {}s)",
        converter.config().program.display(),
        converter.config().timeout_secs
    );

    let state = AppState {
        use_case: ConvertPdfToImages::new(Arc::new(converter)),
    };
    serve(&config, state).await.context("HTTP server failed")?;
    Ok(())
}

async fn run_convert(args: ConvertArgs) -> Result<()> {
    let converter = build_converter(&args.rasterizer)?;
    converter
        .check_available()
        .await
        .context("pdftoppm is not usable")?;

    let use_case = ConvertPdfToImages::new(Arc::new(converter));
    let start = Instant::now();

    if args.json {
        let bytes = tokio::fs::read(&args.input)
            .await
            .with_context(|| format!("Failed to read {}", args.input.display()))?;
        let images = use_case
            .execute_bytes(bytes)
            .await
            .context("Conversion failed")?;
        let json = serde_json::to_string_pretty(&ConvertResponse { images })
            .context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    let written = convert_file_to_dir(&use_case, &args.input, &args.output)
        .await
        .context("Conversion failed")?;

    for path in &written {
        eprintln!("  {} {}", green("✓"), dim(&path.display().to_string()));
    }
    eprintln!(
        "{}  {} pages  {}ms  →  {}",
        green("✔"),
        written.len(),
        start.elapsed().as_millis(),
        bold(&args.output.display().to_string()),
    );
    Ok(())
}

/// Map CLI args to a configured converter.
fn build_converter(args: &RasterizerArgs) -> Result<PdftoppmConverter> {
    let mut builder = ConverterConfig::builder()
        .program(&args.pdftoppm)
        .timeout_secs(args.timeout);
    if let Some(ref dir) = args.temp_dir {
        builder = builder.temp_root(dir);
    }
    let config = builder.build().context("Invalid configuration")?;
    Ok(PdftoppmConverter::new(config))
}
