//! PDF rasterisation: turn a [`PdfDocument`] into per-page PNGs.
//!
//! The conversion capability is the [`PdfConverter`] trait so that the use
//! case and the HTTP layer never touch a subprocess directly. The production
//! implementation, [`PdftoppmConverter`], shells out to poppler's `pdftoppm`;
//! tests substitute in-memory fakes.
//!
//! ## Why a subprocess?
//!
//! Rendering PDF is a hard, open-ended problem. `pdftoppm` is mature and
//! widely packaged, so the per-call cost of a scratch directory and a process
//! spawn buys correct rendering without linking a rendering engine.
//!
//! ## Scratch directory lifecycle
//!
//! Every call owns a fresh directory named `pdf-<unix-millis>-<random>`. The
//! random suffix keeps concurrent requests in the same millisecond apart.
//! The directory is a [`tempfile::TempDir`], so it is removed on every exit
//! path, including early `?` returns and a timed-out child.

use crate::config::ConverterConfig;
use crate::document::{PdfDocument, PdfPage};
use crate::error::ConvertError;
use crate::pipeline::collect::{collect_pages, OUTPUT_PREFIX};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Rendering resolution passed to `pdftoppm -r`.
pub const RASTER_DPI: u32 = 300;

/// Long-edge pixel size passed to `pdftoppm -scale-to`.
pub const RASTER_SCALE_TO: u32 = 2480;

/// Name of the PDF written into the scratch directory.
const INPUT_FILE: &str = "temp.pdf";

/// Capability: convert a PDF into one image per page.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    /// Render `pdf` and return its pages in ascending page order.
    ///
    /// Pages the backend produced no image for are omitted; an empty result
    /// is reported as [`ConvertError::NoImagesGenerated`] instead.
    async fn convert_to_images(&self, pdf: &PdfDocument) -> Result<Vec<PdfPage>, ConvertError>;

    /// Cheap probe that the backend can run at all.
    async fn check_available(&self) -> Result<(), ConvertError> {
        Ok(())
    }
}

/// [`PdfConverter`] backed by poppler's `pdftoppm` executable.
#[derive(Debug, Clone)]
pub struct PdftoppmConverter {
    config: ConverterConfig,
}

impl PdftoppmConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Arguments for a full-document render of `input` into `prefix-N.png`.
    pub fn raster_args(input: &Path, prefix: &Path) -> Vec<OsString> {
        vec![
            "-png".into(),
            "-r".into(),
            RASTER_DPI.to_string().into(),
            "-scale-to".into(),
            RASTER_SCALE_TO.to_string().into(),
            input.as_os_str().to_owned(),
            prefix.as_os_str().to_owned(),
        ]
    }

    fn program_name(&self) -> String {
        self.config.program.display().to_string()
    }

    /// Create this call's scratch directory.
    fn scratch_dir(&self) -> Result<TempDir, ConvertError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let prefix = format!("pdf-{millis}-");

        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let dir = match &self.config.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(|e| ConvertError::io("creating scratch directory", e))
    }

    /// Run the rasterizer with `args`, bounded by the configured timeout.
    ///
    /// The child is killed if the timeout fires.
    async fn run(&self, args: &[OsString]) -> Result<Output, ConvertError> {
        let child = Command::new(&self.config.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ConvertError::RasterizerLaunch {
                program: self.program_name(),
                source,
            })?;

        match tokio::time::timeout(self.config.timeout(), child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| ConvertError::io("waiting for pdftoppm", e)),
            Err(_) => {
                warn!(
                    "{} exceeded {}s, killing it",
                    self.program_name(),
                    self.config.timeout_secs
                );
                Err(ConvertError::RasterizerTimeout {
                    secs: self.config.timeout_secs,
                })
            }
        }
    }
}

impl Default for PdftoppmConverter {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}

#[async_trait]
impl PdfConverter for PdftoppmConverter {
    async fn convert_to_images(&self, pdf: &PdfDocument) -> Result<Vec<PdfPage>, ConvertError> {
        let scratch = self.scratch_dir()?;
        debug!("Scratch directory: {}", scratch.path().display());

        let input = scratch.path().join(INPUT_FILE);
        tokio::fs::write(&input, pdf.content())
            .await
            .map_err(|e| ConvertError::io("writing PDF to scratch directory", e))?;

        let prefix = scratch.path().join(OUTPUT_PREFIX);
        let start = Instant::now();
        let output = self.run(&Self::raster_args(&input, &prefix)).await?;
        if !output.status.success() {
            return Err(ConvertError::RasterizerFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        info!(
            "pdftoppm finished for {} pages in {}ms",
            pdf.page_count(),
            start.elapsed().as_millis()
        );

        let pages = collect_pages(scratch.path(), pdf.page_count()).await?;
        if pages.len() < pdf.page_count() {
            debug!(
                "Collected {}/{} pages; missing pages omitted",
                pages.len(),
                pdf.page_count()
            );
        }

        if let Err(e) = scratch.close() {
            warn!("Failed to remove scratch directory: {}", e);
        }
        Ok(pages)
    }

    async fn check_available(&self) -> Result<(), ConvertError> {
        let output = self
            .run(&[OsString::from("-v")])
            .await
            .map_err(|e| {
                let detail = match e {
                    ConvertError::RasterizerLaunch { program, source } => {
                        format!("failed to run '{program} -v': {source}")
                    }
                    other => other.to_string(),
                };
                ConvertError::ToolUnavailable { detail }
            })?;

        // pdftoppm prints its version banner on stderr.
        let banner = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(ConvertError::ToolUnavailable {
                detail: format!(
                    "'{} -v' exited with {}: {}",
                    self.program_name(),
                    output.status,
                    banner
                ),
            });
        }
        debug!("Rasterizer available: {}", banner.lines().next().unwrap_or(""));
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::pipeline::encode::decode_base64;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    const VERSION_PROBE: &str =
        r#"if [ "$1" = "-v" ]; then echo "pdftoppm version 24.02.0" >&2; exit 0; fi"#;

    /// A stand-in rasterizer: a shell script in its own directory.
    struct FakeTool {
        dir: TempDir,
        scratch_root: TempDir,
    }

    impl FakeTool {
        fn new(body: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("pdftoppm");
            std::fs::write(&path, format!("#!/bin/sh\n{VERSION_PROBE}\n{body}\n")).unwrap();
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();
            Self {
                dir,
                scratch_root: TempDir::new().unwrap(),
            }
        }

        fn converter(&self, timeout_secs: u64) -> PdftoppmConverter {
            PdftoppmConverter::new(
                ConverterConfig::builder()
                    .program(self.dir.path().join("pdftoppm"))
                    .timeout_secs(timeout_secs)
                    .temp_root(self.scratch_root.path())
                    .build()
                    .unwrap(),
            )
        }

        fn assert_no_scratch_left(&self) {
            let left: Vec<_> = std::fs::read_dir(self.scratch_root.path())
                .unwrap()
                .collect();
            assert!(left.is_empty(), "scratch state left behind: {left:?}");
        }
    }

    fn two_page_pdf() -> PdfDocument {
        PdfDocument::new(b"%PDF-1.7 fake".to_vec(), 2).unwrap()
    }

    #[tokio::test]
    async fn renders_every_page() {
        let tool = FakeTool::new(
            r#"printf 'one' > "$7-1.png"
printf 'two' > "$7-2.png""#,
        );
        let pages = tool
            .converter(10)
            .convert_to_images(&two_page_pdf())
            .await
            .unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(decode_base64(&pages[0].image_content).unwrap(), b"one");
        assert_eq!(pages[1].page_number, 2);
        assert_eq!(decode_base64(&pages[1].image_content).unwrap(), b"two");
        tool.assert_no_scratch_left();
    }

    #[tokio::test]
    async fn passes_fixed_raster_arguments_and_pdf_bytes() {
        let side = TempDir::new().unwrap();
        let args_file = side.path().join("args.txt");
        let seen_pdf = side.path().join("seen.pdf");
        let scratch_file = side.path().join("scratch.txt");
        let tool = FakeTool::new(&format!(
            r#"echo "$1 $2 $3 $4 $5" > "{args}"
basename "$7" >> "{args}"
cp "$6" "{seen}"
dirname "$7" > "{scratch}"
printf 'png' > "$7-1.png""#,
            args = args_file.display(),
            seen = seen_pdf.display(),
            scratch = scratch_file.display(),
        ));

        tool.converter(10)
            .convert_to_images(&two_page_pdf())
            .await
            .unwrap();

        let args = std::fs::read_to_string(&args_file).unwrap();
        let mut lines = args.lines();
        assert_eq!(lines.next(), Some("-png -r 300 -scale-to 2480"));
        assert_eq!(lines.next(), Some("page"));
        assert_eq!(std::fs::read(&seen_pdf).unwrap(), b"%PDF-1.7 fake");

        let scratch = PathBuf::from(std::fs::read_to_string(&scratch_file).unwrap().trim());
        let name = scratch.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("pdf-"), "got: {name}");
        assert!(!scratch.exists(), "scratch dir should be removed");
    }

    #[tokio::test]
    async fn partial_output_drops_missing_pages() {
        let tool = FakeTool::new(r#"printf 'one' > "$7-1.png""#);
        let pages = tool
            .converter(10)
            .convert_to_images(&two_page_pdf())
            .await
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 1);
        tool.assert_no_scratch_left();
    }

    #[tokio::test]
    async fn non_zero_exit_fails_and_cleans_up() {
        let tool = FakeTool::new(
            r#"printf 'one' > "$7-1.png"
echo "Syntax Error: Couldn't read xref table" >&2
exit 1"#,
        );
        let err = tool
            .converter(10)
            .convert_to_images(&two_page_pdf())
            .await
            .unwrap_err();

        match &err {
            ConvertError::RasterizerFailed { status, stderr } => {
                assert_eq!(status.code(), Some(1));
                assert!(stderr.contains("xref"), "got: {stderr}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("PDF conversion failed"));
        tool.assert_no_scratch_left();
    }

    #[tokio::test]
    async fn success_without_output_is_no_images() {
        let tool = FakeTool::new("exit 0");
        let err = tool
            .converter(10)
            .convert_to_images(&two_page_pdf())
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::NoImagesGenerated), "got: {err:?}");
        tool.assert_no_scratch_left();
    }

    #[tokio::test]
    async fn concurrent_conversions_get_separate_scratch_dirs() {
        let side = TempDir::new().unwrap();
        let log = side.path().join("dirs.txt");
        // Each run writes its own scratch path as the page image.
        let tool = FakeTool::new(&format!(
            r#"dirname "$7" >> "{log}"
sleep 1
printf '%s' "$(dirname "$7")" > "$7-1.png""#,
            log = log.display(),
        ));
        let converter = tool.converter(10);
        let pdf = two_page_pdf();

        let (a, b) = tokio::join!(
            converter.convert_to_images(&pdf),
            converter.convert_to_images(&pdf)
        );
        let scratch_of = |pages: Vec<PdfPage>| {
            String::from_utf8(decode_base64(&pages[0].image_content).unwrap()).unwrap()
        };
        let dir_a = scratch_of(a.unwrap());
        let dir_b = scratch_of(b.unwrap());
        assert_ne!(dir_a, dir_b);

        let logged = std::fs::read_to_string(&log).unwrap();
        let mut logged: Vec<&str> = logged.lines().collect();
        logged.sort_unstable();
        let mut expected = vec![dir_a.as_str(), dir_b.as_str()];
        expected.sort_unstable();
        assert_eq!(logged, expected);

        assert!(!Path::new(&dir_a).exists());
        assert!(!Path::new(&dir_b).exists());
        tool.assert_no_scratch_left();
    }

    #[tokio::test]
    async fn hung_rasterizer_times_out_and_cleans_up() {
        let tool = FakeTool::new("exec sleep 30");
        let start = Instant::now();
        let err = tool
            .converter(1)
            .convert_to_images(&two_page_pdf())
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::RasterizerTimeout { secs: 1 }), "got: {err:?}");
        assert!(start.elapsed().as_secs() < 10);
        tool.assert_no_scratch_left();
    }

    #[tokio::test]
    async fn missing_binary_is_a_launch_error() {
        let scratch_root = TempDir::new().unwrap();
        let converter = PdftoppmConverter::new(
            ConverterConfig::builder()
                .program("/nonexistent/bin/pdftoppm")
                .temp_root(scratch_root.path())
                .build()
                .unwrap(),
        );

        let err = converter.convert_to_images(&two_page_pdf()).await.unwrap_err();
        assert!(matches!(err, ConvertError::RasterizerLaunch { .. }), "got: {err:?}");
        assert_eq!(std::fs::read_dir(scratch_root.path()).unwrap().count(), 0);

        let err = converter.check_available().await.unwrap_err();
        assert!(err.is_environment(), "got: {err:?}");
    }

    #[tokio::test]
    async fn version_probe_succeeds() {
        let tool = FakeTool::new("exit 0");
        tool.converter(10).check_available().await.unwrap();
    }

    #[tokio::test]
    async fn version_probe_non_zero_exit_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pdftoppm");
        std::fs::write(&path, "#!/bin/sh\necho 'broken install' >&2\nexit 127\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        let converter = PdftoppmConverter::new(
            ConverterConfig::builder().program(&path).build().unwrap(),
        );

        match converter.check_available().await.unwrap_err() {
            ConvertError::ToolUnavailable { detail } => {
                assert!(detail.contains("broken install"), "got: {detail}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn raster_args_layout() {
        let args = PdftoppmConverter::raster_args(Path::new("/s/temp.pdf"), Path::new("/s/page"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            ["-png", "-r", "300", "-scale-to", "2480", "/s/temp.pdf", "/s/page"]
        );
    }
}
