//! CLI binary for vc-qr-verify.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `VerifierConfig` and prints the outcome as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vc_qr_verify::{
    scan_file, verify_from_file, verify_from_qr_text, PageHitPolicy, UploadedFile,
    VerificationOutcome, VerifierConfig,
};

const AFTER_HELP: &str = r#"EXAMPLES:
  # Verify the QR code printed on a certificate image
  vcverify certificate.png --url https://verify.example/v1/verify/vc-verification

  # PDF certificate; stop at the first page carrying a QR code
  vcverify certificate.pdf --first-hit --url https://verify.example/v1/verify

  # Verify text already read from a QR code
  vcverify --qr-text 'INJI_OVP://...?resource=https://issuer.example/vc/42' --url https://verify.example/v1/verify

  # Only scan; print { data, error }
  vcverify --scan-only certificate.pdf

EXIT STATUS:
  0  status SUCCESS (or a successful scan with --scan-only)
  1  status FAILURE

ENVIRONMENT VARIABLES:
  VCVERIFY_URL        Verification endpoint
  PDFIUM_LIB_PATH     Path to libpdfium for PDF scanning
  RUST_LOG            Overrides -v / -q log filtering
"#;

/// Scan a verifiable-credential QR code and verify it.
#[derive(Parser, Debug)]
#[command(
    name = "vcverify",
    version,
    about = "Scan a verifiable-credential QR code from an image or PDF and verify it",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image (png, jpg, jpeg, gif) or PDF file carrying the QR code.
    #[arg(required_unless_present = "qr_text", conflicts_with = "qr_text")]
    input: Option<PathBuf>,

    /// Raw QR text to verify instead of scanning a file.
    #[arg(long)]
    qr_text: Option<String>,

    /// Verification endpoint the credential is POSTed to.
    #[arg(long, env = "VCVERIFY_URL", required_unless_present = "scan_only")]
    url: Option<String>,

    /// Override the MIME type inferred from the file extension.
    #[arg(long, env = "VCVERIFY_MIME")]
    mime: Option<String>,

    /// Minimum accepted file size in bytes.
    #[arg(long, env = "VCVERIFY_MIN_SIZE", default_value_t = 1000)]
    min_size: u64,

    /// Maximum accepted file size in bytes.
    #[arg(long, env = "VCVERIFY_MAX_SIZE", default_value_t = 7_000_000)]
    max_size: u64,

    /// Scan even if the file fails the size/extension checks.
    #[arg(long, env = "VCVERIFY_SKIP_FILE_CHECKS")]
    skip_file_checks: bool,

    /// For PDFs, use the first page with a QR code instead of the last.
    #[arg(long, env = "VCVERIFY_FIRST_HIT")]
    first_hit: bool,

    /// PDF render upscale factor (0.5–8.0).
    #[arg(long, env = "VCVERIFY_RENDER_SCALE", default_value_t = 3.0)]
    render_scale: f32,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Timeout for fetching an indirection resource, in seconds.
    #[arg(long, env = "VCVERIFY_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// Timeout for the verification request, in seconds.
    #[arg(long, env = "VCVERIFY_VERIFY_TIMEOUT", default_value_t = 30)]
    verify_timeout: u64,

    /// Timeout for opening and rendering a PDF, in seconds.
    #[arg(long, env = "VCVERIFY_PDF_TIMEOUT", default_value_t = 60)]
    pdf_timeout: u64,

    /// Print the scan result and stop; no network calls.
    #[arg(long)]
    scan_only: bool,

    /// Single-line JSON output.
    #[arg(long)]
    compact: bool,

    /// Disable the spinner.
    #[arg(long, env = "VCVERIFY_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "VCVERIFY_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, env = "VCVERIFY_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    let spinner = show_progress.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });
    let set_msg = |msg: &str| {
        if let Some(ref bar) = spinner {
            bar.set_message(msg.to_string());
        }
    };

    // ── Scan-only mode ───────────────────────────────────────────────────
    if cli.scan_only {
        let file = match cli.input {
            Some(ref path) => load_file(path, cli.mime.as_deref()).await?,
            None => anyhow::bail!("--scan-only needs an input file"),
        };
        set_msg("Scanning for QR code…");
        let scan = scan_file(&file, &config).await;
        if let Some(bar) = spinner {
            bar.finish_and_clear();
        }
        print_json(&scan, cli.compact)?;
        return Ok(if scan.error().is_none() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    // ── Verification ─────────────────────────────────────────────────────
    let url = cli.url.clone().unwrap_or_default();
    let outcome: VerificationOutcome = match (&cli.qr_text, &cli.input) {
        (Some(text), _) => {
            set_msg("Resolving and verifying credential…");
            verify_from_qr_text(text, &url, &config).await
        }
        (None, Some(path)) => {
            let file = load_file(path, cli.mime.as_deref()).await?;
            set_msg("Scanning and verifying credential…");
            verify_from_file(&file, &url, &config).await
        }
        (None, None) => anyhow::bail!("either a file or --qr-text is required"),
    };

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    print_json(&outcome, cli.compact)?;

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Map CLI args to `VerifierConfig`.
fn build_config(cli: &Cli) -> Result<VerifierConfig> {
    let mut builder = VerifierConfig::builder()
        .min_file_size(cli.min_size)
        .max_file_size(cli.max_size)
        .enforce_file_checks(!cli.skip_file_checks)
        .render_scale(cli.render_scale)
        .fetch_timeout_secs(cli.fetch_timeout)
        .verify_timeout_secs(cli.verify_timeout)
        .pdf_load_timeout_secs(cli.pdf_timeout);

    if cli.first_hit {
        builder = builder.page_policy(PageHitPolicy::FirstHit);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(lib);
    }

    builder.build().context("Invalid configuration")
}

async fn load_file(path: &Path, mime: Option<&str>) -> Result<UploadedFile> {
    let mut file = UploadedFile::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if let Some(mime) = mime {
        file.mime_type = mime.to_string();
    }
    Ok(file)
}

fn print_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}
