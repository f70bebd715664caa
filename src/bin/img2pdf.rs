//! CLI binary for edgequake-img2pdf.
//!
//! A thin shim over the library crate: `--mode api` serves the HTTP surface,
//! `--mode convert` maps flags to a `ConversionRequest` and prints the
//! result.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use edgequake_img2pdf::server::{self, ServerConfig};
use edgequake_img2pdf::{
    ConversionConfig, ConversionProgressCallback, ConversionRequest, ConversionResult, Converter,
    DecodePolicy, ProgressCallback, SortOrder,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the directory is scanned,
/// then a bar with one log line per image.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning images…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    /// Clear the bar if the run ended before assembly reported completion.
    fn abandon(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_images: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_images as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Assembling {total_images} images…"))
        ));
    }

    fn on_image_start(&self, _index: usize, _total: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_image_complete(&self, index: usize, total: usize, name: &str) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            dim(name)
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, index: usize, total: usize, name: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['…']).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            name,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_images: usize, pages: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {} pages assembled", green("✔"), bold(&pages.to_string()));
        } else {
            eprintln!(
                "{} {}/{} images assembled  ({} failed)",
                if pages == 0 { red("✘") } else { cyan("⚠") },
                bold(&pages.to_string()),
                total_images,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP service on 0.0.0.0:8000
  img2pdf

  # Serve on localhost only, accepting uploads up to 256 MiB
  img2pdf --host 127.0.0.1 --port 9000 --max-upload-mb 256

  # Convert a directory, ordered by filename
  img2pdf --mode convert --input-dir scans --output-pdf scans.pdf

  # Only PNG and JPEG, ordered by modification time
  img2pdf --mode convert --input-dir shots --output-pdf shots.pdf \
      --formats png jpg jpeg --sort modified

  # Keep going past unreadable files, print the result as JSON
  img2pdf --mode convert --input-dir scans --output-pdf scans.pdf \
      --skip-undecodable --json

HTTP ENDPOINTS:
  GET  /                service info
  GET  /health          {"status":"healthy"}
  POST /convert         JSON {input_dir, output_pdf_path, image_formats?, sort_order?}
  POST /convert/upload  multipart image files (+ sort_order, image_formats fields)

SUPPORTED FORMATS:
  png, jpg, jpeg, bmp, tiff, tif, gif

ENVIRONMENT VARIABLES:
  Every flag can be set as IMG2PDF_<FLAG>, e.g. IMG2PDF_PORT=9000.
  RUST_LOG overrides the log filter (e.g. RUST_LOG=edgequake_img2pdf=debug).
"#;

/// Concatenate a directory of images into one PDF, or serve that over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "img2pdf",
    version,
    about = "Concatenate images into a single PDF (CLI and HTTP service)",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Run the HTTP service or a single conversion.
    #[arg(long, env = "IMG2PDF_MODE", value_enum, default_value = "api")]
    mode: Mode,

    // ── api mode ─────────────────────────────────────────────────────────
    /// Address to bind in api mode.
    #[arg(long, env = "IMG2PDF_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind in api mode.
    #[arg(long, env = "IMG2PDF_PORT", default_value_t = 8000)]
    port: u16,

    /// Maximum request body size in MiB.
    #[arg(long, env = "IMG2PDF_MAX_UPLOAD_MB", default_value_t = 64,
          value_parser = clap::value_parser!(u64).range(1..=4096))]
    max_upload_mb: u64,

    // ── convert mode ─────────────────────────────────────────────────────
    /// Directory containing the images (convert mode).
    #[arg(long, env = "IMG2PDF_INPUT_DIR")]
    input_dir: Option<PathBuf>,

    /// Path of the PDF to write (convert mode).
    #[arg(long, env = "IMG2PDF_OUTPUT_PDF")]
    output_pdf: Option<PathBuf>,

    /// Image extensions to include. Default: all supported.
    #[arg(long, env = "IMG2PDF_FORMATS", num_args = 1.., value_delimiter = ',')]
    formats: Option<Vec<String>>,

    /// Page order.
    #[arg(long, env = "IMG2PDF_SORT", value_enum, default_value = "name")]
    sort: SortArg,

    // ── shared ───────────────────────────────────────────────────────────
    /// Compare filenames case-sensitively when sorting by name.
    #[arg(long, env = "IMG2PDF_CASE_SENSITIVE")]
    case_sensitive: bool,

    /// Page resolution in DPI; page size = pixels × 72 / DPI.
    #[arg(long, env = "IMG2PDF_RESOLUTION", default_value_t = 72.0)]
    resolution: f32,

    /// Re-encode JPEGs instead of embedding them unchanged.
    #[arg(long, env = "IMG2PDF_NO_JPEG_PASSTHROUGH")]
    no_jpeg_passthrough: bool,

    /// Skip images that fail to decode instead of aborting.
    #[arg(long, env = "IMG2PDF_SKIP_UNDECODABLE")]
    skip_undecodable: bool,

    /// Print the ConversionResult as JSON.
    #[arg(long, env = "IMG2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "IMG2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "IMG2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Api,
    Convert,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Name,
    Modified,
}

impl From<SortArg> for SortOrder {
    fn from(v: SortArg) -> Self {
        match v {
            SortArg::Name => SortOrder::Name,
            SortArg::Modified => SortOrder::Modified,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // In convert mode the progress bar replaces INFO-level library logs.
    let show_progress =
        cli.mode == Mode::Convert && !cli.quiet && !cli.no_progress && !cli.json;
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

    match cli.mode {
        Mode::Api => run_api(&cli).await,
        Mode::Convert => run_convert(&cli, show_progress).await,
    }
}

async fn run_api(cli: &Cli) -> Result<()> {
    let converter = Converter::new(build_config(cli, None)?);
    let server_config = ServerConfig {
        host: cli.host.clone(),
        port: cli.port,
        max_upload_bytes: usize::try_from(cli.max_upload_mb * 1024 * 1024)
            .context("--max-upload-mb is too large for this platform")?,
    };

    server::serve(converter, &server_config)
        .await
        .with_context(|| format!("HTTP server on {}:{} failed", cli.host, cli.port))
}

async fn run_convert(cli: &Cli, show_progress: bool) -> Result<()> {
    let (Some(input_dir), Some(output_pdf)) = (&cli.input_dir, &cli.output_pdf) else {
        Cli::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "--mode convert requires both --input-dir and --output-pdf",
            )
            .exit();
    };

    let bar = show_progress.then(CliProgressCallback::new);
    let progress = bar
        .clone()
        .map(|cb| cb as Arc<dyn ConversionProgressCallback>);
    let converter = Converter::new(build_config(cli, progress)?);

    let mut request =
        ConversionRequest::directory(input_dir, output_pdf).sort_order(cli.sort.into());
    if let Some(ref formats) = cli.formats {
        request = request.formats(formats.iter().cloned());
    }

    let target = output_pdf.display().to_string();
    let result = match converter.convert_async(request).await {
        Ok(pdf) => ConversionResult::from_pdf(&pdf, &target),
        Err(e) => ConversionResult::from_error(&e),
    };
    if let Some(bar) = bar {
        bar.abandon();
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise result")?
        );
    } else if result.success {
        if !cli.quiet {
            println!("{} {}", green("✔"), result.message);
            for skipped in &result.skipped_images {
                eprintln!("  {} skipped {}: {}", cyan("⚠"), skipped.name, dim(&skipped.reason));
            }
        }
    } else {
        eprintln!("{} {}", red("✘"), result.message);
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .case_sensitive_names(cli.case_sensitive)
        .resolution(cli.resolution)
        .jpeg_passthrough(!cli.no_jpeg_passthrough)
        .decode_policy(if cli.skip_undecodable {
            DecodePolicy::Skip
        } else {
            DecodePolicy::Abort
        });
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}
