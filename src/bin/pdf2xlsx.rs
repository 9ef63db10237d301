//! CLI binary for pdf2xlsx.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, renders progress, and converts errors into exit
//! codes: 0 success, 2 precondition failure, 1 pipeline failure.

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2xlsx::{
    extract_to_workbook, ExtractionConfig, ExtractionProgressCallback, PageSelection,
    Pdf2XlsxError, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
/// Pages run sequentially, so a single slot of per-page state suffices.
struct CliProgressCallback {
    bar: ProgressBar,
    page_start: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_start: Mutex::new(None),
        })
    }

    fn page_elapsed(&self) -> f64 {
        self.page_start
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_millis() as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        *self.page_start.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, retries: u32) {
        let note = if retries > 0 {
            dim(&format!("{retries} retries"))
        } else {
            String::new()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{:.1}s", self.page_elapsed())),
            note,
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{:.1}s", self.page_elapsed())),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages extracted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages extracted  ({} failed)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a whole document
  pdf2xlsx report.pdf -o report.xlsx

  # Specific pages only
  pdf2xlsx report.pdf -o report.xlsx --pages 1,3,5-8

  # Use a specific model and higher resolution
  pdf2xlsx scan.pdf -o scan.xlsx --model gpt-4o --dpi 250

  # Replace an existing output file
  pdf2xlsx report.pdf -o report.xlsx --overwrite

EXIT CODES:
  0  success
  2  precondition failure (missing input, output exists without --overwrite,
     no valid pages selected)
  1  pipeline failure (render error, all pages failed, write error)

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY       OpenAI API key (preferred when several keys are set)
  ANTHROPIC_API_KEY    Anthropic API key
  GEMINI_API_KEY       Google Gemini API key
  PDFIUM_LIB_PATH      Path to an existing libpdfium shared library
"#;

/// Convert PDF pages to structured Excel workbooks using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2xlsx",
    version,
    about = "Convert PDF pages to structured Excel workbooks using Vision LLMs",
    long_about = "Render each selected PDF page to an image, extract its headings, \
paragraphs, and tables with a vision-capable language model, and write one formatted \
worksheet per page.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the input PDF.
    input: String,

    /// Path of the output .xlsx workbook.
    #[arg(short, long, env = "PDF2XLSX_OUTPUT")]
    output: PathBuf,

    /// Pages to process: all, or an expression like 1, 3-7, 1,3,5-8.
    #[arg(long, env = "PDF2XLSX_PAGES", default_value = "all")]
    pages: String,

    /// Vision LLM model ID (e.g. gpt-4o-mini, gpt-4o, claude-sonnet-4-20250514).
    #[arg(long, env = "PDF2XLSX_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    /// Auto-detected from API key env vars if not set.
    #[arg(long, env = "PDF2XLSX_PROVIDER")]
    provider: Option<String>,

    /// Rendering DPI (72-400); 150-250 is typical.
    #[arg(long, env = "PDF2XLSX_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Overwrite the output file if it exists.
    #[arg(long, env = "PDF2XLSX_OVERWRITE")]
    overwrite: bool,

    /// Total inference attempts per page.
    #[arg(long, env = "PDF2XLSX_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Base retry delay in milliseconds (doubles per attempt).
    #[arg(long, env = "PDF2XLSX_RETRY_BACKOFF_MS", default_value_t = 2000)]
    retry_backoff_ms: u64,

    /// LLM temperature (0.0-2.0).
    #[arg(long, env = "PDF2XLSX_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens per page.
    #[arg(long, env = "PDF2XLSX_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2XLSX_PASSWORD")]
    password: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PDF2XLSX_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Disable the progress bar.
    #[arg(long, env = "PDF2XLSX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2XLSX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2XLSX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", red("Error:"), e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<(), Pdf2XlsxError> {
    let config = build_config(cli, show_progress).await?;

    let output = extract_to_workbook(&cli.input, &cli.output, &config).await?;

    if !cli.quiet {
        let selected = output.stats.processed_pages + output.stats.failed_pages;
        eprintln!(
            "{}  {}/{} pages  {}ms  →  {}",
            if output.stats.failed_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            output.stats.processed_pages,
            selected,
            output.stats.total_duration_ms,
            bold(&cli.output.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&output.stats.total_input_tokens.to_string()),
            dim(&output.stats.total_output_tokens.to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, show_progress: bool) -> Result<ExtractionConfig, Pdf2XlsxError> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(tokio::fs::read_to_string(path).await.map_err(|e| {
            Pdf2XlsxError::InvalidConfig(format!(
                "Failed to read system prompt from {}: {}",
                path.display(),
                e
            ))
        })?)
    } else {
        None
    };

    let mut builder = ExtractionConfig::builder()
        .dpi(cli.dpi)
        .pages(parse_pages(&cli.pages))
        .overwrite(cli.overwrite)
        .max_retries(cli.max_retries)
        .retry_backoff_ms(cli.retry_backoff_ms)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens);

    if show_progress {
        builder =
            builder.progress_callback(CliProgressCallback::new() as ProgressCallback);
    }

    let mut config = builder.build()?;

    // Fields without builder setters that come straight from flags
    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.password = cli.password.clone();
    config.system_prompt = system_prompt;

    Ok(config)
}

/// Parse `--pages` into a `PageSelection`.
///
/// `all` selects the whole document; anything else is a range expression
/// resolved leniently by the library against the actual page count.
fn parse_pages(s: &str) -> PageSelection {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        PageSelection::All
    } else {
        PageSelection::Expression(trimmed.to_string())
    }
}
