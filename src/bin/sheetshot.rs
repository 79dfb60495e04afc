//! CLI binary for sheetshot.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints the screenshot path.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use sheetshot::{
    convert_async, convert_to_file, inspect, CellMarkup, ConversionConfig,
    ConversionProgressCallback, ProgressCallback, Stage,
};
use std::io;
use std::path::PathBuf;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that names the running stage and leaves one log line per stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let template = "{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}";
        let style = ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Input => "Checking input…",
        Stage::RangeCheck => "Scanning used range…",
        Stage::Render => "Rendering table…",
        Stage::Capture => "Launching browser and capturing…",
        Stage::Verify => "Verifying image…",
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix("Converting");
        self.bar.set_message(stage_message(stage));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<12} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{elapsed_ms}ms")),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        // Keep long browser errors to one line.
        let msg = match error.lines().next() {
            Some(line) if line.chars().count() > 80 => {
                format!("{}\u{2026}", line.chars().take(79).collect::<String>())
            }
            Some(line) => line.to_string(),
            None => String::new(),
        };
        self.bar.println(format!(
            "  {} {:<12} {}",
            red("✗"),
            stage.to_string(),
            red(&msg)
        ));
    }

    fn on_conversion_complete(&self, _success: bool) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Screenshot into ./screenshots, print the path
  sheetshot report.xlsx

  # Write to a chosen file
  sheetshot report.xlsx -o report.png

  # Wider viewport, longer wait
  sheetshot --width 1600 --height 1000 --timeout 20 big.xlsx

  # Describe the workbook only (no browser needed)
  sheetshot --inspect-only report.xlsx

  # JSON output with timings and image size
  sheetshot --json report.xlsx > result.json

  # Inside a container running as root
  sheetshot --no-sandbox report.xlsx

ENVIRONMENT VARIABLES:
  SHEETSHOT_CHROME          Path to Chrome/Chromium (also: CHROME)
  PLAYWRIGHT_BROWSERS_PATH  Playwright browser cache searched for Chromium
  RUST_LOG                  Tracing filter, overrides -v / -q
"#;

/// Render the first sheet of an Excel workbook to a cropped PNG.
#[derive(Parser, Debug)]
#[command(
    name = "sheetshot",
    version,
    about = "Render the first sheet of an Excel workbook to a cropped PNG",
    long_about = "Render the first worksheet of an .xlsx/.xls workbook as a styled table in \
headless Chrome and save a PNG cropped exactly to the table.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Spreadsheet to convert (.xlsx or .xls).
    input: PathBuf,

    /// Move the screenshot to this path instead of leaving it in --output-dir.
    #[arg(short, long, env = "SHEETSHOT_OUTPUT")]
    output: Option<PathBuf>,

    /// Directory for generated screenshots.
    #[arg(long, env = "SHEETSHOT_OUTPUT_DIR", default_value = "screenshots")]
    output_dir: PathBuf,

    /// Browser viewport width in CSS pixels.
    #[arg(long, env = "SHEETSHOT_WIDTH", default_value_t = 1200,
          value_parser = clap::value_parser!(u32).range(100..=10000))]
    width: u32,

    /// Browser viewport height in CSS pixels.
    #[arg(long, env = "SHEETSHOT_HEIGHT", default_value_t = 800,
          value_parser = clap::value_parser!(u32).range(100..=10000))]
    height: u32,

    /// Seconds to wait for the table to appear.
    #[arg(long, env = "SHEETSHOT_TIMEOUT", default_value_t = 10)]
    timeout: u64,

    /// `id` of the table element that is captured.
    #[arg(long, env = "SHEETSHOT_TABLE_ID", default_value = sheetshot::DEFAULT_TABLE_ID)]
    table_id: String,

    /// Insert cell text as raw HTML instead of escaping it.
    #[arg(long, env = "SHEETSHOT_RAW_CELLS")]
    raw_cells: bool,

    /// Chrome/Chromium executable (default: auto-detected).
    #[arg(long, env = "SHEETSHOT_CHROME")]
    chrome: Option<PathBuf>,

    /// Launch the browser without its sandbox.
    #[arg(long, env = "SHEETSHOT_NO_SANDBOX")]
    no_sandbox: bool,

    /// Print workbook summary only, no screenshot.
    #[arg(long)]
    inspect_only: bool,

    /// Output structured JSON instead of a bare path.
    #[arg(long, env = "SHEETSHOT_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "SHEETSHOT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SHEETSHOT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SHEETSHOT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO-level library logs when it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
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

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let summary = inspect(&cli.input)
            .await
            .context("could not process file")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
            );
        } else {
            println!("File:      {}", summary.path.display());
            println!("Sheets:    {}", summary.sheet_names.join(", "));
            println!("Range:     {}", summary.content_range);
            println!("Columns:   {}", summary.columns);
            println!("Data rows: {}", summary.rows);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = match cli.output {
        Some(ref path) => convert_to_file(&cli.input, path, &config).await,
        None => convert_async(&cli.input, &config).await,
    }
    .context("could not process file")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        println!("{}", output.screenshot_path.display());
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {}×{} px  {} rows × {} cols  {}ms",
            green("✔"),
            bold(&output.image_width.to_string()),
            bold(&output.image_height.to_string()),
            output.rows,
            output.columns,
            output.stats.total_duration_ms,
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .output_dir(&cli.output_dir)
        .viewport(cli.width, cli.height)
        .wait_timeout_secs(cli.timeout)
        .table_id(&cli.table_id)
        .cell_markup(if cli.raw_cells {
            CellMarkup::Raw
        } else {
            CellMarkup::Escaped
        })
        .sandbox(!cli.no_sandbox);

    if let Some(ref chrome) = cli.chrome {
        builder = builder.browser_executable(chrome);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
