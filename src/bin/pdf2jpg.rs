//! CLI binary for pdf2jpg.
//!
//! A thin shim over [`pdf2jpg::Session`]: open the file, convert, apply the
//! `--pages` selection, save the selected pages.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2jpg::{
    AppError, AppStatus, Canceller, ConversionConfig, ConversionProgressCallback, DirectorySink,
    DownloadSink, PageId, PdfiumRenderer, Pdf2JpgError, ProgressCallback, Session,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
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

/// Spinner while the document loads, then a bar sized to the page count.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize) {
        self.bar.println(format!(
            "  {} Page {:>2}/{:<2}",
            green("✓"),
            page_num,
            total_pages
        ));
        self.bar.set_position(page_num as u64);
    }

    fn on_conversion_cancelled(&self, completed: usize, total_pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Cancelled after {}/{} pages, nothing kept",
            cyan("⚠"),
            completed,
            total_pages
        );
    }

    fn on_conversion_failed(&self, page_num: usize, error: &str) {
        self.bar.println(format!(
            "  {} Page {:>2}  {}",
            red("✗"),
            page_num,
            red(error)
        ));
        self.bar.finish_and_clear();
    }

    fn on_conversion_complete(&self, total_pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages converted",
            green("✔"),
            bold(&total_pages.to_string())
        );
    }
}

impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        // A load failure never starts the bar.
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

// ── Download sink that reports each saved file ───────────────────────────────

struct ReportingSink {
    inner: DirectorySink,
    quiet: bool,
}

impl DownloadSink for ReportingSink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<(), Pdf2JpgError> {
        self.inner.save(file_name, bytes)?;
        if !self.quiet {
            eprintln!(
                "  {} {}  {}",
                green("↓"),
                self.inner.dir().join(file_name).display(),
                dim(&format!("{} KB", bytes.len().div_ceil(1024)))
            );
        }
        Ok(())
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every page into the current directory
  pdf2jpg report.pdf

  # Pages 2 to 4 into ./out
  pdf2jpg report.pdf -o out --pages 2-4

  # A single page
  pdf2jpg report.pdf --page 3

  # List pages without saving, as JSON
  pdf2jpg report.pdf --list --json

LIMITS:
  Documents may have at most 20 pages. Pages are rendered at 150 DPI and
  saved as JPEG (quality 85) named <name>_p01.jpg, <name>_p02.jpg, …
  Password-protected PDFs are not supported.

  Press Ctrl-C during conversion to cancel; nothing is saved. A second
  Ctrl-C, or one while saving, quits immediately.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Override the log filter
"#;

/// Convert PDF pages to JPEG images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2jpg",
    version,
    about = "Convert PDF pages to JPEG images",
    long_about = "Convert each page of a PDF (up to 20 pages) to a JPEG image at 150 DPI, \
then save all pages or a selection of them.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file.
    input: PathBuf,

    /// Directory to write images into.
    #[arg(short, long = "output-dir", env = "PDF2JPG_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Pages to save: all, 5, 3-7, or 1,3,5.
    #[arg(
        long,
        env = "PDF2JPG_PAGES",
        default_value = "all",
        conflicts_with = "page",
        value_parser = parse_pages
    )]
    pages: PageSelection,

    /// Save only this page; same as `--pages N`.
    #[arg(long, value_parser = parse_page_number)]
    page: Option<usize>,

    /// Print page summaries without saving anything.
    #[arg(long)]
    list: bool,

    /// Print a JSON summary on stdout.
    #[arg(long, env = "PDF2JPG_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2JPG_NO_PROGRESS")]
    no_progress: bool,

    /// Path to libpdfium.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2JPG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2JPG_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The bar replaces INFO logs; verbose mode always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    let selection = cli.page.map(PageSelection::Single).unwrap_or_else(|| cli.pages.clone());

    // ── Build session ────────────────────────────────────────────────────
    let mut builder = ConversionConfig::builder();
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new_dynamic();
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;
    let mut session = Session::new(config, PdfiumRenderer::factory(cli.pdfium_lib.clone()));

    let converting = Arc::new(AtomicBool::new(true));
    spawn_interrupt_handler(session.canceller(), converting.clone());

    // ── Convert ──────────────────────────────────────────────────────────
    let opened = session.open_path(&cli.input).await;
    converting.store(false, Ordering::SeqCst);
    let status = opened.with_context(|| format!("Cannot open {}", cli.input.display()))?;

    match status {
        AppStatus::Result => {}
        AppStatus::Idle => anyhow::bail!("Conversion cancelled"),
        _ => {
            let app = session.error().unwrap_or_else(|| {
                AppError::new("Error", "An unexpected error occurred.")
            });
            return Err(match session.take_failure() {
                Some(e) => anyhow::Error::new(e).context(app.to_string()),
                None => anyhow::anyhow!(app.to_string()),
            });
        }
    }

    // ── Apply selection ──────────────────────────────────────────────────
    let chosen = select_only(&mut session, &selection)?;

    if cli.list {
        print_summary(&session, &cli, 0)?;
        return Ok(());
    }

    // ── Save ─────────────────────────────────────────────────────────────
    let dispatcher = session.dispatcher(ReportingSink {
        inner: DirectorySink::new(&cli.output_dir),
        quiet: cli.quiet || cli.json,
    });

    let saved = match (&selection, chosen.as_slice()) {
        (PageSelection::Single(_), [id]) => {
            session
                .download_single(&dispatcher, id)
                .context("Failed to save page")?;
            1
        }
        _ => session
            .download_selected(&dispatcher)
            .await
            .context("Failed to save pages")?,
    };

    print_summary(&session, &cli, saved)?;
    Ok(())
}

/// The first Ctrl-C during conversion cancels the run. Any later one, or one
/// while saving or listing, exits straight away.
fn spawn_interrupt_handler(canceller: Canceller, converting: Arc<AtomicBool>) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if converting.swap(false, Ordering::SeqCst) {
                eprintln!("{} Cancelling, press Ctrl-C again to quit", cyan("⚠"));
                canceller.cancel();
            } else {
                eprintln!("{} Interrupted", red("✗"));
                std::process::exit(130);
            }
        }
    });
}

fn print_summary(session: &Session, cli: &Cli, saved: usize) -> Result<()> {
    if cli.json {
        let pages: Vec<_> = session.pages().iter().map(|p| p.summary()).collect();
        let out = serde_json::json!({
            "input": cli.input,
            "base_name": session.base_name(),
            "output_dir": cli.output_dir,
            "saved": saved,
            "stats": session.stats(),
            "pages": pages,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("Failed to serialise summary")?
        );
        return Ok(());
    }

    if cli.list {
        for page in session.pages() {
            println!(
                "{} {:>2}  {:<24} {:>5}x{:<5} {:>6} KB",
                if page.selected { green("●") } else { dim("○") },
                page.page_num,
                page.file_name(),
                page.width,
                page.height,
                page.image.len().div_ceil(1024),
            );
        }
        return Ok(());
    }

    if !cli.quiet {
        let ms = session.stats().map(|s| s.duration_ms).unwrap_or(0);
        eprintln!(
            "{}  {}/{} pages saved  {}ms  →  {}",
            green("✔"),
            saved,
            session.pages().len(),
            ms,
            bold(&cli.output_dir.display().to_string()),
        );
    }
    Ok(())
}

/// Pages named on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PageSelection {
    All,
    Single(usize),
    Range(usize, usize),
    Set(Vec<usize>),
}

impl PageSelection {
    fn contains(&self, page_num: usize) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Single(n) => *n == page_num,
            PageSelection::Range(start, end) => (*start..=*end).contains(&page_num),
            PageSelection::Set(pages) => pages.contains(&page_num),
        }
    }
}

/// Page numbers of `page_nums` that `selection` keeps, in document order.
fn matching_pages(selection: &PageSelection, page_nums: &[usize]) -> Result<Vec<usize>> {
    let kept: Vec<usize> = page_nums
        .iter()
        .copied()
        .filter(|&n| selection.contains(n))
        .collect();
    if !kept.is_empty() {
        return Ok(kept);
    }
    let total = page_nums.len();
    match selection {
        PageSelection::Single(n) => {
            anyhow::bail!("Page {n} does not exist (document has {total} pages)")
        }
        _ => anyhow::bail!("No page matches the selection (document has {total} pages)"),
    }
}

/// Select exactly the pages in `selection` and return their ids.
fn select_only(session: &mut Session, selection: &PageSelection) -> Result<Vec<PageId>> {
    let nums: Vec<usize> = session.pages().iter().map(|p| p.page_num).collect();
    let kept = matching_pages(selection, &nums)?;
    let ids: Vec<PageId> = session
        .pages()
        .iter()
        .filter(|p| kept.contains(&p.page_num))
        .map(|p| p.id.clone())
        .collect();

    session.set_all(false);
    for id in &ids {
        session.toggle_page(id);
    }
    Ok(ids)
}

fn parse_page_number(s: &str) -> Result<usize, String> {
    let s = s.trim();
    match s.parse::<usize>() {
        Ok(0) => Err("page numbers start at 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{s}' is not a page number")),
    }
}

/// `all`, `5`, `3-7` or `1,3,5`.
fn parse_pages(s: &str) -> Result<PageSelection, String> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("all") {
        Ok(PageSelection::All)
    } else if let Some((first, last)) = s.split_once('-') {
        let (first, last) = (parse_page_number(first)?, parse_page_number(last)?);
        if first > last {
            return Err(format!("range {first}-{last} runs backwards"));
        }
        Ok(PageSelection::Range(first, last))
    } else if s.contains(',') {
        s.split(',')
            .map(parse_page_number)
            .collect::<Result<Vec<_>, _>>()
            .map(PageSelection::Set)
    } else {
        parse_page_number(s).map(PageSelection::Single)
    }
}
