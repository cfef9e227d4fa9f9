//! CLI binary for dd-checklist.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ReportConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use dd_checklist::report::write_atomic;
use dd_checklist::{
    generate_report, parse_document, sanitize, ParseOptions, ProgressCallback, ReportConfig,
    ReportProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner while the deck is parsed, then a percentage
/// bar while the research job runs.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Instant,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Loading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Instant::now(),
        })
    }

    /// Switch from the spinner to the percentage bar.
    fn activate_bar(&self) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}%  {msg}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_style(progress_style);
        self.bar.set_prefix("Researching");
        self.bar.set_position(0);
        self.bar.reset_elapsed();
    }
}

impl ReportProgressCallback for CliProgressCallback {
    fn on_parse_start(&self, file_name: &str) {
        self.bar.set_prefix("Parsing");
        self.bar.set_message(file_name.to_string());
    }

    fn on_parse_complete(&self, file_name: &str, pages: usize) {
        self.bar.println(format!(
            "  {} Parsed {}  {}",
            green("✓"),
            file_name,
            dim(&format!(
                "{pages} page(s)  {:.1}s",
                self.started.elapsed().as_secs_f64()
            )),
        ));
        self.bar.set_prefix("Submitting");
        self.bar.set_message("research job…");
    }

    fn on_research_submitted(&self, job_id: &str) {
        self.bar.println(format!(
            "{} {}  {}",
            cyan("◆"),
            bold("Deep research started"),
            dim(job_id)
        ));
        self.activate_bar();
    }

    fn on_research_progress(&self, percent: u8, status: &str) {
        self.bar.set_position(u64::from(percent));
        self.bar.set_message(status.to_string());
    }

    fn on_research_complete(&self, success: bool) {
        self.bar.finish_and_clear();
        let elapsed = self.started.elapsed().as_secs_f64();
        if success {
            eprintln!("{} Research complete  {}", green("✔"), dim(&format!("{elapsed:.0}s")));
        } else {
            eprintln!("{} Research failed  {}", red("✘"), dim(&format!("{elapsed:.0}s")));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Report to stdout
  dd-checklist pitch-deck.pdf

  # Report to file, keep the parsed deck alongside it
  dd-checklist pitch-deck.pdf -o report.md --save-source deck.md

  # From a URL
  dd-checklist https://example.com/decks/acme.pdf -o acme.md

  # Only parse the PDF (no OpenAI key needed)
  dd-checklist --parse-only pitch-deck.pdf > deck.md

  # Clean up an existing model report (no keys needed)
  dd-checklist --sanitize-only draft.md -o clean.md
  cat draft.md | dd-checklist --sanitize-only -

  # Custom template, fewer tool calls
  dd-checklist --template my-checklist.md --max-tool-calls 40 deck.pdf

  # Full result with stats as JSON
  dd-checklist --json pitch-deck.pdf > report.json

ENVIRONMENT VARIABLES:
  LLAMA_CLOUD_API_KEY     LlamaParse API key
  LLAMA_CLOUD_BASE_URL    LlamaParse API root, or "eu" for the EU region
  OPENAI_API_KEY          OpenAI API key
  OPENAI_BASE_URL         OpenAI API root (default https://api.openai.com/v1)
  RUST_LOG                Log filter, overrides -v / -q

NOTES:
  A deep-research job usually runs 5-30 minutes. The percentage shown is an
  estimate based on elapsed time; the API only reports queued / in_progress.
"#;

/// Generate a researched due-diligence checklist from a pitch deck PDF.
#[derive(Parser, Debug)]
#[command(
    name = "dd-checklist",
    version,
    about = "Generate a researched due-diligence checklist report from a pitch deck PDF",
    long_about = "Parse a pitch deck (local PDF or URL) with LlamaParse, run an OpenAI deep-research \
job that fills in a due-diligence checklist template, and print the sanitized Markdown report.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF path or HTTP/HTTPS URL. With --sanitize-only: a Markdown file, or - for stdin.
    input: String,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, env = "DD_CHECKLIST_OUTPUT")]
    output: Option<PathBuf>,

    /// Output structured JSON (report, source document and stats).
    #[arg(long, env = "DD_CHECKLIST_JSON")]
    json: bool,

    /// Print the report exactly as the model returned it, without sanitizing.
    #[arg(long)]
    raw: bool,

    /// Parse the PDF and print the extracted Markdown; no research job.
    #[arg(long, conflicts_with = "sanitize_only")]
    parse_only: bool,

    /// Sanitize an existing Markdown file and print it; no API calls.
    #[arg(long)]
    sanitize_only: bool,

    /// Also write the parsed source Markdown to this file.
    #[arg(long)]
    save_source: Option<PathBuf>,

    /// Markdown file with a custom checklist template.
    #[arg(long, env = "DD_CHECKLIST_TEMPLATE")]
    template: Option<PathBuf>,

    /// Deep-research model id.
    #[arg(long, env = "DD_CHECKLIST_MODEL", default_value = dd_checklist::config::DEFAULT_RESEARCH_MODEL)]
    model: String,

    /// Maximum tool calls the research job may make.
    #[arg(long, env = "DD_CHECKLIST_MAX_TOOL_CALLS", default_value_t = 120,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_tool_calls: u32,

    /// Do not give the research job a code interpreter.
    #[arg(long)]
    no_code_interpreter: bool,

    /// Do not give the research job web search.
    #[arg(long)]
    no_web_search: bool,

    /// Emit tables as Markdown pipes instead of HTML.
    #[arg(long)]
    no_html_tables: bool,

    /// Drop running page headers while parsing.
    #[arg(long)]
    hide_headers: bool,

    /// Drop running page footers while parsing.
    #[arg(long)]
    hide_footers: bool,

    /// Join parsed pages without `---` rules.
    #[arg(long)]
    no_page_breaks: bool,

    /// Delay between research status polls in milliseconds.
    #[arg(long, env = "DD_CHECKLIST_POLL_INTERVAL_MS", default_value_t = 3000)]
    poll_interval_ms: u64,

    /// Give up on the research job after this many seconds.
    #[arg(long, env = "DD_CHECKLIST_RESEARCH_TIMEOUT", default_value_t = 3600)]
    research_timeout: u64,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, env = "DD_CHECKLIST_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// LlamaParse API key.
    #[arg(long, env = "LLAMA_CLOUD_API_KEY", hide_env_values = true)]
    llama_api_key: Option<String>,

    /// LlamaParse API root, or `eu`.
    #[arg(long, env = "LLAMA_CLOUD_BASE_URL")]
    llama_base_url: Option<String>,

    /// OpenAI API key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// OpenAI API root.
    #[arg(long, env = "OPENAI_BASE_URL")]
    openai_base_url: Option<String>,

    /// Disable progress bar.
    #[arg(long, env = "DD_CHECKLIST_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DD_CHECKLIST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DD_CHECKLIST_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.sanitize_only;
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

    // ── Sanitize-only mode ───────────────────────────────────────────────
    if cli.sanitize_only {
        let text = read_markdown_input(&cli.input)?;
        return emit(&cli, &sanitize(&text)).await;
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ReportProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Parse-only mode ──────────────────────────────────────────────────
    if cli.parse_only {
        let doc = parse_document(&cli.input, &config)
            .await
            .context("Parsing failed")?;
        if let Some(ref path) = cli.save_source {
            save(path, &doc.markdown).await?;
        }
        let body = if cli.json {
            serde_json::to_string_pretty(&doc).context("Failed to serialise output")?
        } else {
            doc.markdown.clone()
        };
        emit(&cli, &body).await?;
        if !cli.quiet {
            eprintln!(
                "{} {} page(s), {} chars",
                green("✔"),
                doc.pages.len(),
                doc.markdown.chars().count()
            );
        }
        return Ok(());
    }

    // ── Full report ──────────────────────────────────────────────────────
    let output = generate_report(&cli.input, &config)
        .await
        .context("Report generation failed")?;

    if let Some(ref path) = cli.save_source {
        save(path, &output.source.markdown).await?;
    }

    let body = if cli.json {
        serde_json::to_string_pretty(&output).context("Failed to serialise output")?
    } else if cli.raw {
        output.raw_markdown.clone()
    } else {
        output.markdown.clone()
    };
    emit(&cli, &body).await?;

    if !cli.quiet && !cli.json {
        let stats = &output.stats;
        eprintln!(
            "{}  {} source page(s)  →  {} chars  {}",
            green("✔"),
            stats.source_pages,
            stats.report_chars,
            dim(&format!(
                "parse {:.0}s · research {:.0}s · {} polls",
                stats.parse_duration_ms as f64 / 1000.0,
                stats.research_duration_ms as f64 / 1000.0,
                stats.polls
            )),
        );
        if let Some(ref path) = cli.output {
            eprintln!("   {}", bold(&path.display().to_string()));
        }
    }

    Ok(())
}

/// Map CLI args to `ReportConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ReportConfig> {
    let template = if let Some(ref path) = cli.template {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read template from {:?}", path))?,
        )
    } else {
        None
    };

    let parse = ParseOptions {
        output_tables_as_html: !cli.no_html_tables,
        hide_headers: cli.hide_headers,
        hide_footers: cli.hide_footers,
        show_page_breaks: !cli.no_page_breaks,
        ..ParseOptions::default()
    };

    let mut builder = ReportConfig::builder()
        .parse_options(parse)
        .research_model(cli.model.clone())
        .max_tool_calls(cli.max_tool_calls)
        .web_search(!cli.no_web_search)
        .code_interpreter(!cli.no_code_interpreter)
        .poll_interval_ms(cli.poll_interval_ms)
        .research_timeout_secs(cli.research_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(key) = non_blank(&cli.llama_api_key) {
        builder = builder.llama_api_key(key);
    }
    if let Some(url) = non_blank(&cli.llama_base_url) {
        builder = builder.llama_base_url(url);
    }
    if let Some(key) = non_blank(&cli.openai_api_key) {
        builder = builder.openai_api_key(key);
    }
    if let Some(url) = non_blank(&cli.openai_base_url) {
        builder = builder.openai_base_url(url);
    }
    if let Some(t) = template {
        builder = builder.template(t);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Read Markdown from a file, or stdin when `input` is `-`.
fn read_markdown_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
}

async fn save(path: &Path, contents: &str) -> Result<()> {
    write_atomic(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Write to `--output` if given, otherwise stdout.
async fn emit(cli: &Cli, body: &str) -> Result<()> {
    if let Some(ref path) = cli.output {
        return save(path, body).await;
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(body.as_bytes())
        .context("Failed to write to stdout")?;
    // Ensure a trailing newline on stdout.
    if !body.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}
