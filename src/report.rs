//! Report entry points.
//!
//! A report run is strictly sequential: the research prompt needs the whole
//! parsed document, and the sanitizer needs the whole report. Both API
//! clients are built before any network I/O so a missing key fails fast
//! instead of after a multi-minute parse.

use crate::config::ReportConfig;
use crate::error::DiligenceError;
use crate::output::{ParsedDocument, ReportOutput, ReportStats};
use crate::pipeline::input::{self, LoadedPdf};
use crate::pipeline::parse::ParseClient;
use crate::pipeline::research::ResearchClient;
use crate::pipeline::sanitize::sanitize;
use crate::prompts::{research_prompt, DD_TEMPLATE};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Generate a due-diligence report for a PDF file or URL.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Every failure is fatal: input problems, a missing API key, a failed or
/// timed-out parse or research job, or a job that produced no text.
///
/// # Example
/// ```rust,no_run
/// use dd_checklist::{generate_report, ReportConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ReportConfig::from_env();
/// let report = generate_report("pitch-deck.pdf", &config).await?;
/// println!("{}", report.markdown);
/// # Ok(())
/// # }
/// ```
pub async fn generate_report(
    input_str: impl AsRef<str>,
    config: &ReportConfig,
) -> Result<ReportOutput, DiligenceError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting report: {}", input_str);

    let clients = Clients::from_config(config)?;
    let pdf = input::load_pdf(input_str, config.download_timeout_secs).await?;
    run(&clients, &pdf, config, total_start).await
}

/// Generate a report from PDF bytes already in memory.
///
/// `file_name` is what the document is uploaded as.
pub async fn generate_report_from_bytes(
    file_name: impl Into<String>,
    bytes: Vec<u8>,
    config: &ReportConfig,
) -> Result<ReportOutput, DiligenceError> {
    let total_start = Instant::now();
    let clients = Clients::from_config(config)?;
    let pdf = input::from_bytes(file_name, bytes)?;
    info!("Starting report: {} ({} bytes)", pdf.file_name, pdf.bytes.len());
    run(&clients, &pdf, config, total_start).await
}

/// Generate a report and write the sanitized Markdown to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn generate_report_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<ReportStats, DiligenceError> {
    let output = generate_report(input_str, config).await?;
    write_atomic(output_path.as_ref(), &output.markdown).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`generate_report`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_report_sync(
    input_str: impl AsRef<str>,
    config: &ReportConfig,
) -> Result<ReportOutput, DiligenceError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DiligenceError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_report(input_str, config))
}

/// Parse a PDF into Markdown without starting a research job.
///
/// Needs only the LlamaParse key.
pub async fn parse_document(
    input_str: impl AsRef<str>,
    config: &ReportConfig,
) -> Result<ParsedDocument, DiligenceError> {
    let parser = ParseClient::from_config(config)?;
    let pdf = input::load_pdf(input_str.as_ref(), config.download_timeout_secs).await?;
    parse_with_events(&parser, &pdf, config).await
}

/// Write `contents` to `path` through a sibling temp file.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), DiligenceError> {
    let write_failed = |source| DiligenceError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_failed)?;
    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

struct Clients {
    parser: ParseClient,
    researcher: ResearchClient,
}

impl Clients {
    fn from_config(config: &ReportConfig) -> Result<Self, DiligenceError> {
        Ok(Self {
            parser: ParseClient::from_config(config)?,
            researcher: ResearchClient::from_config(config)?,
        })
    }
}

async fn parse_with_events(
    parser: &ParseClient,
    pdf: &LoadedPdf,
    config: &ReportConfig,
) -> Result<ParsedDocument, DiligenceError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_parse_start(&pdf.file_name);
    }
    let doc = parser.parse(pdf).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_parse_complete(&doc.file_name, doc.pages.len());
    }
    Ok(doc)
}

async fn run(
    clients: &Clients,
    pdf: &LoadedPdf,
    config: &ReportConfig,
    total_start: Instant,
) -> Result<ReportOutput, DiligenceError> {
    // ── Step 1: Parse ────────────────────────────────────────────────────
    let parse_start = Instant::now();
    let source = parse_with_events(&clients.parser, pdf, config).await?;
    let parse_duration_ms = parse_start.elapsed().as_millis() as u64;

    // ── Step 2: Build the prompt ─────────────────────────────────────────
    let template = config.template.as_deref().unwrap_or(DD_TEMPLATE);
    let prompt = research_prompt(template, &source.markdown);
    debug!("Research prompt: {} chars", prompt.len());

    // ── Step 3: Deep research ────────────────────────────────────────────
    let research_start = Instant::now();
    let (job_id, raw_markdown, polls) = clients.researcher.run(&prompt).await?;
    let research_duration_ms = research_start.elapsed().as_millis() as u64;

    // ── Step 4: Sanitize ─────────────────────────────────────────────────
    let markdown = sanitize(&raw_markdown);

    let stats = ReportStats {
        source_pages: source.pages.len(),
        source_chars: source.markdown.chars().count(),
        report_chars: markdown.chars().count(),
        polls,
        parse_duration_ms,
        research_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Report complete: {} chars from {} source page(s), {}ms total",
        stats.report_chars, stats.source_pages, stats.total_duration_ms
    );

    Ok(ReportOutput {
        markdown,
        raw_markdown,
        job_id,
        source,
        stats,
    })
}
