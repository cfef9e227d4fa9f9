//! Result types returned by the report pipeline.

use serde::{Deserialize, Serialize};

/// One page of parser output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPage {
    /// 1-indexed page number as reported by the parser.
    pub page: usize,
    /// Page Markdown. Empty when the parser returned none.
    pub md: String,
}

/// The parsed source document that feeds the research prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// File name the PDF was uploaded under.
    pub file_name: String,
    /// LlamaParse job id.
    pub job_id: String,
    /// Per-page Markdown in parser order.
    pub pages: Vec<ParsedPage>,
    /// Pages joined (with optional `---` breaks) and trimmed.
    pub markdown: String,
}

/// Timing and size figures for one report run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportStats {
    /// Pages returned by the parser.
    pub source_pages: usize,
    /// Characters of parsed Markdown sent to the research job.
    pub source_chars: usize,
    /// Characters in the final (sanitised) report.
    pub report_chars: usize,
    /// Status polls made while waiting for the research job.
    pub polls: u32,
    pub parse_duration_ms: u64,
    pub research_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// A finished due-diligence report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
    /// Sanitised report Markdown, ready to render.
    pub markdown: String,
    /// Report text exactly as the research job returned it.
    pub raw_markdown: String,
    /// Research job id.
    pub job_id: String,
    /// The parsed source document.
    pub source: ParsedDocument,
    pub stats: ReportStats,
}
