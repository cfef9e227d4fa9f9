//! Error types for the dd-checklist library.
//!
//! Every failure that stops a report from being produced is a
//! [`DiligenceError`]. The variants follow the report's stages (input,
//! parsing, research, output) so callers can tell a bad file apart from a
//! misbehaving upstream service without string matching.
//!
//! The sanitiser itself never fails; it is a pure `&str → String` function
//! and has no error type.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the dd-checklist library.
#[derive(Debug, Error)]
pub enum DiligenceError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a readable file path nor an HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{name}'\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: [u8; 4] },

    // ── Configuration errors ──────────────────────────────────────────────
    /// A required API key is not set.
    #[error("Missing {var} for {service}.\nExport it in the environment: export {var}=...")]
    MissingApiKey {
        var: &'static str,
        service: &'static str,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Parsing errors ────────────────────────────────────────────────────
    /// A request to the document-parsing service failed outright.
    #[error("LlamaParse {stage} request failed: {detail}")]
    ParseRequestFailed { stage: &'static str, detail: String },

    /// The parsing job finished in a failure state.
    #[error("LlamaParse job {job_id} ended with status {status}")]
    ParseJobFailed { job_id: String, status: String },

    /// The parsing job did not finish before the deadline.
    #[error("LlamaParse job {job_id} did not finish within {secs}s")]
    ParseTimeout { job_id: String, secs: u64 },

    /// Parsing succeeded but produced no text at all.
    #[error("No Markdown was extracted from '{file_name}'")]
    EmptyDocument { file_name: String },

    // ── Research errors ───────────────────────────────────────────────────
    /// Submitting the background research job failed.
    #[error("Failed to submit deep research job: {detail}")]
    ResearchSubmitFailed { detail: String },

    /// The research endpoint accepted the request but returned no job id.
    #[error("Did not receive a job id from the research API")]
    MissingJobId,

    /// The research job reached a terminal failure status.
    ///
    /// `payload` holds the pretty-printed job JSON for diagnosis.
    #[error("Research job {job_id} status: {status}")]
    ResearchJobFailed {
        job_id: String,
        status: String,
        payload: String,
    },

    /// The research job did not complete before the deadline.
    #[error("Research job {job_id} still running after {secs}s")]
    ResearchTimeout { job_id: String, secs: u64 },

    /// The job completed but carried no output text.
    #[error("No text returned from deep research job {job_id}")]
    NoResearchOutput { job_id: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
