//! Document parsing: PDF → Markdown via the LlamaParse REST API.
//!
//! ## Job lifecycle
//!
//! ```text
//! POST /api/v1/parsing/upload          → { id, status: PENDING }
//! GET  /api/v1/parsing/job/{id}        → poll until SUCCESS
//! GET  /api/v1/parsing/job/{id}/result/json → { pages: [{ page, md }] }
//! ```
//!
//! The agentic parse mode works on the whole document at once but still
//! returns per-page Markdown, so the pages are stitched back together here.

use crate::config::{ParseOptions, ReportConfig};
use crate::error::DiligenceError;
use crate::output::{ParsedDocument, ParsedPage};
use crate::pipeline::http;
use crate::pipeline::input::LoadedPdf;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Inserted between pages when page breaks are enabled.
pub const PAGE_BREAK: &str = "\n---\n";

/// Coarse state of a parse job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseJobState {
    Pending,
    Done,
    Failed,
}

/// Map a LlamaParse job status string to a [`ParseJobState`].
pub fn classify_parse_status(status: &str) -> ParseJobState {
    match status.to_ascii_uppercase().as_str() {
        "SUCCESS" | "PARTIAL_SUCCESS" => ParseJobState::Done,
        "ERROR" | "CANCELED" | "CANCELLED" | "FAILED" => ParseJobState::Failed,
        _ => ParseJobState::Pending,
    }
}

/// Join page Markdown into one document.
///
/// With `show_page_breaks`, a `---` rule precedes every page after the first.
/// The result is trimmed.
pub fn assemble_markdown(pages: &[ParsedPage], show_page_breaks: bool) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        if show_page_breaks && i > 0 {
            out.push_str(PAGE_BREAK);
        }
        out.push_str(&page.md);
    }
    out.trim().to_string()
}

/// Client for one LlamaParse account.
#[derive(Clone)]
pub struct ParseClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    options: ParseOptions,
    poll_interval: Duration,
    timeout_secs: u64,
}

impl std::fmt::Debug for ParseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseClient")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .field("poll_interval", &self.poll_interval)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonResult {
    #[serde(default)]
    pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    md: Option<String>,
}

impl ParseClient {
    /// Build a client from the report configuration.
    ///
    /// Fails with [`DiligenceError::MissingApiKey`] when no LlamaParse key is set.
    pub fn from_config(config: &ReportConfig) -> Result<Self, DiligenceError> {
        let api_key = config.require_llama_key()?.to_string();
        let client = http::client(config.request_timeout_secs).map_err(|e| {
            DiligenceError::Internal(format!("Failed to build HTTP client: {e}"))
        })?;
        Ok(Self {
            client,
            base_url: config.llama_base_url.clone(),
            api_key,
            options: config.parse.clone(),
            poll_interval: Duration::from_millis(config.parse_poll_interval_ms),
            timeout_secs: config.parse_timeout_secs,
        })
    }

    /// Upload, wait for, and assemble one document.
    pub async fn parse(&self, pdf: &LoadedPdf) -> Result<ParsedDocument, DiligenceError> {
        let job_id = self.upload(pdf).await?;
        self.wait(&job_id).await?;
        let pages = self.pages(&job_id).await?;
        let markdown = assemble_markdown(&pages, self.options.show_page_breaks);
        if markdown.is_empty() {
            return Err(DiligenceError::EmptyDocument {
                file_name: pdf.file_name.clone(),
            });
        }
        info!(
            "Parsed {} page(s) from {} ({} chars)",
            pages.len(),
            pdf.file_name,
            markdown.len()
        );
        Ok(ParsedDocument {
            file_name: pdf.file_name.clone(),
            job_id,
            pages,
            markdown,
        })
    }

    /// Upload the PDF and return the parse job id.
    pub async fn upload(&self, pdf: &LoadedPdf) -> Result<String, DiligenceError> {
        let failed = |detail: String| DiligenceError::ParseRequestFailed {
            stage: "upload",
            detail,
        };

        let part = reqwest::multipart::Part::bytes(pdf.bytes.clone())
            .file_name(pdf.file_name.clone())
            .mime_str("application/pdf")
            .map_err(|e| failed(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("parse_mode", self.options.parse_mode.clone())
            .text("result_type", "markdown")
            .text(
                "output_tables_as_HTML",
                self.options.output_tables_as_html.to_string(),
            )
            .text("hide_headers", self.options.hide_headers.to_string())
            .text("hide_footers", self.options.hide_footers.to_string());

        let resp = self
            .client
            .post(http::endpoint(&self.base_url, "api/v1/parsing/upload"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(failed(http::error_detail(resp).await));
        }

        let job: JobResponse = resp.json().await.map_err(|e| failed(e.to_string()))?;
        if job.id.is_empty() {
            return Err(failed("response carried no job id".to_string()));
        }
        info!("Uploaded {} as parse job {}", pdf.file_name, job.id);
        Ok(job.id)
    }

    /// Fetch the current status string of a parse job.
    pub async fn status(&self, job_id: &str) -> Result<String, DiligenceError> {
        let failed = |detail: String| DiligenceError::ParseRequestFailed {
            stage: "status",
            detail,
        };
        let resp = self
            .client
            .get(http::endpoint(
                &self.base_url,
                &format!("api/v1/parsing/job/{job_id}"),
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(failed(http::error_detail(resp).await));
        }
        let job: JobResponse = resp.json().await.map_err(|e| failed(e.to_string()))?;
        Ok(job.status.unwrap_or_default())
    }

    /// Poll until the job finishes, fails, or the deadline passes.
    ///
    /// A failed status request is logged and polled again.
    pub async fn wait(&self, job_id: &str) -> Result<(), DiligenceError> {
        let started = Instant::now();
        loop {
            match self.status(job_id).await {
                Ok(status) => {
                    debug!("Parse job {}: {}", job_id, status);
                    match classify_parse_status(&status) {
                        ParseJobState::Done => return Ok(()),
                        ParseJobState::Failed => {
                            return Err(DiligenceError::ParseJobFailed {
                                job_id: job_id.to_string(),
                                status,
                            })
                        }
                        ParseJobState::Pending => {}
                    }
                }
                Err(e) => warn!("Parse job {}: status check failed — {}", job_id, e),
            }

            if started.elapsed() >= Duration::from_secs(self.timeout_secs) {
                return Err(DiligenceError::ParseTimeout {
                    job_id: job_id.to_string(),
                    secs: self.timeout_secs,
                });
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Download the per-page Markdown of a finished job.
    pub async fn pages(&self, job_id: &str) -> Result<Vec<ParsedPage>, DiligenceError> {
        let failed = |detail: String| DiligenceError::ParseRequestFailed {
            stage: "result",
            detail,
        };
        let resp = self
            .client
            .get(http::endpoint(
                &self.base_url,
                &format!("api/v1/parsing/job/{job_id}/result/json"),
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(failed(http::error_detail(resp).await));
        }
        let result: JsonResult = resp.json().await.map_err(|e| failed(e.to_string()))?;

        Ok(result
            .pages
            .into_iter()
            .enumerate()
            .map(|(i, p)| ParsedPage {
                page: p.page.unwrap_or(i + 1),
                md: p.md.unwrap_or_default(),
            })
            .collect())
    }
}
