//! Deep research: a background job on the OpenAI Responses API.
//!
//! The job is submitted with `background: true` and then polled until it
//! stops. A deep-research run usually takes 5–30 minutes, so there is no
//! useful progress signal beyond the status string; [`next_progress`] turns
//! elapsed time into a monotonically increasing percentage for the UI.

use crate::config::ReportConfig;
use crate::error::DiligenceError;
use crate::pipeline::http;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Percentage reported before the first poll.
pub const INITIAL_PROGRESS: u8 = 5;

/// Coarse state of a research job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// `queued`, `in_progress`, `unknown`, or no status at all.
    Pending,
    Completed,
    /// `failed`, `cancelled`, `errored`, `incomplete`.
    Failed,
    /// A status this client does not know about. Keep polling.
    Other,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// Classify a Responses API status string.
pub fn classify_status(status: Option<&str>) -> JobState {
    match status {
        None | Some("queued") | Some("in_progress") | Some("unknown") => JobState::Pending,
        Some("completed") => JobState::Completed,
        Some("failed") | Some("cancelled") | Some("errored") | Some("incomplete") => {
            JobState::Failed
        }
        Some(_) => JobState::Other,
    }
}

/// Next progress percentage after a poll.
///
/// Pending jobs creep up with elapsed time (one point per four seconds after
/// a base of 10) and stop at 95. Unknown statuses nudge by one and stop at 98.
/// The value never decreases.
pub fn next_progress(pct: u8, state: JobState, elapsed_secs: u64) -> u8 {
    match state {
        JobState::Completed | JobState::Failed => 100,
        JobState::Pending => {
            let by_time = 10u64.saturating_add(elapsed_secs / 4);
            by_time.max(u64::from(pct)).min(95) as u8
        }
        JobState::Other => pct.saturating_add(1).min(98),
    }
}

/// A Responses API object, reduced to the fields this crate reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchJob {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Convenience aggregate some API versions include.
    #[serde(default)]
    pub output_text: Option<String>,
    /// Output items, kept as raw JSON since most types are ignored.
    #[serde(default)]
    pub output: Vec<Value>,
    /// The full response body.
    #[serde(skip)]
    pub raw: Value,
}

impl ResearchJob {
    fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        let mut job: ResearchJob = serde_json::from_value(raw.clone())?;
        job.raw = raw;
        Ok(job)
    }

    pub fn state(&self) -> JobState {
        classify_status(self.status.as_deref())
    }
}

/// Extract the report text from a finished job.
///
/// Prefers the top-level `output_text`; otherwise joins the `output_text`
/// parts of every `message` item with newlines. Returns `None` when nothing
/// but whitespace is left.
pub fn output_text(job: &ResearchJob) -> Option<String> {
    if let Some(text) = job.output_text.as_deref().filter(|t| !t.is_empty()) {
        return Some(text.to_string());
    }

    let chunks: Vec<&str> = job
        .output
        .iter()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("message"))
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    let text = chunks.join("\n").trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    model: &'a str,
    input: &'a str,
    background: bool,
    tools: Vec<Value>,
    max_tool_calls: u32,
}

/// Client for the Responses API.
#[derive(Clone)]
pub struct ResearchClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    tools: Vec<Value>,
    max_tool_calls: u32,
    poll_interval: Duration,
    timeout_secs: u64,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for ResearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("tools", &self.tools)
            .field("max_tool_calls", &self.max_tool_calls)
            .field("poll_interval", &self.poll_interval)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl ResearchClient {
    /// Build a client from the report configuration.
    pub fn from_config(config: &ReportConfig) -> Result<Self, DiligenceError> {
        let api_key = config.require_openai_key()?.to_string();
        let client = http::client(config.request_timeout_secs).map_err(|e| {
            DiligenceError::Internal(format!("Failed to build HTTP client: {e}"))
        })?;
        Ok(Self {
            client,
            base_url: config.openai_base_url.clone(),
            api_key,
            model: config.research_model.clone(),
            tools: research_tools(config),
            max_tool_calls: config.max_tool_calls,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            timeout_secs: config.research_timeout_secs,
            progress: config.progress_callback.clone(),
        })
    }

    /// Submit a background job and return its id.
    pub async fn submit(&self, prompt: &str) -> Result<String, DiligenceError> {
        let body = CreateRequest {
            model: &self.model,
            input: prompt,
            background: true,
            tools: self.tools.clone(),
            max_tool_calls: self.max_tool_calls,
        };

        let resp = self
            .client
            .post(http::endpoint(&self.base_url, "responses"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DiligenceError::ResearchSubmitFailed {
                detail: e.to_string(),
            })?;
        if !resp.status().is_success() {
            return Err(DiligenceError::ResearchSubmitFailed {
                detail: http::error_detail(resp).await,
            });
        }

        let job: ResearchJob =
            resp.json()
                .await
                .map_err(|e| DiligenceError::ResearchSubmitFailed {
                    detail: e.to_string(),
                })?;
        let id = job
            .id
            .filter(|id| !id.is_empty())
            .ok_or(DiligenceError::MissingJobId)?;

        info!("Research job submitted: {} (model {})", id, self.model);
        if let Some(cb) = &self.progress {
            cb.on_research_submitted(&id);
        }
        Ok(id)
    }

    /// Fetch the current state of a job.
    pub async fn fetch(&self, job_id: &str) -> Result<ResearchJob, DiligenceError> {
        let failed = |detail: String| DiligenceError::Internal(format!(
            "Fetching research job {job_id} failed: {detail}"
        ));
        let resp = self
            .client
            .get(http::endpoint(&self.base_url, &format!("responses/{job_id}")))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(failed(http::error_detail(resp).await));
        }
        let raw: Value = resp.json().await.map_err(|e| failed(e.to_string()))?;
        ResearchJob::from_value(raw).map_err(|e| failed(e.to_string()))
    }

    /// Poll until the job completes.
    ///
    /// Returns the completed job and the number of polls made. A failed
    /// fetch is logged and polled again; a failed job or the deadline ends
    /// the wait with an error.
    pub async fn wait(&self, job_id: &str) -> Result<(ResearchJob, u32), DiligenceError> {
        let started = Instant::now();
        let deadline = Duration::from_secs(self.timeout_secs);
        let mut pct = INITIAL_PROGRESS;
        let mut polls = 0u32;
        self.report_progress(pct, "queued");

        loop {
            if started.elapsed() >= deadline {
                self.report_complete(false);
                return Err(DiligenceError::ResearchTimeout {
                    job_id: job_id.to_string(),
                    secs: self.timeout_secs,
                });
            }

            sleep(self.poll_interval).await;
            polls += 1;

            let job = match self.fetch(job_id).await {
                Ok(job) => job,
                Err(e) => {
                    warn!("Research job {}: poll {} failed — {}", job_id, polls, e);
                    continue;
                }
            };

            let status = job.status.clone().unwrap_or_else(|| "unknown".to_string());
            let state = job.state();
            pct = next_progress(pct, state, started.elapsed().as_secs());
            debug!("Research job {}: {} ({}%)", job_id, status, pct);
            self.report_progress(pct, &status);

            match state {
                JobState::Completed => {
                    info!(
                        "Research job {} completed after {} poll(s) in {:.0}s",
                        job_id,
                        polls,
                        started.elapsed().as_secs_f64()
                    );
                    self.report_complete(true);
                    return Ok((job, polls));
                }
                JobState::Failed => {
                    self.report_complete(false);
                    let payload = serde_json::to_string_pretty(&job.raw)
                        .unwrap_or_else(|_| job.raw.to_string());
                    return Err(DiligenceError::ResearchJobFailed {
                        job_id: job_id.to_string(),
                        status,
                        payload,
                    });
                }
                JobState::Pending | JobState::Other => {}
            }
        }
    }

    /// Submit, wait, and extract the report text.
    ///
    /// Returns `(job_id, text, polls)`.
    pub async fn run(&self, prompt: &str) -> Result<(String, String, u32), DiligenceError> {
        let job_id = self.submit(prompt).await?;
        let (job, polls) = self.wait(&job_id).await?;
        let text = output_text(&job).ok_or_else(|| DiligenceError::NoResearchOutput {
            job_id: job_id.clone(),
        })?;
        Ok((job_id, text, polls))
    }

    fn report_progress(&self, pct: u8, status: &str) {
        if let Some(cb) = &self.progress {
            cb.on_research_progress(pct, status);
        }
    }

    fn report_complete(&self, success: bool) {
        if let Some(cb) = &self.progress {
            cb.on_research_complete(success);
        }
    }
}

/// The tool list sent with the job.
pub fn research_tools(config: &ReportConfig) -> Vec<Value> {
    let mut tools = Vec::new();
    if config.web_search {
        tools.push(json!({ "type": "web_search_preview" }));
    }
    if config.code_interpreter {
        tools.push(json!({
            "type": "code_interpreter",
            "container": { "type": "auto" }
        }));
    }
    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(v: Value) -> ResearchJob {
        ResearchJob::from_value(v).unwrap()
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(None), JobState::Pending);
        assert_eq!(classify_status(Some("queued")), JobState::Pending);
        assert_eq!(classify_status(Some("in_progress")), JobState::Pending);
        assert_eq!(classify_status(Some("completed")), JobState::Completed);
        assert_eq!(classify_status(Some("cancelled")), JobState::Failed);
        assert_eq!(classify_status(Some("incomplete")), JobState::Failed);
        assert_eq!(classify_status(Some("requires_action")), JobState::Other);
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Other.is_terminal());
    }

    #[test]
    fn test_progress_pending_tracks_time() {
        assert_eq!(next_progress(5, JobState::Pending, 0), 10);
        assert_eq!(next_progress(10, JobState::Pending, 40), 20);
        assert_eq!(next_progress(60, JobState::Pending, 40), 60, "never decreases");
        assert_eq!(next_progress(90, JobState::Pending, 10_000), 95);
    }

    #[test]
    fn test_progress_other_and_terminal() {
        assert_eq!(next_progress(40, JobState::Other, 0), 41);
        assert_eq!(next_progress(98, JobState::Other, 0), 98);
        assert_eq!(next_progress(255, JobState::Other, 0), 98);
        assert_eq!(next_progress(12, JobState::Completed, 3), 100);
        assert_eq!(next_progress(12, JobState::Failed, 3), 100);
    }

    #[test]
    fn test_output_text_prefers_top_level() {
        let j = job(json!({
            "id": "resp_1",
            "status": "completed",
            "output_text": "# Report",
            "output": [{"type": "message", "content": [{"type": "output_text", "text": "ignored"}]}]
        }));
        assert_eq!(output_text(&j).as_deref(), Some("# Report"));
    }

    #[test]
    fn test_output_text_joins_message_chunks() {
        let j = job(json!({
            "status": "completed",
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "web_search_call", "status": "completed"},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "  # Part one"},
                    {"type": "refusal", "refusal": "no"},
                    {"type": "output_text", "text": "Part two  "}
                ]}
            ]
        }));
        assert_eq!(output_text(&j).as_deref(), Some("# Part one\nPart two"));
    }

    #[test]
    fn test_output_text_empty() {
        let j = job(json!({"status": "completed", "output_text": "", "output": []}));
        assert!(output_text(&j).is_none());
        let j = job(json!({"status": "completed", "output": [
            {"type": "message", "content": [{"type": "output_text", "text": "  \n"}]}
        ]}));
        assert!(output_text(&j).is_none());
    }

    #[test]
    fn test_raw_payload_kept() {
        let j = job(json!({"id": "resp_9", "status": "failed", "error": {"code": "server_error"}}));
        assert_eq!(j.state(), JobState::Failed);
        assert_eq!(j.raw["error"]["code"], "server_error");
    }

    #[test]
    fn test_research_tools() {
        let c = ReportConfig::default();
        let tools = research_tools(&c);
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["type"], "web_search_preview");
        assert_eq!(tools[1]["container"]["type"], "auto");

        let c = ReportConfig::builder().code_interpreter(false).build().unwrap();
        assert_eq!(research_tools(&c), vec![json!({"type": "web_search_preview"})]);
    }

    #[test]
    fn test_from_config_requires_key() {
        let err = ResearchClient::from_config(&ReportConfig::default()).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
