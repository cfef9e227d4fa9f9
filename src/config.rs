//! Configuration types for due-diligence report generation.
//!
//! All behaviour is controlled through [`ReportConfig`], built via its
//! [`ReportConfigBuilder`] or loaded with [`ReportConfig::from_env`].
//!
//! API keys are optional at build time. Each stage checks for the key it
//! needs when it runs, so `--parse-only` works without an OpenAI key and
//! `--sanitize-only` needs no key at all.

use crate::error::DiligenceError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default LlamaParse endpoint (US region).
pub const LLAMA_DEFAULT_BASE_URL: &str = "https://api.cloud.llamaindex.ai";

/// LlamaParse EU region endpoint, selected with `LLAMA_CLOUD_BASE_URL=eu`.
pub const LLAMA_EU_BASE_URL: &str = "https://api.cloud.eu.llamaindex.ai";

/// Default OpenAI API root.
pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default deep-research model.
pub const DEFAULT_RESEARCH_MODEL: &str = "o4-mini-deep-research";

/// Configuration for a due-diligence report run.
///
/// # Example
/// ```rust
/// use dd_checklist::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .llama_api_key("llx-test")
///     .openai_api_key("sk-test")
///     .max_tool_calls(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tool_calls, 60);
/// ```
#[derive(Clone)]
pub struct ReportConfig {
    /// LlamaParse API key (`LLAMA_CLOUD_API_KEY`).
    pub llama_api_key: Option<String>,

    /// LlamaParse API root. Default: [`LLAMA_DEFAULT_BASE_URL`].
    pub llama_base_url: String,

    /// OpenAI API key (`OPENAI_API_KEY`).
    pub openai_api_key: Option<String>,

    /// OpenAI API root, up to and including `/v1`. Default: [`OPENAI_DEFAULT_BASE_URL`].
    pub openai_base_url: String,

    /// Options sent with the PDF upload.
    pub parse: ParseOptions,

    /// Deep-research model id. Default: `o4-mini-deep-research`.
    pub research_model: String,

    /// Give the research job the `web_search_preview` tool. Default: true.
    pub web_search: bool,

    /// Give the research job a `code_interpreter` with an auto container. Default: true.
    pub code_interpreter: bool,

    /// Upper bound on tool calls the research job may make. Default: 120.
    pub max_tool_calls: u32,

    /// Delay between research status polls in milliseconds. Default: 3000.
    pub poll_interval_ms: u64,

    /// Delay between parse-job status polls in milliseconds. Default: 2000.
    pub parse_poll_interval_ms: u64,

    /// Timeout for a single HTTP request in seconds. Default: 3600.
    pub request_timeout_secs: u64,

    /// Give up on the parse job after this many seconds. Default: 1800.
    pub parse_timeout_secs: u64,

    /// Give up on the research job after this many seconds. Default: 3600.
    pub research_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Custom report template. If None, uses [`crate::prompts::DD_TEMPLATE`].
    pub template: Option<String>,

    /// Receives parse and research progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            llama_api_key: None,
            llama_base_url: LLAMA_DEFAULT_BASE_URL.to_string(),
            openai_api_key: None,
            openai_base_url: OPENAI_DEFAULT_BASE_URL.to_string(),
            parse: ParseOptions::default(),
            research_model: DEFAULT_RESEARCH_MODEL.to_string(),
            web_search: true,
            code_interpreter: true,
            max_tool_calls: 120,
            poll_interval_ms: 3000,
            parse_poll_interval_ms: 2000,
            request_timeout_secs: 3600,
            parse_timeout_secs: 1800,
            research_timeout_secs: 3600,
            download_timeout_secs: 120,
            template: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("llama_api_key", &self.llama_api_key.as_ref().map(|_| "<redacted>"))
            .field("llama_base_url", &self.llama_base_url)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("openai_base_url", &self.openai_base_url)
            .field("parse", &self.parse)
            .field("research_model", &self.research_model)
            .field("web_search", &self.web_search)
            .field("code_interpreter", &self.code_interpreter)
            .field("max_tool_calls", &self.max_tool_calls)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("research_timeout_secs", &self.research_timeout_secs)
            .field("template", &self.template.as_ref().map(|t| t.len()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ReportProgressCallback>"),
            )
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load keys and endpoints from the process environment.
    ///
    /// Reads `LLAMA_CLOUD_API_KEY`, `LLAMA_CLOUD_BASE_URL`, `OPENAI_API_KEY`
    /// and `OPENAI_BASE_URL`; everything else keeps its default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            llama_api_key: get("LLAMA_CLOUD_API_KEY"),
            llama_base_url: resolve_llama_base_url(get("LLAMA_CLOUD_BASE_URL").as_deref()),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| OPENAI_DEFAULT_BASE_URL.to_string()),
            ..Self::default()
        }
    }

    /// The LlamaParse key, or [`DiligenceError::MissingApiKey`].
    pub fn require_llama_key(&self) -> Result<&str, DiligenceError> {
        self.llama_api_key
            .as_deref()
            .ok_or(DiligenceError::MissingApiKey {
                var: "LLAMA_CLOUD_API_KEY",
                service: "LlamaParse",
            })
    }

    /// The OpenAI key, or [`DiligenceError::MissingApiKey`].
    pub fn require_openai_key(&self) -> Result<&str, DiligenceError> {
        self.openai_api_key
            .as_deref()
            .ok_or(DiligenceError::MissingApiKey {
                var: "OPENAI_API_KEY",
                service: "deep research",
            })
    }
}

/// Map a configured LlamaParse base URL to the endpoint to call.
///
/// `None` or blank selects the default region; `eu` (any case) is shorthand
/// for [`LLAMA_EU_BASE_URL`]; anything else is used verbatim.
pub fn resolve_llama_base_url(value: Option<&str>) -> String {
    match value.map(str::trim) {
        None | Some("") => LLAMA_DEFAULT_BASE_URL.to_string(),
        Some(v) if v.eq_ignore_ascii_case("eu") => LLAMA_EU_BASE_URL.to_string(),
        Some(v) => v.trim_end_matches('/').to_string(),
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn llama_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.llama_api_key = Some(key.into());
        self
    }

    pub fn llama_base_url(mut self, url: impl AsRef<str>) -> Self {
        self.config.llama_base_url = resolve_llama_base_url(Some(url.as_ref()));
        self
    }

    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.openai_api_key = Some(key.into());
        self
    }

    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.openai_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn parse_options(mut self, options: ParseOptions) -> Self {
        self.config.parse = options;
        self
    }

    pub fn research_model(mut self, model: impl Into<String>) -> Self {
        self.config.research_model = model.into();
        self
    }

    pub fn web_search(mut self, v: bool) -> Self {
        self.config.web_search = v;
        self
    }

    pub fn code_interpreter(mut self, v: bool) -> Self {
        self.config.code_interpreter = v;
        self
    }

    pub fn max_tool_calls(mut self, n: u32) -> Self {
        self.config.max_tool_calls = n;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn parse_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.parse_poll_interval_ms = ms;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn parse_timeout_secs(mut self, secs: u64) -> Self {
        self.config.parse_timeout_secs = secs;
        self
    }

    pub fn research_timeout_secs(mut self, secs: u64) -> Self {
        self.config.research_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.config.template = Some(template.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, DiligenceError> {
        let c = &self.config;
        if c.max_tool_calls == 0 {
            return Err(DiligenceError::InvalidConfig(
                "max_tool_calls must be ≥ 1".into(),
            ));
        }
        if c.poll_interval_ms < 10 || c.parse_poll_interval_ms < 10 {
            return Err(DiligenceError::InvalidConfig(format!(
                "poll intervals must be ≥ 10ms, got {} / {}",
                c.poll_interval_ms, c.parse_poll_interval_ms
            )));
        }
        if c.request_timeout_secs == 0
            || c.parse_timeout_secs == 0
            || c.research_timeout_secs == 0
            || c.download_timeout_secs == 0
        {
            return Err(DiligenceError::InvalidConfig(
                "timeouts must be ≥ 1s".into(),
            ));
        }
        if c.research_model.trim().is_empty() {
            return Err(DiligenceError::InvalidConfig(
                "research model must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Parse options ────────────────────────────────────────────────────────

/// Options for the LlamaParse upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// LlamaParse mode. Default: `parse_document_with_agent` (document-wide agent).
    pub parse_mode: String,
    /// Emit tables as HTML instead of GFM pipes. Default: true.
    pub output_tables_as_html: bool,
    /// Drop running page headers. Default: false.
    pub hide_headers: bool,
    /// Drop running page footers. Default: false.
    pub hide_footers: bool,
    /// Insert a `---` rule between pages in the assembled Markdown. Default: true.
    pub show_page_breaks: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            parse_mode: "parse_document_with_agent".to_string(),
            output_tables_as_html: true,
            hide_headers: false,
            hide_footers: false,
            show_page_breaks: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let c = ReportConfig::default();
        assert_eq!(c.research_model, "o4-mini-deep-research");
        assert_eq!(c.max_tool_calls, 120);
        assert_eq!(c.poll_interval_ms, 3000);
        assert!(c.web_search && c.code_interpreter);
        assert!(c.parse.output_tables_as_html);
        assert!(c.parse.show_page_breaks);
    }

    #[test]
    fn eu_alias_resolves() {
        assert_eq!(resolve_llama_base_url(Some(" EU ")), LLAMA_EU_BASE_URL);
        assert_eq!(resolve_llama_base_url(Some("eu")), LLAMA_EU_BASE_URL);
        assert_eq!(resolve_llama_base_url(None), LLAMA_DEFAULT_BASE_URL);
        assert_eq!(resolve_llama_base_url(Some("  ")), LLAMA_DEFAULT_BASE_URL);
        assert_eq!(
            resolve_llama_base_url(Some("http://127.0.0.1:9000/")),
            "http://127.0.0.1:9000"
        );
    }

    #[test]
    fn from_lookup_reads_keys() {
        let env: HashMap<&str, &str> = [
            ("LLAMA_CLOUD_API_KEY", " llx-abc "),
            ("LLAMA_CLOUD_BASE_URL", "eu"),
            ("OPENAI_API_KEY", ""),
        ]
        .into_iter()
        .collect();
        let c = ReportConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(c.llama_api_key.as_deref(), Some("llx-abc"));
        assert_eq!(c.llama_base_url, LLAMA_EU_BASE_URL);
        assert!(c.openai_api_key.is_none(), "blank key counts as missing");
        assert_eq!(c.openai_base_url, OPENAI_DEFAULT_BASE_URL);
    }

    #[test]
    fn missing_keys_are_reported_by_name() {
        let c = ReportConfig::default();
        let err = c.require_openai_key().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
        let err = c.require_llama_key().unwrap_err();
        assert!(err.to_string().contains("LLAMA_CLOUD_API_KEY"));
    }

    #[test]
    fn debug_redacts_keys() {
        let c = ReportConfig::builder()
            .openai_api_key("sk-secret")
            .llama_api_key("llx-secret")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret"), "got: {dbg}");
    }

    #[test]
    fn build_rejects_zero_tool_calls() {
        let err = ReportConfig::builder().max_tool_calls(0).build().unwrap_err();
        assert!(matches!(err, DiligenceError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_tiny_poll_interval() {
        assert!(ReportConfig::builder().poll_interval_ms(1).build().is_err());
    }
}
