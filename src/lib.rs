//! # dd-checklist
//!
//! Turn a venture pitch deck (PDF) into a researched due-diligence checklist
//! report in Markdown.
//!
//! ## Why this crate?
//!
//! Filling a due-diligence checklist by hand means reading the deck, then
//! researching the market, competitors and regulation behind every claim.
//! This crate hands the parsed deck to a deep-research model together with
//! a fixed checklist template and gets back the completed template. Model
//! output is full of typographic debris (NBSPs, zero-width joiners, smart
//! dashes, URL text fragments) so the last step is a deterministic
//! sanitizer that makes the report render cleanly.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     read local file or download from URL
//!  ├─ 2. Parse     LlamaParse agentic parse → per-page Markdown
//!  ├─ 3. Prompt    analyst instructions + checklist template + document
//!  ├─ 4. Research  background deep-research job, polled to completion
//!  └─ 5. Sanitize  Unicode cleanup, dash spacing, URL canonicalisation
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dd_checklist::{generate_report, ReportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Keys from LLAMA_CLOUD_API_KEY / OPENAI_API_KEY
//!     let config = ReportConfig::from_env();
//!     let report = generate_report("pitch-deck.pdf", &config).await?;
//!     println!("{}", report.markdown);
//!     eprintln!("{} polls, {}ms", report.stats.polls, report.stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! The sanitizer is usable on its own and needs no keys:
//!
//! ```rust
//! assert_eq!(
//!     dd_checklist::sanitize("see [docs](https://x.io/a\u{2013}b#:~:text=y)."),
//!     "see [docs](https://x.io/a-b)."
//! );
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `dd-checklist` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! dd-checklist = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ParseOptions, ReportConfig, ReportConfigBuilder};
pub use error::DiligenceError;
pub use output::{ParsedDocument, ParsedPage, ReportOutput, ReportStats};
pub use pipeline::sanitize::{clean_url, normalize, sanitize, sanitize_bare_urls, sanitize_links};
pub use progress::{NoopProgressCallback, ProgressCallback, ReportProgressCallback};
pub use report::{
    generate_report, generate_report_from_bytes, generate_report_sync, generate_report_to_file,
    parse_document,
};
