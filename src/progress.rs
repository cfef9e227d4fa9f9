//! Progress-callback trait for report-generation events.
//!
//! Inject an [`Arc<dyn ReportProgressCallback>`] via
//! [`crate::config::ReportConfigBuilder::progress_callback`] to receive
//! events as the document is parsed and the research job runs.
//!
//! The research job is a black box that only reports a coarse status, so
//! the percentage passed to [`ReportProgressCallback::on_research_progress`]
//! is an estimate driven by elapsed time (see
//! [`crate::pipeline::research::next_progress`]). It only ever moves forward
//! and reaches 100 when the job stops.
//!
//! # Example
//!
//! ```rust
//! use dd_checklist::{ReportConfig, ReportProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicU8, Ordering}};
//!
//! struct LastPercent(AtomicU8);
//!
//! impl ReportProgressCallback for LastPercent {
//!     fn on_research_progress(&self, percent: u8, _status: &str) {
//!         self.0.store(percent, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = ReportConfig::builder()
//!     .progress_callback(Arc::new(LastPercent(AtomicU8::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the report pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ReportProgressCallback: Send + Sync {
    /// Called before the PDF is uploaded for parsing.
    fn on_parse_start(&self, file_name: &str) {
        let _ = file_name;
    }

    /// Called once the parsed Markdown has been assembled.
    ///
    /// # Arguments
    /// * `file_name` — name the PDF was uploaded under
    /// * `pages`     — number of pages the parser returned
    fn on_parse_complete(&self, file_name: &str, pages: usize) {
        let _ = (file_name, pages);
    }

    /// Called when the background research job has been accepted.
    fn on_research_submitted(&self, job_id: &str) {
        let _ = job_id;
    }

    /// Called after every status poll.
    ///
    /// # Arguments
    /// * `percent` — estimated completion, 0–100, never decreasing
    /// * `status`  — raw status string reported by the API
    fn on_research_progress(&self, percent: u8, status: &str) {
        let _ = (percent, status);
    }

    /// Called once when the research job stops, successfully or not.
    fn on_research_complete(&self, success: bool) {
        let _ = success;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ReportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReportConfig`].
pub type ProgressCallback = Arc<dyn ReportProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ReportProgressCallback for Recorder {
        fn on_parse_start(&self, file_name: &str) {
            self.events.lock().unwrap().push(format!("parse:{file_name}"));
        }

        fn on_parse_complete(&self, _file_name: &str, pages: usize) {
            self.events.lock().unwrap().push(format!("parsed:{pages}"));
        }

        fn on_research_progress(&self, percent: u8, _status: &str) {
            self.events.lock().unwrap().push(format!("{percent}%"));
        }

        fn on_research_complete(&self, success: bool) {
            self.events.lock().unwrap().push(format!("done:{success}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_parse_start("deck.pdf");
        cb.on_parse_complete("deck.pdf", 12);
        cb.on_research_submitted("resp_1");
        cb.on_research_progress(50, "in_progress");
        cb.on_research_complete(true);
    }

    #[test]
    fn recorder_receives_events_in_order() {
        let rec = Recorder::default();
        rec.on_parse_start("deck.pdf");
        rec.on_parse_complete("deck.pdf", 3);
        rec.on_research_submitted("ignored by recorder");
        rec.on_research_progress(5, "queued");
        rec.on_research_progress(100, "completed");
        rec.on_research_complete(true);
        assert_eq!(
            *rec.events.lock().unwrap(),
            vec!["parse:deck.pdf", "parsed:3", "5%", "100%", "done:true"]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_research_progress(10, "in_progress");
    }
}
