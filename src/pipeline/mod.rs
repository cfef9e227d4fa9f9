//! Pipeline stages for PDF-to-report generation.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the two network clients can be pointed at stub servers.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ parse ──▶ prompt ──▶ research ──▶ sanitize
//! (URL/path) (LlamaParse) (template) (Responses API) (cleanup)
//! ```
//!
//! 1. [`input`]    load the user-supplied path or URL into memory
//! 2. [`parse`]    upload to LlamaParse and assemble the page Markdown
//! 3. [`crate::prompts`] wrap the Markdown in the checklist prompt
//! 4. [`research`] run the background deep-research job and poll it
//! 5. [`sanitize`] deterministic text cleanup so the report renders cleanly

pub(crate) mod http;
pub mod input;
pub mod parse;
pub mod research;
pub mod sanitize;
