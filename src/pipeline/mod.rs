//! Pipeline stages for a briefing.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ scratch ──▶ extract ──▶ postprocess ──▶ analyze
//! (bytes)   (.pdf file)  (pdfium)    (cleanup)       (LLM)
//! ```
//!
//! 1. [`scratch`]: stage the uploaded bytes in a per-request temp file
//! 2. [`extract`]: pull per-page text out of the PDF; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`postprocess`]: deterministic text cleanup before the text is
//!    assembled into Markdown
//! 4. [`analyze`]: one crew task over the Markdown; the only stage with
//!    network I/O
//!
//! The two collaborator stages sit behind traits ([`DocumentConverter`],
//! [`DocumentAnalyzer`]) so callers can swap either one out.

pub mod analyze;
pub mod extract;
pub mod postprocess;
pub mod scratch;

pub use analyze::{CrewAnalyzer, DocumentAnalyzer};
pub use extract::{DocumentConverter, PdfiumConverter};
pub use scratch::ScratchPdf;
