//! # pdf2brief
//!
//! Upload a PDF, get back its Markdown and a structured research briefing.
//!
//! The service exposes one endpoint, `POST /file-handler`. Each request runs
//! two collaborators in order: a PDF → Markdown converter (pdfium text
//! extraction) and an analyser that runs one configured agent/task over the
//! Markdown through an LLM.
//!
//! ## Pipeline Overview
//!
//! ```text
//! multipart upload
//!  │
//!  ├─ 1. Validate  declared content type must be application/pdf
//!  ├─ 2. Stage     bytes → per-request temp .pdf (removed right after step 3)
//!  ├─ 3. Convert   pdfium text extraction + cleanup (spawn_blocking)
//!  ├─ 4. Analyse   agent persona + task template → one chat completion
//!  └─ 5. Respond   {filename, markdown, result}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2brief::{server, BriefConfig, Briefer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ...
//!     let briefer = Briefer::from_config(&BriefConfig::default())?;
//!     let state = server::AppState::new(briefer);
//!     server::serve(&ServerConfig::default(), state, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `pdf2brief` binary (clap + anyhow + dotenvy + tracing-subscriber) |
//!
//! ## Swapping collaborators
//!
//! [`Briefer::new`] takes any [`DocumentConverter`] and [`DocumentAnalyzer`],
//! so tests and alternative engines plug in without touching the HTTP layer.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod brief;
pub mod config;
pub mod crew;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use brief::{brief_file, Briefer};
pub use config::{BriefConfig, BriefConfigBuilder, CorsPolicy, PageSeparator, ServerConfig};
pub use crew::{AgentSpec, CrewConfig, TaskSpec};
pub use error::BriefError;
pub use output::{AnalysisResult, BriefOutput, ConvertedDocument, DocumentMetadata, UploadedDocument};
pub use pipeline::{CrewAnalyzer, DocumentAnalyzer, DocumentConverter, PdfiumConverter};
