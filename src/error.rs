//! Error types for the pdf2brief library.
//!
//! A single fatal error type, [`BriefError`], covers every way a briefing can
//! fail. There is no partial success: either the document was converted *and*
//! analysed, or the request fails with exactly one of these variants.
//!
//! Variants are grouped by the stage that produced them. The grouping matters
//! to callers because it decides who is at fault: [`BriefError::is_client_error`]
//! is `true` only for problems with the upload itself, which the HTTP layer
//! reports as `400`; everything else is a `500`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2brief library.
#[derive(Debug, Error)]
pub enum BriefError {
    // ── Upload validation ────────────────────────────────────────────────
    /// The declared content type of the upload is not a PDF.
    #[error("Invalid file type: expected application/pdf, got '{}'", .content_type.as_deref().unwrap_or("<none>"))]
    InvalidFileType { content_type: Option<String> },

    /// The multipart body did not contain a `file` field.
    #[error("No file uploaded: expected a multipart field named '{field}'")]
    MissingFile { field: String },

    /// The multipart body could not be read.
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    /// The request body ran past the configured upload limit.
    #[error("Upload too large: the request body exceeds the configured size limit ({detail})")]
    UploadTooLarge { detail: String },

    // ── Conversion errors ────────────────────────────────────────────────
    /// Could not create or write the per-request temporary file.
    #[error("Failed to stage upload in a temporary file: {source}")]
    ScratchFile {
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a PDF, whatever the declared content type said.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was configured.
    #[error("PDF '{path}' is encrypted and requires a password.\nStart the server with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was configured but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium loaded the document but text extraction failed.
    #[error("Text extraction failed for page {page}: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Analysis errors ──────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The model answered, but not with the expected JSON record.
    #[error("Analysis response is not a valid briefing: {detail}")]
    MalformedAnalysis { detail: String },

    // ── Output errors ────────────────────────────────────────────────────
    /// The briefing could not be serialised to JSON.
    #[error("Failed to serialise briefing: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Config errors ────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An agents/tasks file could not be read or parsed.
    #[error("Failed to load crew config '{path}': {detail}")]
    ConfigLoad { path: PathBuf, detail: String },

    /// A prompt template references a placeholder nobody supplies.
    #[error("Template references unknown variable '{{{name}}}'")]
    UnknownTemplateVariable { name: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BriefError {
    /// `true` when the caller sent something we refuse to process.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BriefError::InvalidFileType { .. }
                | BriefError::MissingFile { .. }
                | BriefError::MalformedUpload(_)
                | BriefError::UploadTooLarge { .. }
        )
    }
}
