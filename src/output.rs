//! Data types flowing through a briefing: the upload going in, the converted
//! document in the middle, and the structured analysis coming out.

use crate::error::BriefError;
use serde::{Deserialize, Serialize};

/// MIME types accepted as "this is a PDF".
///
/// `application/x-pdf` predates the IANA registration and some older
/// clients still send it.
pub const PDF_MIME_TYPES: &[&str] = &["application/pdf", "application/x-pdf"];

/// One incoming file, as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Client-supplied filename, echoed back in the response.
    pub filename: String,
    /// Declared MIME type of the part, if the client sent one.
    pub content_type: Option<String>,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(
        filename: impl Into<String>,
        content_type: Option<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Reject anything whose declared content type is not a PDF.
    ///
    /// Only the MIME essence is compared: parameters (`; name=…`) and case
    /// are ignored. The bytes themselves are checked later by the converter.
    pub fn ensure_pdf(&self) -> Result<(), BriefError> {
        let declared_pdf = self
            .content_type
            .as_deref()
            .map(mime_essence)
            .is_some_and(|essence| PDF_MIME_TYPES.contains(&essence.as_str()));

        if declared_pdf {
            Ok(())
        } else {
            Err(BriefError::InvalidFileType {
                content_type: self.content_type.clone(),
            })
        }
    }
}

/// `"Application/PDF; charset=binary"` → `"application/pdf"`.
fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Document metadata extracted alongside the text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// The conversion collaborator's result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertedDocument {
    /// Assembled Markdown for all non-empty pages.
    pub markdown: String,
    pub metadata: DocumentMetadata,
    /// Pages that produced no text (scanned images, blank separators).
    pub empty_pages: usize,
}

impl ConvertedDocument {
    /// Export the document as a Markdown string.
    pub fn to_markdown(&self) -> String {
        self.markdown.clone()
    }
}

/// Structured briefing produced by the analysis collaborator.
///
/// Field names are part of the HTTP contract; do not rename them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Narrative summary of the whole document.
    pub summary: String,
    /// Ordered key points.
    pub key_points: Vec<String>,
    /// One or two sentences.
    pub quick_summary: String,
    /// Several paragraphs.
    pub extended_summary: String,
    pub actionable_insights: Vec<String>,
    /// Documents, papers or sources the text itself cites.
    pub source_document_list: Vec<String>,
    pub potential_biases_and_limitations: String,
}

/// Success body of `POST /file-handler`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefOutput {
    pub filename: String,
    pub markdown: String,
    pub result: AnalysisResult,
}
