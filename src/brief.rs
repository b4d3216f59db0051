//! Briefing entry points: one upload in, one [`BriefOutput`] out.
//!
//! Every call runs the same strictly ordered sequence:
//!
//! 1. validate the declared content type (nothing else happens on failure);
//! 2. stage the bytes in a [`ScratchPdf`];
//! 3. one conversion call; the scratch file is removed as soon as it returns;
//! 4. one analysis call over the converted Markdown.
//!
//! Nothing is cached: the same bytes submitted twice produce two scratch
//! files and two calls to each collaborator.

use crate::config::BriefConfig;
use crate::error::BriefError;
use crate::output::{BriefOutput, ConvertedDocument, UploadedDocument};
use crate::pipeline::{CrewAnalyzer, DocumentAnalyzer, DocumentConverter, PdfiumConverter, ScratchPdf};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Runs the convert → analyse pipeline for uploaded documents.
#[derive(Clone)]
pub struct Briefer {
    converter: Arc<dyn DocumentConverter>,
    analyzer: Arc<dyn DocumentAnalyzer>,
    scratch_dir: Option<PathBuf>,
}

impl Briefer {
    /// Assemble a briefer from explicit collaborators.
    pub fn new(converter: Arc<dyn DocumentConverter>, analyzer: Arc<dyn DocumentAnalyzer>) -> Self {
        Self {
            converter,
            analyzer,
            scratch_dir: None,
        }
    }

    /// Production briefer: pdfium conversion and the configured crew.
    ///
    /// Fails if no LLM provider can be resolved.
    pub fn from_config(config: &BriefConfig) -> Result<Self, BriefError> {
        let converter = Arc::new(PdfiumConverter::new(config));
        let analyzer = Arc::new(CrewAnalyzer::from_config(config)?);
        Ok(Self::new(converter, analyzer))
    }

    /// Stage uploads in `dir` instead of the system temp directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Brief one uploaded document.
    ///
    /// # Errors
    /// [`BriefError::InvalidFileType`] if the declared content type is not a
    /// PDF; otherwise whatever the conversion or analysis stage returned.
    pub async fn brief(&self, upload: UploadedDocument) -> Result<BriefOutput, BriefError> {
        upload.ensure_pdf()?;

        let total_start = Instant::now();
        info!(
            "Briefing '{}' ({} bytes)",
            upload.filename,
            upload.bytes.len()
        );

        let converted = self.convert_bytes(&upload.bytes).await?;
        let markdown = converted.to_markdown();
        info!(
            "Converted '{}': {} pages, {} chars of Markdown",
            upload.filename,
            converted.metadata.page_count,
            markdown.len()
        );

        let analysis_start = Instant::now();
        let result = self.analyzer.analyze(&markdown).await?;
        info!(
            "Analysed '{}' in {}ms ({}ms total)",
            upload.filename,
            analysis_start.elapsed().as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(BriefOutput {
            filename: upload.filename,
            markdown,
            result,
        })
    }

    /// Brief a PDF that is already on disk. Skips the content-type check
    /// and the scratch copy.
    pub async fn brief_file(&self, path: impl AsRef<Path>) -> Result<BriefOutput, BriefError> {
        let path = path.as_ref();
        let converted = self.converter.convert(path).await?;
        let markdown = converted.to_markdown();
        let result = self.analyzer.analyze(&markdown).await?;

        Ok(BriefOutput {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            markdown,
            result,
        })
    }

    /// Convert raw bytes through a scratch file that only lives as long as
    /// the conversion call.
    async fn convert_bytes(&self, bytes: &[u8]) -> Result<ConvertedDocument, BriefError> {
        let scratch = match &self.scratch_dir {
            Some(dir) => ScratchPdf::create_in(dir, bytes)?,
            None => ScratchPdf::create(bytes)?,
        };
        let converted = self.converter.convert(scratch.path()).await;
        scratch.close();
        converted
    }
}

/// Convenience wrapper: build a production [`Briefer`] and brief one file.
pub async fn brief_file(
    path: impl AsRef<Path>,
    config: &BriefConfig,
) -> Result<BriefOutput, BriefError> {
    Briefer::from_config(config)?.brief_file(path).await
}
