//! PDF text extraction: turn a PDF file into Markdown via pdfium.
//!
//! ## Blocking work
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so the
//! runtime's worker threads keep serving other requests while a large
//! document is parsed.

use crate::config::{BriefConfig, PageSeparator};
use crate::error::BriefError;
use crate::output::{ConvertedDocument, DocumentMetadata};
use crate::pipeline::postprocess;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Converts a PDF on disk into a [`ConvertedDocument`].
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, pdf_path: &Path) -> Result<ConvertedDocument, BriefError>;
}

/// Production converter backed by pdfium text extraction.
#[derive(Debug, Clone, Default)]
pub struct PdfiumConverter {
    password: Option<String>,
    page_separator: PageSeparator,
    library: Option<PathBuf>,
}

impl PdfiumConverter {
    pub fn new(config: &BriefConfig) -> Self {
        Self {
            password: config.password.clone(),
            page_separator: config.page_separator.clone(),
            library: config.pdfium_library.clone(),
        }
    }
}

#[async_trait]
impl DocumentConverter for PdfiumConverter {
    async fn convert(&self, pdf_path: &Path) -> Result<ConvertedDocument, BriefError> {
        check_pdf_magic(pdf_path)?;

        let path = pdf_path.to_path_buf();
        let converter = self.clone();
        tokio::task::spawn_blocking(move || converter.convert_blocking(&path))
            .await
            .map_err(|e| BriefError::Internal(format!("Extraction task panicked: {}", e)))?
    }
}

impl PdfiumConverter {
    fn bind(&self) -> Result<Pdfium, BriefError> {
        let bound = match &self.library {
            Some(path) => pdfium_auto::bind_pdfium_from_path(path),
            None => pdfium_auto::bind_pdfium_silent(),
        };
        bound.map_err(|e| BriefError::PdfiumBindingFailed(e.to_string()))
    }

    /// Blocking implementation of the conversion.
    fn convert_blocking(&self, pdf_path: &Path) -> Result<ConvertedDocument, BriefError> {
        let pdfium = self.bind()?;
        let password = self.password.as_deref();

        let document = pdfium
            .load_pdf_from_file(pdf_path, password)
            .map_err(|e| classify_load_error(pdf_path, password.is_some(), e))?;

        let pages = document.pages();
        let page_count = pages.len() as usize;
        info!("PDF loaded: {} pages", page_count);

        let mut parts: Vec<String> = Vec::with_capacity(page_count * 2);
        let mut empty_pages = 0;

        for (idx, page) in pages.iter().enumerate() {
            let page_num = idx + 1;
            let raw = page
                .text()
                .map_err(|e| BriefError::ExtractionFailed {
                    page: page_num,
                    detail: format!("{:?}", e),
                })?
                .all();

            let text = postprocess::clean_page_text(&raw);
            if text.is_empty() {
                debug!("Page {} has no extractable text", page_num);
                empty_pages += 1;
                continue;
            }

            debug!("Page {} → {} chars", page_num, text.len());
            if !parts.is_empty() {
                parts.push(self.page_separator.render(page_num));
            }
            parts.push(text.trim_end().to_string());
        }

        let mut markdown = parts.join("");
        if !markdown.is_empty() {
            markdown.push('\n');
        }

        let metadata = extract_metadata(&document, page_count);
        Ok(ConvertedDocument {
            markdown,
            metadata,
            empty_pages,
        })
    }
}

/// Reject files that do not start with `%PDF` before handing them to pdfium.
fn check_pdf_magic(path: &Path) -> Result<(), BriefError> {
    let mut file = std::fs::File::open(path).map_err(|e| BriefError::CorruptPdf {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) if &magic == b"%PDF" => Ok(()),
        Ok(()) => Err(BriefError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        }),
        // Fewer than four bytes: not a PDF either.
        Err(_) => Err(BriefError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        }),
    }
}

fn classify_load_error(path: &Path, had_password: bool, err: PdfiumError) -> BriefError {
    let err_str = format!("{:?}", err);
    if err_str.contains("Password") || err_str.contains("password") {
        if had_password {
            BriefError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            BriefError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        BriefError::CorruptPdf {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}

fn extract_metadata(document: &PdfDocument<'_>, page_count: usize) -> DocumentMetadata {
    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        page_count,
        pdf_version: format!("{:?}", document.version()),
    }
}
