//! Per-request scratch file for uploaded PDFs.
//!
//! pdfium requires a file-system path; it cannot read from a byte buffer.
//! [`ScratchPdf`] writes the upload to a uniquely named `.pdf` file in the
//! system temp directory and owns it until the conversion call returns.
//!
//! Removal happens on two paths:
//!
//! * [`ScratchPdf::close`], the normal path: deletes the file and logs a
//!   warning if that fails. A failed removal is never turned into an error,
//!   so it cannot mask the conversion result.
//! * `Drop`, the fallback when the owner unwinds (panic, cancelled future):
//!   [`tempfile::NamedTempFile`] removes the file silently.

use crate::error::BriefError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const PREFIX: &str = "pdf2brief-";
const SUFFIX: &str = ".pdf";

/// An uploaded PDF materialised on disk for the lifetime of this value.
#[derive(Debug)]
pub struct ScratchPdf {
    file: NamedTempFile,
}

impl ScratchPdf {
    /// Write `bytes` to a fresh temp file in the system temp directory.
    pub fn create(bytes: &[u8]) -> Result<Self, BriefError> {
        Self::create_in(std::env::temp_dir(), bytes)
    }

    /// Write `bytes` to a fresh temp file inside `dir`.
    pub fn create_in(dir: impl AsRef<Path>, bytes: &[u8]) -> Result<Self, BriefError> {
        let mut file = tempfile::Builder::new()
            .prefix(PREFIX)
            .suffix(SUFFIX)
            .tempfile_in(dir)
            .map_err(|source| BriefError::ScratchFile { source })?;

        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|source| BriefError::ScratchFile { source })?;

        debug!("Staged {} bytes at {}", bytes.len(), file.path().display());
        Ok(Self { file })
    }

    /// Path pdfium should open.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the file now. Failures are logged, never returned.
    pub fn close(self) {
        let path = self.file.path().to_path_buf();
        match self.file.close() {
            Ok(()) => debug!("Removed scratch file {}", path.display()),
            Err(e) => warn!("Failed to remove scratch file {}: {}", path.display(), e),
        }
    }
}
