use crate::error::BriefError;
use crate::output::UploadedDocument;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;

/// Name of the multipart field carrying the PDF.
pub const FILE_FIELD: &str = "file";

/// Pull the `file` part out of a multipart body.
///
/// Other fields are drained and ignored. If `file` appears more than once
/// the last one wins. The content type is taken as declared; validating it
/// is the briefer's job.
pub async fn parse_upload(mut multipart: Multipart) -> Result<UploadedDocument, BriefError> {
    let mut upload: Option<UploadedDocument> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| read_error("Failed to read form field", e))?
    {
        if field.name() != Some(FILE_FIELD) {
            let name = field.name().unwrap_or_default().to_string();
            field
                .bytes()
                .await
                .map_err(|e| read_error(&format!("Failed to read form field '{}'", name), e))?;
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.pdf").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| read_error("Failed to read file data", e))?
            .to_vec();

        upload = Some(UploadedDocument::new(filename, content_type, bytes));
    }

    upload.ok_or_else(|| BriefError::MissingFile {
        field: FILE_FIELD.to_string(),
    })
}

/// Body-limit hits become [`BriefError::UploadTooLarge`]; every other read
/// failure is a malformed upload.
fn read_error(context: &str, err: MultipartError) -> BriefError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        BriefError::UploadTooLarge {
            detail: err.body_text(),
        }
    } else {
        BriefError::MalformedUpload(format!("{}: {}", context, err))
    }
}
