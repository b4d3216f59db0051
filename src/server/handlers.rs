//! Route handlers.

use super::error::ApiError;
use super::upload::parse_upload;
use super::AppState;
use crate::error::BriefError;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{error, info};

/// `GET /`: what this service is and how to call it.
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Upload a PDF; get back its Markdown and a structured briefing.",
        "endpoints": {
            "POST /file-handler": {
                "content_type": "multipart/form-data",
                "field": "file",
                "accepts": "application/pdf",
                "returns": ["filename", "markdown", "result"]
            }
        }
    }))
}

/// `POST /file-handler`: brief one uploaded PDF.
pub async fn file_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let result = async {
        let multipart = multipart.map_err(|e| BriefError::MalformedUpload(e.body_text()))?;
        let upload = parse_upload(multipart).await?;
        let filename = upload.filename.clone();
        let output = state.briefer.brief(upload).await?;
        info!("Briefed '{}'", filename);
        Ok::<_, BriefError>(serde_json::to_value(&output)?)
    }
    .await;

    result.map(Json).map_err(|e| {
        error!("file-handler failed: {:?}", e);
        ApiError::from(e)
    })
}

/// `OPTIONS /file-handler`: explicit preflight answer. The CORS layer adds
/// the headers.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
