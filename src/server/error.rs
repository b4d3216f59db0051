use crate::error::BriefError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// An HTTP error response: `{"detail": "<message>"}` with a status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

/// Oversized bodies become `413`, other upload problems `400`; anything that
/// failed after validation is a `500`. The message is passed through verbatim.
impl From<BriefError> for ApiError {
    fn from(err: BriefError) -> Self {
        if let BriefError::UploadTooLarge { .. } = err {
            Self {
                status: StatusCode::PAYLOAD_TOO_LARGE,
                detail: err.to_string(),
            }
        } else if err.is_client_error() {
            Self::bad_request(err.to_string())
        } else {
            Self::internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
