//! HTTP error mapping.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Error returned by every handler; converted to a response at the
/// handler boundary.
#[derive(Debug)]
pub enum ApiError {
    /// Store failure, malformed id, or anything else unexpected. The
    /// underlying message is passed through to the client.
    Internal(noteshare_core::Error),
    NotFound(String),
    BadRequest(String),
    /// The multipart stream could not be read, including bodies cut off by
    /// the upload size limit.
    Multipart(MultipartError),
}

impl From<noteshare_core::Error> for ApiError {
    fn from(err: noteshare_core::Error) -> Self {
        match err {
            noteshare_core::Error::NotFound(msg) => ApiError::NotFound(msg),
            noteshare_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            // Malformed ids are deliberately indistinguishable from store errors
            other => ApiError::Internal(other),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Multipart(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                tracing::error!(subsystem = "api", error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Multipart(err) => (err.status(), err.body_text()),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
