use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::error::{Error, ErrorKind};

/// Error body shared by every endpoint:
/// `{status: "error", statusCode, message, error}`.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
    detail: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            detail: None,
        }
    }

    /// Maps a core error. `context` becomes the message for server-side
    /// failures; client errors keep their own text.
    pub fn from_core(err: Error, context: &str) -> Self {
        let status = match err.kind() {
            ErrorKind::InvalidParameter | ErrorKind::InvalidLocation => StatusCode::BAD_REQUEST,
            ErrorKind::JobNotFound => StatusCode::NOT_FOUND,
            ErrorKind::RobotsDisallowed => StatusCode::FORBIDDEN,
            ErrorKind::FetchTimeout | ErrorKind::FetchHttp | ErrorKind::FetchNetwork => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let (message, detail) = if status.is_server_error() {
            (context.to_string(), Some(err.to_string()))
        } else {
            (err.to_string(), None)
        };
        Self {
            status,
            message,
            detail,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::from_core(err, "Failed to fetch job listings")
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(json!({
            "status": "error",
            "statusCode": self.status.as_u16(),
            "message": self.message,
            "error": self.detail,
        }))
    }
}
