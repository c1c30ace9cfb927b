use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::utils::timestamp_now;

/// Application-wide error types with appropriate HTTP status codes.
///
/// Every variant maps to one machine-readable code of the error envelope.
/// Caller errors (401/400/404) are rendered with their message; anything
/// that reaches a 500 is rendered with a generic message and only the full
/// description is logged.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    InvalidFileType(String),

    #[error("{0}")]
    FileTooLarge(String),

    #[error("Empty file uploaded")]
    EmptyFile,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    RouteNotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("{message}")]
    BadRequest {
        message: String,
        field: Option<&'static str>,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding failed: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Build a `BadRequest` error not tied to a specific field.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            field: None,
        }
    }

    /// Build a `BadRequest` error pointing at the offending request field.
    pub fn bad_request_field(message: impl Into<String>, field: &'static str) -> Self {
        Self::BadRequest {
            message: message.into(),
            field: Some(field),
        }
    }

    /// Machine-readable error code used in the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::InvalidFileType(_) => "INVALID_FILE_TYPE",
            AppError::FileTooLarge(_) => "FILE_TOO_LARGE",
            AppError::EmptyFile => "EMPTY_FILE",
            AppError::NotFound(_) | AppError::RouteNotFound(_) => "NOT_FOUND",
            AppError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            AppError::BadRequest { .. } => "INVALID_REQUEST",
            AppError::Internal(_) | AppError::Io(_) | AppError::ImageDecode(_) => "INTERNAL",
            AppError::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidFileType(_)
            | AppError::FileTooLarge(_)
            | AppError::EmptyFile
            | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Internal(_)
            | AppError::Io(_)
            | AppError::ImageDecode(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn field(&self) -> Option<&'static str> {
        match self {
            AppError::InvalidFileType(_) | AppError::FileTooLarge(_) | AppError::EmptyFile => {
                Some("file")
            }
            AppError::NotFound(_) => Some("image_id"),
            AppError::BadRequest { field, .. } => *field,
            _ => None,
        }
    }

    /// Message safe to show to clients.
    fn client_message(&self) -> String {
        match self {
            AppError::Unauthorized(msg)
            | AppError::InvalidFileType(msg)
            | AppError::FileTooLarge(msg)
            | AppError::NotFound(msg)
            | AppError::RouteNotFound(msg)
            | AppError::MethodNotAllowed(msg) => msg.clone(),
            AppError::EmptyFile => self.to_string(),
            AppError::BadRequest { message, .. } => message.clone(),
            // Never expose internal details (paths, decoder output) to clients
            AppError::Internal(_) | AppError::Io(_) | AppError::ImageDecode(_) => {
                "An internal error occurred while processing the request".to_string()
            }
            AppError::ConfigError(_) => "Service configuration error".to_string(),
        }
    }
}

/// Error detail structure of the envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

/// Error response body for every failing request.
///
/// A copy of the envelope travels in the response extensions; the
/// correlation middleware uses it to re-render the body with the request's
/// correlation id once the response leaves the handler.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub timestamp: String,
    pub error: ErrorDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: ErrorDetail) -> Self {
        Self {
            success: false,
            timestamp: timestamp_now(),
            error,
            correlation_id: None,
        }
    }

    /// Attach the correlation id of the request that failed.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log the full error details server-side for debugging
        // but only expose sanitized messages to clients
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Request failed");
        } else {
            tracing::warn!(error = %self, code = self.code(), "Request rejected");
        }

        let envelope = ErrorEnvelope::new(ErrorDetail {
            code: self.code(),
            message: self.client_message(),
            field: self.field(),
        });

        let mut response = (status, Json(&envelope)).into_response();
        if matches!(self, AppError::Unauthorized(_)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("API-Key"));
        }
        response.extensions_mut().insert(envelope);
        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                AppError::bad_request("Expected request with `Content-Type: application/json`")
            }
            other => AppError::bad_request(sanitize_json_error(&other.body_text())),
        }
    }
}

/// Sanitize JSON body errors to avoid leaking internal type information.
///
/// Serde errors can contain internal struct/field names which shouldn't be
/// exposed to external clients. This function extracts the useful parts.
fn sanitize_json_error(msg: &str) -> String {
    if msg.contains("missing field")
        && let Some(start) = msg.find('`')
        && let Some(end) = msg[start + 1..].find('`')
    {
        let field = &msg[start + 1..start + 1 + end];
        return format!("Missing required field: {field}");
    }

    if msg.contains("invalid type") {
        return "Invalid data type in request body".to_string();
    }

    if msg.contains("EOF while parsing") || msg.contains("expected") {
        return "Malformed JSON in request body".to_string();
    }

    "Invalid request format".to_string()
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
