//! Envelope responses for requests no route handles.

use axum::http::{Method, Uri};

use crate::error::AppError;

/// Unknown path.
pub async fn route_not_found(uri: Uri) -> AppError {
    AppError::RouteNotFound(format!("No route for {}", uri.path()))
}

/// Known path, unsupported method.
pub async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::MethodNotAllowed(format!(
        "Method {method} not allowed for {}",
        uri.path()
    ))
}
