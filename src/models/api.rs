use serde::{Deserialize, Serialize};

use super::AnalysisResult;
use crate::utils::timestamp_now;

/// Request to analyze a previously uploaded image.
#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    /// Identifier returned by the upload endpoint
    pub image_id: String,
}

/// Health check response for `/` and `/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    /// Response timestamp (ISO-8601, UTC)
    pub timestamp: String,
    /// Service status (`running` or `healthy`)
    pub status: &'static str,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
}

impl HealthResponse {
    pub fn new(status: &'static str, service: &str, version: &str) -> Self {
        Self {
            success: true,
            timestamp: timestamp_now(),
            status,
            service: service.to_string(),
            version: version.to_string(),
        }
    }
}

/// Response after a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub timestamp: String,
    /// Identifier of the stored image
    pub image_id: String,
    /// Original filename as sent by the client
    pub filename: String,
    /// Stored size in bytes
    pub file_size: usize,
    pub message: &'static str,
}

impl UploadResponse {
    pub fn new(image_id: String, filename: String, file_size: usize) -> Self {
        Self {
            success: true,
            timestamp: timestamp_now(),
            image_id,
            filename,
            file_size,
            message: "Image uploaded successfully",
        }
    }
}

/// Response carrying an analysis result.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub timestamp: String,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

impl From<AnalysisResult> for AnalysisResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            success: true,
            timestamp: timestamp_now(),
            result,
        }
    }
}
