mod analysis;
mod api;
mod upload;

pub use analysis::{AnalysisResult, DetectedIssue, ImageMetadata, SkinType};
pub use api::{AnalysisRequest, AnalysisResponse, HealthResponse, UploadResponse};
pub use upload::UploadedFile;
