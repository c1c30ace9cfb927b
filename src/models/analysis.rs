use serde::Serialize;

/// Skin-type classification with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkinType {
    #[serde(rename = "type")]
    pub label: &'static str,
    pub confidence: f64,
}

/// One detected skin issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedIssue {
    pub name: &'static str,
    pub severity: &'static str,
    pub confidence: f64,
}

/// Metadata read from the stored image bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageMetadata {
    /// Container format, e.g. `JPEG` or `PNG`
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// File size in kilobytes, two decimals
    pub size_kb: f64,
    /// Decoded color space, e.g. `RGB`, `RGBA`, `L`
    pub color_space: String,
}

/// Full analysis output for one image. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub image_id: String,
    pub skin_type: SkinType,
    pub issues: Vec<DetectedIssue>,
    /// Mean of the skin-type confidence and every issue confidence
    pub confidence: f64,
    pub analysis_notes: String,
    pub image_metadata: ImageMetadata,
}
