//! Mock skin analysis.
//!
//! The skin assessment is pseudo-random but fully determined by the image
//! identifier: every call builds its own ChaCha12 generator seeded with the
//! SHA-256 digest of the identifier. No generator state is shared between
//! calls, so concurrent analyses cannot disturb each other. ChaCha12 is
//! pinned by name: `StdRng` does not promise the same stream across `rand`
//! releases, and results for stored images must not change.
//!
//! Image metadata (format, dimensions, color space, size) is real and is
//! decoded from the stored bytes on every call.

use std::io::Cursor;
use std::ops::RangeInclusive;
use std::path::Path;

use image::{ColorType, ImageFormat, ImageReader};
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::error::{AppError, AppResult};
use crate::models::{AnalysisResult, DetectedIssue, ImageMetadata, SkinType};
use crate::utils::round2;

pub const SKIN_TYPES: [&str; 5] = ["Oily", "Dry", "Combination", "Normal", "Sensitive"];

pub const ISSUES: [&str; 7] = [
    "Hyperpigmentation",
    "Acne",
    "Dark Circles",
    "Fine Lines",
    "Redness",
    "Uneven Texture",
    "Enlarged Pores",
];

pub const SEVERITIES: [&str; 3] = ["Mild", "Moderate", "Severe"];

pub const SKIN_CONFIDENCE_RANGE: RangeInclusive<f64> = 0.85..=0.98;
pub const ISSUE_CONFIDENCE_RANGE: RangeInclusive<f64> = 0.75..=0.95;
pub const ISSUE_COUNT_RANGE: RangeInclusive<usize> = 1..=3;

/// Generated part of an analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinAssessment {
    pub skin_type: SkinType,
    pub issues: Vec<DetectedIssue>,
    pub confidence: f64,
    pub notes: String,
}

/// 32-byte generator seed for an identifier.
pub fn seed_for(image_id: &str) -> [u8; 32] {
    Sha256::digest(image_id.as_bytes()).into()
}

/// Derive the skin assessment for `image_id`.
///
/// Draw order is fixed: skin type, its confidence, issue count, the distinct
/// issues, then severity and confidence per issue.
pub fn assess(image_id: &str) -> SkinAssessment {
    let mut rng = ChaCha12Rng::from_seed(seed_for(image_id));

    let label = pick(&mut rng, &SKIN_TYPES);
    let skin_confidence = round2(rng.random_range(SKIN_CONFIDENCE_RANGE));

    let count = rng.random_range(ISSUE_COUNT_RANGE);
    let names: Vec<&'static str> = ISSUES.choose_multiple(&mut rng, count).copied().collect();

    let issues: Vec<DetectedIssue> = names
        .into_iter()
        .map(|name| DetectedIssue {
            name,
            severity: pick(&mut rng, &SEVERITIES),
            confidence: round2(rng.random_range(ISSUE_CONFIDENCE_RANGE)),
        })
        .collect();

    let total: f64 = skin_confidence + issues.iter().map(|i| i.confidence).sum::<f64>();
    let confidence = round2(total / (issues.len() + 1) as f64);

    let notes = format!(
        "Detected {} skin with {} concern(s)",
        label.to_lowercase(),
        issues.len()
    );

    SkinAssessment {
        skin_type: SkinType {
            label,
            confidence: skin_confidence,
        },
        issues,
        confidence,
        notes,
    }
}

fn pick(rng: &mut ChaCha12Rng, options: &[&'static str]) -> &'static str {
    options.choose(rng).copied().unwrap_or_default()
}

/// Decode `bytes` and describe the image.
///
/// # Errors
///
/// `ImageDecode` when the bytes are not a decodable image.
pub fn read_metadata(bytes: &[u8]) -> AppResult<ImageMetadata> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader
        .format()
        .map(format_name)
        .unwrap_or_else(|| "UNKNOWN".to_string());
    let img = reader.decode()?;

    Ok(ImageMetadata {
        format,
        width: img.width(),
        height: img.height(),
        size_kb: round2(bytes.len() as f64 / 1024.0),
        color_space: color_space_name(img.color()),
    })
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        other => format!("{other:?}").to_uppercase(),
    }
}

fn color_space_name(color: ColorType) -> String {
    match color {
        ColorType::L8 | ColorType::L16 => "L".to_string(),
        ColorType::La8 | ColorType::La16 => "LA".to_string(),
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB".to_string(),
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA".to_string(),
        other => format!("{other:?}"),
    }
}

/// Produces analysis results for stored images.
#[derive(Clone, Debug, Default)]
pub struct AnalysisEngine;

impl AnalysisEngine {
    pub fn new() -> Self {
        Self
    }

    /// Analyze the image stored at `path` under `image_id`.
    ///
    /// Reading and decoding happen off the async executor. Same identifier
    /// and same file bytes always give the same result.
    #[instrument(skip(self, path))]
    pub async fn analyze(&self, image_id: &str, path: &Path) -> AppResult<AnalysisResult> {
        let bytes = tokio::fs::read(path).await?;

        let image_metadata = tokio::task::spawn_blocking(move || read_metadata(&bytes))
            .await
            .map_err(|e| AppError::Internal(format!("Metadata task failed: {e}")))??;

        let assessment = assess(image_id);
        debug!(
            skin_type = assessment.skin_type.label,
            issues = assessment.issues.len(),
            "Assessment generated"
        );

        Ok(AnalysisResult {
            image_id: image_id.to_string(),
            skin_type: assessment.skin_type,
            issues: assessment.issues,
            confidence: assessment.confidence,
            analysis_notes: assessment.notes,
            image_metadata,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashSet;

    use image::{DynamicImage, RgbImage, RgbaImage};

    use super::*;

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_seed_is_stable() {
        assert_eq!(seed_for("abc"), seed_for("abc"));
        assert_ne!(seed_for("abc"), seed_for("abd"));
    }

    #[test]
    fn test_assess_is_deterministic() {
        for i in 0..50 {
            let id = format!("image-{i}");
            assert_eq!(assess(&id), assess(&id));
        }
    }

    #[test]
    fn test_assess_known_values() {
        let a = assess("golden-fixture");

        assert_eq!(a.skin_type.label, "Normal");
        assert_eq!(a.skin_type.confidence, 0.91);
        assert_eq!(
            a.issues,
            vec![
                DetectedIssue {
                    name: "Acne",
                    severity: "Moderate",
                    confidence: 0.76,
                },
                DetectedIssue {
                    name: "Uneven Texture",
                    severity: "Moderate",
                    confidence: 0.89,
                },
                DetectedIssue {
                    name: "Enlarged Pores",
                    severity: "Moderate",
                    confidence: 0.84,
                },
            ]
        );
        assert_eq!(a.confidence, 0.85);
        assert_eq!(a.notes, "Detected normal skin with 3 concern(s)");

        let b = assess("image-0");
        assert_eq!(b.skin_type.label, "Oily");
        assert_eq!(b.skin_type.confidence, 0.94);
        let names: Vec<_> = b.issues.iter().map(|i| (i.name, i.severity)).collect();
        assert_eq!(names, vec![("Dark Circles", "Moderate"), ("Acne", "Mild")]);
        assert_eq!(b.confidence, 0.89);
    }

    #[test]
    fn test_assess_bounds_and_distinctness() {
        for i in 0..500 {
            let a = assess(&format!("{i:08x}-bounds"));

            assert!(SKIN_TYPES.contains(&a.skin_type.label));
            assert!(SKIN_CONFIDENCE_RANGE.contains(&a.skin_type.confidence));
            assert!(ISSUE_COUNT_RANGE.contains(&a.issues.len()));

            let names: HashSet<_> = a.issues.iter().map(|i| i.name).collect();
            assert_eq!(names.len(), a.issues.len(), "issues must be distinct");

            for issue in &a.issues {
                assert!(ISSUES.contains(&issue.name));
                assert!(SEVERITIES.contains(&issue.severity));
                assert!(ISSUE_CONFIDENCE_RANGE.contains(&issue.confidence));
            }

            assert!((0.75..=0.98).contains(&a.confidence));
        }
    }

    #[test]
    fn test_assess_aggregate_is_rounded_mean() {
        let a = assess("aggregate-check");
        let sum = a.skin_type.confidence + a.issues.iter().map(|i| i.confidence).sum::<f64>();
        let mean = sum / (a.issues.len() + 1) as f64;
        assert!((a.confidence - mean).abs() <= 0.005 + f64::EPSILON);
        assert_eq!(round2(a.confidence), a.confidence);
    }

    #[test]
    fn test_assess_notes() {
        let a = assess("notes-check");
        assert_eq!(
            a.notes,
            format!(
                "Detected {} skin with {} concern(s)",
                a.skin_type.label.to_lowercase(),
                a.issues.len()
            )
        );
    }

    #[test]
    fn test_assess_varies_across_ids() {
        let distinct: HashSet<_> = (0..100)
            .map(|i| assess(&format!("vary-{i}")).skin_type.label)
            .collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_read_metadata_png_rgb() {
        let bytes = png_bytes(DynamicImage::ImageRgb8(RgbImage::new(4, 3)));
        let meta = read_metadata(&bytes).unwrap();

        assert_eq!(meta.format, "PNG");
        assert_eq!((meta.width, meta.height), (4, 3));
        assert_eq!(meta.color_space, "RGB");
        assert_eq!(meta.size_kb, round2(bytes.len() as f64 / 1024.0));
    }

    #[test]
    fn test_read_metadata_png_rgba() {
        let bytes = png_bytes(DynamicImage::ImageRgba8(RgbaImage::new(2, 2)));
        assert_eq!(read_metadata(&bytes).unwrap().color_space, "RGBA");
    }

    #[test]
    fn test_read_metadata_jpeg() {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(8, 8))
            .write_to(&mut out, ImageFormat::Jpeg)
            .unwrap();
        let meta = read_metadata(out.get_ref()).unwrap();

        assert_eq!(meta.format, "JPEG");
        assert_eq!((meta.width, meta.height), (8, 8));
    }

    #[test]
    fn test_read_metadata_garbage() {
        let err = read_metadata(b"definitely not an image").unwrap_err();
        assert_eq!(err.code(), "INTERNAL");
    }

    #[tokio::test]
    async fn test_analyze_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.png");
        std::fs::write(&path, png_bytes(DynamicImage::ImageRgb8(RgbImage::new(5, 7)))).unwrap();

        let engine = AnalysisEngine::new();
        let first = engine.analyze("img", &path).await.unwrap();
        let second = engine.analyze("img", &path).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.image_id, "img");
        assert_eq!(first.image_metadata.width, 5);
        assert_eq!(first.image_metadata.height, 7);
    }

    #[tokio::test]
    async fn test_analyze_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let engine = AnalysisEngine::new();

        let err = engine
            .analyze("gone", &dir.path().join("gone.jpg"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INTERNAL");
    }
}
