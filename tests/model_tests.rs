//! Wire-format tests for the public models.
//!
//! Run with: `cargo test --test model_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::json;

/// Response body models
mod api_tests {
    use super::*;
    use image_analysis_api::models::{
        AnalysisRequest, AnalysisResponse, AnalysisResult, HealthResponse, ImageMetadata,
        UploadResponse,
    };
    use image_analysis_api::services::assess;

    fn sample_result(image_id: &str) -> AnalysisResult {
        let assessment = assess(image_id);
        AnalysisResult {
            image_id: image_id.to_string(),
            skin_type: assessment.skin_type,
            issues: assessment.issues,
            confidence: assessment.confidence,
            analysis_notes: assessment.notes,
            image_metadata: ImageMetadata {
                format: "PNG".to_string(),
                width: 640,
                height: 480,
                size_kb: 12.34,
                color_space: "RGB".to_string(),
            },
        }
    }

    #[test]
    fn test_analysis_request_deserialization() {
        let request: AnalysisRequest =
            serde_json::from_str(r#"{"image_id":"abc-123"}"#).expect("Deserialization failed");
        assert_eq!(request.image_id, "abc-123");

        assert!(serde_json::from_str::<AnalysisRequest>("{}").is_err());
        assert!(serde_json::from_str::<AnalysisRequest>(r#"{"image_id":42}"#).is_err());
    }

    #[test]
    fn test_health_response_serialization() {
        let value = serde_json::to_value(HealthResponse::new("healthy", "svc", "1.2.3")).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["status"], "healthy");
        assert_eq!(value["service"], "svc");
        assert_eq!(value["version"], "1.2.3");
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_upload_response_serialization() {
        let value = serde_json::to_value(UploadResponse::new(
            "id-1".to_string(),
            "face.png".to_string(),
            2048,
        ))
        .unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["image_id"], "id-1");
        assert_eq!(value["filename"], "face.png");
        assert_eq!(value["file_size"], 2048);
        assert_eq!(value["message"], "Image uploaded successfully");
    }

    #[test]
    fn test_analysis_response_is_flat() {
        let value = serde_json::to_value(AnalysisResponse::from(sample_result("flat"))).unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "analysis_notes",
                "confidence",
                "image_id",
                "image_metadata",
                "issues",
                "skin_type",
                "success",
                "timestamp",
            ]
        );

        assert!(value["skin_type"]["type"].is_string());
        assert!(value["skin_type"]["confidence"].is_f64());
        for issue in value["issues"].as_array().unwrap() {
            assert!(issue["name"].is_string());
            assert!(issue["severity"].is_string());
            assert!(issue["confidence"].is_f64());
        }
        assert_eq!(
            value["image_metadata"],
            json!({
                "format": "PNG",
                "width": 640,
                "height": 480,
                "size_kb": 12.34,
                "color_space": "RGB",
            })
        );
    }

    #[test]
    fn test_analysis_result_serialization_is_stable() {
        let a = serde_json::to_string(&sample_result("stable-id")).unwrap();
        let b = serde_json::to_string(&sample_result("stable-id")).unwrap();
        assert_eq!(a, b);
    }
}

/// Error envelope
mod error_tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;
    use image_analysis_api::AppError;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_client_error_envelope() {
        let (status, value) = render(AppError::EmptyFile).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "EMPTY_FILE");
        assert_eq!(value["error"]["field"], "file");
        assert!(value.get("correlation_id").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let io = std::io::Error::other("/srv/uploads/secret-path.jpg: permission denied");
        let (status, value) = render(AppError::from(io)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["error"]["code"], "INTERNAL");
        assert!(!value.to_string().contains("secret-path"));
        assert!(value["error"].get("field").is_none());
    }
}
