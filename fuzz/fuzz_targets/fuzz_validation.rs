//! Fuzz testing for upload validation, identifier checks and the analysis
//! engine.
//!
//! Properties checked on every input:
//!
//! - Nothing panics
//! - An identifier accepted by `is_valid_image_id` never contains a path
//!   separator or a dot
//! - `assess` is deterministic and stays within its documented bounds
//! - `read_metadata` returns an error rather than panicking on garbage
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_validation
//! cargo +nightly fuzz run fuzz_validation -- -max_total_time=60
//! ```

#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use image_analysis_api::models::UploadedFile;
use image_analysis_api::services::{assess, read_metadata};
use image_analysis_api::validation::{is_valid_image_id, validate_image_id, UploadPolicy};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    image_id: String,
    file_name: Option<String>,
    content_type: Option<String>,
    max_file_size: u16,
    data: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let _ = validate_image_id(&input.image_id);

    if is_valid_image_id(&input.image_id) {
        assert!(!input.image_id.contains(['/', '\\', '.']));
    }

    let a = assess(&input.image_id);
    assert_eq!(a, assess(&input.image_id));
    assert!((1..=3).contains(&a.issues.len()));
    assert!((0.85..=0.98).contains(&a.skin_type.confidence));

    let policy = UploadPolicy::new(
        vec!["image/jpeg".to_string(), "image/png".to_string()],
        usize::from(input.max_file_size),
    );
    let upload = UploadedFile::new(
        input.file_name,
        input.content_type,
        Bytes::from(input.data),
    );
    if policy.validate(&upload).is_ok() {
        assert!(!upload.is_empty());
        assert!(upload.len() <= policy.max_file_size);
    }

    let _ = read_metadata(&upload.data);
});
