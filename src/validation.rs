use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::UploadedFile;

// =============================================================================
// Validation Constants
// =============================================================================

/// Maximum length of an image identifier.
///
/// Generated identifiers are 36-character UUIDs; the limit leaves room for
/// externally chosen ids while keeping file names short.
pub const MAX_IMAGE_ID_LENGTH: usize = 128;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Upload acceptance policy: MIME allow-list and size ceiling.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub allowed_content_types: Vec<String>,
    pub max_file_size: usize,
}

impl UploadPolicy {
    pub fn new(allowed_content_types: Vec<String>, max_file_size: usize) -> Self {
        Self {
            allowed_content_types,
            max_file_size,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.allowed_content_types.clone(), config.max_file_size)
    }

    /// Validate an uploaded file before it is persisted.
    ///
    /// Rules, checked in order:
    /// - Declared media type must be in the allow-list (no content sniffing);
    ///   parameters such as `; charset=binary` are ignored
    /// - Size must not exceed the configured maximum
    /// - Size must not be zero
    ///
    /// The file is only borrowed, so the caller can persist the same bytes.
    pub fn validate(&self, file: &UploadedFile) -> AppResult<()> {
        let content_type = file.content_type.as_deref().unwrap_or("");
        let media_type = content_type.split(';').next().map(str::trim).unwrap_or("");
        if !self
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(media_type))
        {
            return Err(AppError::InvalidFileType(format!(
                "Invalid file type. Allowed types: {}. Got: {}",
                self.allowed_content_types.join(", "),
                if content_type.is_empty() { "none" } else { content_type }
            )));
        }

        let size = file.len();
        if size > self.max_file_size {
            return Err(self.too_large(Some(size)));
        }

        if size == 0 {
            return Err(AppError::EmptyFile);
        }

        Ok(())
    }

    /// `FILE_TOO_LARGE` error; `actual` is unknown when the body limit cut
    /// the upload short.
    pub fn too_large(&self, actual: Option<usize>) -> AppError {
        let max_mb = self.max_file_size as f64 / BYTES_PER_MB;
        match actual {
            Some(size) => AppError::FileTooLarge(format!(
                "File too large. Maximum size: {max_mb:.0}MB. Got: {:.2}MB",
                size as f64 / BYTES_PER_MB
            )),
            None => AppError::FileTooLarge(format!(
                "File too large. Maximum size: {max_mb:.0}MB"
            )),
        }
    }
}

/// Whether `id` can name a stored image.
///
/// Accepts 1 to `MAX_IMAGE_ID_LENGTH` ASCII alphanumerics, `-` or `_`.
/// Anything else (path separators, dots, whitespace) is rejected so an
/// externally supplied id can never escape the upload directory.
pub fn is_valid_image_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_IMAGE_ID_LENGTH
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Validate the `image_id` of an analysis request.
///
/// Only emptiness is a request error; a non-empty id that cannot name a
/// stored file is simply never found.
pub fn validate_image_id(id: &str) -> AppResult<()> {
    if id.trim().is_empty() {
        return Err(AppError::bad_request_field(
            "image_id cannot be empty",
            "image_id",
        ));
    }
    Ok(())
}
