//! Filesystem-backed image store.
//!
//! The upload directory is flat: each image is a single file named
//! `{image_id}{ext}`. There is no index; lookups probe the allowed
//! extensions in their configured order and return the first existing file.
//!
//! Writes go to a hidden temporary file first and are renamed onto the final
//! name once every byte is on disk, so an interrupted upload never leaves a
//! truncated image that a later lookup could resolve.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::validation::is_valid_image_id;

/// Extension used when the original filename has none, or one we would
/// never probe for.
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Maps image identifiers to files in the upload directory.
#[derive(Clone, Debug)]
pub struct ImageStore {
    upload_dir: Arc<PathBuf>,
    /// Allowed extensions in lookup order (lowercase, with leading dot)
    allowed_extensions: Arc<Vec<String>>,
}

impl ImageStore {
    /// Create a store rooted at `upload_dir`.
    pub fn new(upload_dir: impl Into<PathBuf>, allowed_extensions: Vec<String>) -> Self {
        Self {
            upload_dir: Arc::new(upload_dir.into()),
            allowed_extensions: Arc::new(allowed_extensions),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.upload_dir.clone(), config.allowed_extensions.clone())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Create the upload directory (and parents) if it does not exist.
    pub async fn ensure_dir(&self) -> AppResult<()> {
        fs::create_dir_all(self.upload_dir.as_path()).await?;
        Ok(())
    }

    /// Generate a fresh identifier for a new image.
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Extension the stored file will carry for a given original filename.
    ///
    /// The original extension is lowercased and kept when it is one of the
    /// allowed extensions; anything else falls back to [`DEFAULT_EXTENSION`].
    pub fn stored_extension(&self, original_filename: Option<&str>) -> String {
        original_filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .filter(|ext| self.allowed_extensions.iter().any(|allowed| allowed == ext))
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
    }

    /// Persist `data` as `{upload_dir}/{image_id}{ext}`, overwriting any
    /// existing file of that name.
    ///
    /// # Errors
    ///
    /// `BadRequest` for an identifier that cannot name a file, `Io` for any
    /// filesystem failure. On failure no file is left under the final name.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn save(
        &self,
        image_id: &str,
        original_filename: Option<&str>,
        data: &[u8],
    ) -> AppResult<PathBuf> {
        if !is_valid_image_id(image_id) {
            return Err(AppError::bad_request_field("Invalid image id", "image_id"));
        }

        let file_name = format!("{image_id}{}", self.stored_extension(original_filename));
        let final_path = self.upload_dir.join(&file_name);
        let temp_path = self.upload_dir.join(format!(".{file_name}.tmp"));

        if let Err(e) = write_file(&temp_path, data).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await
                && cleanup.kind() != ErrorKind::NotFound
            {
                warn!(path = %temp_path.display(), error = %cleanup, "Failed to remove temporary upload");
            }
            return Err(e.into());
        }

        fs::rename(&temp_path, &final_path).await?;

        info!(path = %final_path.display(), "Image stored");
        Ok(final_path)
    }

    /// Find the stored file for `image_id`.
    ///
    /// Probes `{image_id}{ext}` for every allowed extension in configured
    /// order and returns the first regular file found. Identifiers that
    /// cannot name a stored file resolve to `None`.
    #[instrument(skip(self))]
    pub async fn resolve(&self, image_id: &str) -> AppResult<Option<PathBuf>> {
        if !is_valid_image_id(image_id) {
            debug!("Identifier cannot name a stored image");
            return Ok(None);
        }

        for ext in self.allowed_extensions.iter() {
            let candidate = self.upload_dir.join(format!("{image_id}{ext}"));
            match fs::metadata(&candidate).await {
                Ok(meta) if meta.is_file() => return Ok(Some(candidate)),
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(None)
    }
}

async fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(())
}
