use bytes::Bytes;

/// A file received from a multipart upload, fully buffered.
///
/// `data` is reference counted, so validating the length and then writing the
/// same bytes to storage never consumes or rewinds anything.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename supplied by the client, if any
    pub file_name: Option<String>,
    /// Declared MIME type of the part, if any
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: Option<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            file_name,
            content_type,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Filename to report back to the client.
    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("unknown")
    }
}
