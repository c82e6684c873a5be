//! Pre-flight file checks
//!
//! Pure size/type gate run before any upload is attempted.

use std::path::Path;

/// Upload limit: 10MB
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Content types the interpretation service accepts
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "application/pdf"];

/// A document selected for upload
#[derive(Debug, Clone)]
pub struct FileHandle {
    pub name: String,
    /// Declared size in bytes
    pub size: u64,
    /// Declared MIME type
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileHandle {
    /// Build a handle from in-memory bytes; size is taken from the buffer
    pub fn from_bytes(name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            size: bytes.len() as u64,
            content_type: content_type.to_string(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its content type from the extension
    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self::from_bytes(&name, &content_type, bytes))
    }

    /// Size in megabytes, for display
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / 1024.0 / 1024.0
    }
}

/// Outcome of [`validate_file`]
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid,
    Invalid { reason: String },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid { reason } => Some(reason),
        }
    }
}

/// Check a candidate upload against the size and type limits
pub fn validate_file(file: Option<&FileHandle>) -> Validation {
    let Some(file) = file else {
        return Validation::Invalid {
            reason: "No file selected".to_string(),
        };
    };

    if file.size > MAX_FILE_SIZE {
        return Validation::Invalid {
            reason: format!("File size exceeds 10MB limit ({:.1}MB)", file.size_mb()),
        };
    }

    if !ALLOWED_CONTENT_TYPES.contains(&file.content_type.as_str()) {
        return Validation::Invalid {
            reason: "Unsupported file type. Please upload JPG, PNG, or PDF files.".to_string(),
        };
    }

    Validation::Valid
}
