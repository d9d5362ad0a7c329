//! Error types for the media server

use hyper::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations
pub type Result<T> = std::result::Result<T, MediaError>;

/// Errors raised while looking up, indexing or reading media
#[derive(Error, Debug)]
pub enum MediaError {
    /// No catalog entry for the requested id
    #[error("Media not found: {0}")]
    NotFound(String),

    /// Catalog entry exists but its file is gone from the blob store
    #[error("File for media '{id}' not found at {}", .path.display())]
    FileMissing { id: String, path: PathBuf },

    /// Entry has no thumbnail, or its thumbnail file is gone
    #[error("Thumbnail not found for media: {0}")]
    ThumbnailNotFound(String),

    /// Id that could escape the media directory or is otherwise unusable
    #[error("Invalid media id: {0}")]
    InvalidId(String),

    /// Catalog manifest could not be read or parsed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// I/O operation error (wraps `std::io::Error`)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// HTTP status reported to the client
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::FileMissing { .. } | Self::ThumbnailNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            Self::Catalog(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code carried in JSON error bodies
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "MEDIA_NOT_FOUND",
            Self::FileMissing { .. } => "FILE_NOT_FOUND",
            Self::ThumbnailNotFound(_) => "THUMBNAIL_NOT_FOUND",
            Self::InvalidId(_) => "INVALID_MEDIA_ID",
            Self::Catalog(_) => "CATALOG_ERROR",
            Self::Io(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to clients; internal details stay in the error log
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Media not found",
            Self::FileMissing { .. } => "File not found on server",
            Self::ThumbnailNotFound(_) => "Thumbnail not found",
            Self::InvalidId(_) => "Invalid media id",
            Self::Catalog(_) | Self::Io(_) => "Internal server error",
        }
    }
}

impl From<toml::de::Error> for MediaError {
    fn from(e: toml::de::Error) -> Self {
        Self::Catalog(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_code_mapping() {
        let e = MediaError::NotFound("42".to_string());
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        assert_eq!(e.code(), "MEDIA_NOT_FOUND");

        let e = MediaError::FileMissing {
            id: "42".to_string(),
            path: PathBuf::from("/tmp/missing.mp4"),
        };
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        assert_eq!(e.code(), "FILE_NOT_FOUND");
        assert!(e.to_string().contains("/tmp/missing.mp4"));

        let e = MediaError::ThumbnailNotFound("42".to_string());
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        assert_eq!(e.code(), "THUMBNAIL_NOT_FOUND");

        let e = MediaError::InvalidId("../etc".to_string());
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);

        let e = MediaError::from(std::io::Error::other("disk on fire"));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.public_message(), "Internal server error");
    }
}
