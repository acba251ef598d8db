//! # Scribe Publish
//!
//! Everything between a finished editor session and the blog backend:
//!
//! - [`ImageGallery`]: images attached to a post, uploaded in order
//! - [`BlogClient`]: the REST backend (image upload, create/update/get post)
//! - [`PostDraft`]: post metadata validated into a submission payload
//! - [`TokenProvider`]: where the bearer token comes from
//!
//! ## Learning: Decoupled Attachments
//!
//! Gallery images never touch the document tree. The gallery reports
//! progress and completion over a channel the host owns, so the editor
//! body and the image list can change independently and only meet again
//! in the submission payload.

pub mod auth;
pub mod client;
pub mod draft;
pub mod file;
pub mod gallery;

pub use auth::{StaticToken, TokenProvider};
pub use client::{BlogClient, BlogPost};
pub use draft::{PostDraft, PostPayload, PostStatus};
pub use file::{ImageFile, detect_mime};
pub use gallery::{GalleryEvent, ImageEntry, ImageGallery, ImageUploader, UploadState};

/// Result type for publishing operations
pub type PublishResult<T> = Result<T, PublishError>;

/// Errors that can occur while uploading or publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublishError {
    /// Returns whether trying the same request again could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upload(_) | Self::Network(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for PublishError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            Self::Network(err.to_string())
        } else {
            Self::Upload(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PublishError::Upload("reset".to_string()).is_retryable());
        assert!(
            PublishError::Api {
                status: 502,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !PublishError::Api {
                status: 400,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!PublishError::Validation("title".to_string()).is_retryable());
    }
}
