//! Error types shared across Clipline crates.

use std::path::PathBuf;

/// Top-level error type for Clipline operations.
#[derive(Debug, thiserror::Error)]
pub enum ClipError {
    #[error("Viewport error: {message}")]
    Viewport { message: String },

    #[error("Thumbnail error: {message}")]
    Thumbnail { message: String },

    #[error("Estimate error: {message}")]
    Estimate { message: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ClipError.
pub type ClipResult<T> = Result<T, ClipError>;

impl ClipError {
    pub fn viewport(msg: impl Into<String>) -> Self {
        Self::Viewport {
            message: msg.into(),
        }
    }

    pub fn thumbnail(msg: impl Into<String>) -> Self {
        Self::Thumbnail {
            message: msg.into(),
        }
    }

    pub fn estimate(msg: impl Into<String>) -> Self {
        Self::Estimate {
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ClipError::thumbnail("slot 4 missing");
        assert_eq!(err.to_string(), "Thumbnail error: slot 4 missing");

        let err = ClipError::FileNotFound {
            path: PathBuf::from("/tmp/3.bmp"),
        };
        assert_eq!(err.to_string(), "File not found: /tmp/3.bmp");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ClipError = io.into();
        assert!(matches!(err, ClipError::Io(_)));
    }
}
