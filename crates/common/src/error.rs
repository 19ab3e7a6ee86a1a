//! Error types shared across Holo-Control crates.

use std::path::PathBuf;

/// Top-level error type for Holo-Control operations.
#[derive(Debug, thiserror::Error)]
pub enum HoloError {
    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Stream error: {message}")]
    Stream { message: String },

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

/// Result type alias using HoloError.
pub type HoloResult<T> = Result<T, HoloError>;

impl HoloError {
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
