//! Gemini client error types.

use thiserror::Error;

pub type GeminiResult<T> = Result<T, GeminiError>;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Gemini API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Video processing failed: file entered state {0}")]
    ProcessingFailed(String),

    #[error("Empty response: no content in Gemini reply")]
    EmptyResponse,

    #[error(transparent)]
    Model(#[from] segclip_models::ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeminiError {
    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }
}
