//! Gemini API client for video segmentation.
//!
//! Covers the two narrow contracts segclip consumes:
//! - the Files API (upload, processing-state polling, get, delete)
//! - `generateContent` with a video file reference and a text prompt
//!
//! Everything else about the Gemini service is out of scope.

pub mod client;
pub mod error;
pub mod prompts;

pub use client::{FileMetadata, FileState, GeminiClient, DEFAULT_SAMPLING_FPS, GEMINI_MODEL};
pub use error::{GeminiError, GeminiResult};
