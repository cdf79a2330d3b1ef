//! Shared data models for segclip.
//!
//! This crate provides Serde-serializable types for:
//! - Video segments returned by AI analysis
//! - Uploaded-video ledger records with expiry tracking
//! - Saved analysis-results documents
//! - Timestamp string conversion

pub mod analysis;
pub mod error;
pub mod segment;
pub mod timestamp;
pub mod video;

// Re-export common types
pub use analysis::{AnalysisResults, VideoInfo};
pub use error::{ModelError, ModelResult};
pub use segment::{parse_segments_response, Segment};
pub use timestamp::time_to_seconds;
pub use video::{VideoRecord, FILE_TTL_HOURS};
