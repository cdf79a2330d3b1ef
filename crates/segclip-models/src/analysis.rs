//! Saved analysis-results documents.
//!
//! One document is written per prompt run so extractions can be replayed
//! later without hitting the API again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ModelResult;
use crate::segment::Segment;
use crate::video::VideoRecord;

/// Results of one analysis run with a named prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResults {
    /// Name of the prompt used
    pub prompt_name: String,

    /// When the analysis ran
    pub timestamp: DateTime<Utc>,

    /// Number of segments found
    pub segment_count: usize,

    /// Segments in response order
    pub segments: Vec<Segment>,

    /// The ledger record the analysis ran against, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_info: Option<VideoInfo>,
}

/// Slimmed-down ledger record embedded in a results document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: u64,
    pub display_name: String,
    pub local_path: String,
}

impl From<&VideoRecord> for VideoInfo {
    fn from(record: &VideoRecord) -> Self {
        Self {
            id: record.id,
            display_name: record.display_name.clone(),
            local_path: record.local_path.clone(),
        }
    }
}

impl AnalysisResults {
    /// Build a results document from a parsed segment list.
    pub fn new(prompt_name: impl Into<String>, segments: Vec<Segment>, video: Option<&VideoRecord>) -> Self {
        Self {
            prompt_name: prompt_name.into(),
            timestamp: Utc::now(),
            segment_count: segments.len(),
            segments,
            video_info: video.map(VideoInfo::from),
        }
    }

    /// Load a results document from disk.
    pub fn load(path: impl AsRef<Path>) -> ModelResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write the document as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> ModelResult<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minimal_analysis.json");

        let segments = vec![Segment {
            start_time: "00:00".to_string(),
            end_time: "00:10".to_string(),
            activity: "Open door".to_string(),
            description: "a".to_string(),
        }];
        let results = AnalysisResults::new("minimal", segments, None);
        results.save(&path).unwrap();

        let loaded = AnalysisResults::load(&path).unwrap();
        assert_eq!(loaded.prompt_name, "minimal");
        assert_eq!(loaded.segment_count, 1);
        assert_eq!(loaded.segments[0].activity, "Open door");
        assert!(loaded.video_info.is_none());
    }
}
