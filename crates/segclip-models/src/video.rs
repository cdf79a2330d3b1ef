//! Uploaded-video ledger records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// How long the Gemini Files API retains an uploaded file.
pub const FILE_TTL_HOURS: i64 = 48;

/// One ledger entry tracking a video's local path and remote upload identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Ledger-assigned id, unique within the ledger
    pub id: u64,

    /// Human-facing name; defaults to the filename stem
    pub display_name: String,

    /// Absolute path of the source file on disk
    pub local_path: String,

    /// Remote identifier fragment (the part after `files/`)
    pub file_id: String,

    /// Full remote resource name (e.g. `files/abc123`)
    pub file_name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Upload timestamp; immutable after creation
    pub uploaded_at: DateTime<Utc>,

    /// Open key/value metadata (remote URI, mime type, ...)
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl VideoRecord {
    /// When the remote copy of this video expires.
    ///
    /// Computed from `uploaded_at` on demand, never stored.
    pub fn expiry_time(&self) -> DateTime<Utc> {
        self.uploaded_at + Duration::hours(FILE_TTL_HOURS)
    }

    /// Whether the remote copy has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expiry_time()
    }

    /// Time remaining until expiry; negative once expired.
    pub fn time_until_expiry(&self) -> Duration {
        self.expiry_time() - Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_uploaded(hours_ago: i64) -> VideoRecord {
        VideoRecord {
            id: 1,
            display_name: "clip".to_string(),
            local_path: "/videos/clip.mp4".to_string(),
            file_id: "abc123".to_string(),
            file_name: "files/abc123".to_string(),
            description: String::new(),
            uploaded_at: Utc::now() - Duration::hours(hours_ago),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn test_fresh_record_not_expired() {
        let record = record_uploaded(1);
        assert!(!record.is_expired());
        assert!(record.time_until_expiry() > Duration::zero());
    }

    #[test]
    fn test_old_record_expired() {
        let record = record_uploaded(49);
        assert!(record.is_expired());
        assert!(record.time_until_expiry() < Duration::zero());
    }

    #[test]
    fn test_expiry_time_is_uploaded_plus_ttl() {
        let record = record_uploaded(0);
        assert_eq!(
            record.expiry_time(),
            record.uploaded_at + Duration::hours(48)
        );
    }

    #[test]
    fn test_serde_round_trip_with_defaults() {
        let json = r#"{
            "id": 3,
            "display_name": "demo",
            "local_path": "/v/demo.mp4",
            "file_id": "xyz",
            "file_name": "files/xyz",
            "uploaded_at": "2026-08-01T10:00:00Z"
        }"#;
        let record: VideoRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 3);
        assert!(record.description.is_empty());
        assert!(record.metadata.is_empty());
    }
}
