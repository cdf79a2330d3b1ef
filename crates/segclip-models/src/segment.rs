//! Video segments and AI response parsing.
//!
//! Gemini is prompted to return a JSON array of labeled time ranges,
//! usually wrapped in a markdown code fence. [`parse_segments_response`]
//! strips the fence and decodes the array into [`Segment`] values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{ModelError, ModelResult};

/// One labeled time range within a video, as identified by Gemini.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Start of the range (`MM:SS` or `HH:MM:SS`)
    pub start_time: String,
    /// End of the range (same format)
    pub end_time: String,
    /// Short activity label (2-5 words)
    pub activity: String,
    /// One-sentence description; may be empty
    #[serde(default)]
    pub description: String,
}

/// Parse a raw Gemini reply into an ordered list of segments.
///
/// The reply may wrap the JSON array in a ```json fence, a plain ```
/// fence, or no fence at all. Each array element must carry
/// `start_time`, `end_time` and `activity`; `description` defaults to
/// the empty string.
pub fn parse_segments_response(response_text: &str) -> ModelResult<Vec<Segment>> {
    let body = strip_code_fence(response_text.trim());

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ModelError::malformed(format!("response is not valid JSON: {e}")))?;

    let items = value
        .as_array()
        .ok_or_else(|| ModelError::malformed("expected a JSON array of segments"))?;

    let mut segments = Vec::with_capacity(items.len());
    for item in items {
        segments.push(segment_from_value(item)?);
    }

    info!("Parsed {} segments from response", segments.len());
    Ok(segments)
}

/// Return the text inside a leading markdown code fence, or the text
/// unchanged when no fence is present.
fn strip_code_fence(text: &str) -> &str {
    if text.starts_with("```json") {
        let inner = &text["```json".len()..];
        match inner.find("```") {
            Some(end) => inner[..end].trim(),
            None => inner.trim(),
        }
    } else if let Some(inner) = text.strip_prefix("```") {
        match inner.find("```") {
            Some(end) => inner[..end].trim(),
            None => inner.trim(),
        }
    } else {
        text
    }
}

fn segment_from_value(value: &Value) -> ModelResult<Segment> {
    let obj = value
        .as_object()
        .ok_or_else(|| ModelError::malformed("segment entry is not a JSON object"))?;

    let required = |key: &'static str| -> ModelResult<String> {
        match obj.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(ModelError::malformed(format!("field '{key}' is not a string"))),
            None => Err(ModelError::MissingField(key)),
        }
    };

    Ok(Segment {
        start_time: required("start_time")?,
        end_time: required("end_time")?,
        activity: required("activity")?,
        description: obj
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}
