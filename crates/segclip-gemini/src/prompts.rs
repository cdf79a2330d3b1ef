//! Named analysis prompts.
//!
//! Each prompt asks the model for the same JSON segment shape but
//! steers what counts as a segment. `original` is the default.

const ORIGINAL: &str = r#"
Analyze this first person view video of someone doing a chore and break it down into distinct parts/segments.

The goal is to use the parts to extract clips showing key moments of the chore being done.

Key points of interest:
- User has difficulty using the tool
- User makes progress e.g. opening a door, picking a piece of clothing, opening a lid, etc

For each segment, provide:
- Start time (MM:SS format)
- End time (MM:SS format)
- Brief activity name (2-5 words)
- Short description (1 sentence)

Return ONLY a JSON array with this structure:
[
  {
    "start_time": "00:00",
    "end_time": "00:15",
    "activity": "Activity Name",
    "description": "What happens in this segment"
  }
]

No text before or after the JSON.
"#;

const DETAILED: &str = r#"
Analyze this first person view video of someone performing a chore. Identify and segment key moments with precise timing.

Focus on these critical moments:
- Initial setup or preparation
- Struggles or difficulties (fumbling, multiple attempts, confusion)
- Successful progress milestones (opening, closing, picking up, putting down)
- Tool usage (correct or incorrect)
- Completion of sub-tasks

For each distinct segment, provide:
- Start time (MM:SS format)
- End time (MM:SS format)
- Brief activity name (2-5 words max)
- Detailed description explaining what happens and why it's significant

Return ONLY a JSON array with this exact structure:
[
  {
    "start_time": "00:00",
    "end_time": "00:15",
    "activity": "Activity Name",
    "description": "What happens in this segment"
  }
]

No text before or after the JSON.
"#;

const MINIMAL: &str = r#"
Break down this video into segments showing key actions and moments.

For each segment provide start time (MM:SS), end time (MM:SS), activity name, and brief description.

Return ONLY valid JSON array format:
[
  {
    "start_time": "00:00",
    "end_time": "00:15",
    "activity": "Activity Name",
    "description": "What happens"
  }
]
"#;

const STRUGGLES_FOCUSED: &str = r#"
Analyze this first person video and identify segments where the person:
1. Struggles or has difficulty with a task
2. Makes meaningful progress or achieves a goal
3. Uses tools or objects (successfully or unsuccessfully)

Segment the video to capture these key moments with context (a few seconds before and after).

For each segment, provide:
- Start time (MM:SS format)
- End time (MM:SS format)
- Activity name (2-5 words)
- Description (1 sentence explaining what happens)

Return ONLY a JSON array:
[
  {
    "start_time": "00:00",
    "end_time": "00:15",
    "activity": "Activity Name",
    "description": "What happens in this segment"
  }
]

No text before or after the JSON.
"#;

const MILESTONE_BASED: &str = r#"
Analyze this video and identify milestone moments where something changes or progresses.

Milestones include:
- Starting a new sub-task
- Successfully completing an action (opening, closing, moving, placing)
- Encountering obstacles or challenges
- Achieving a goal or making visible progress

For each milestone segment, provide:
- Start time (MM:SS format) - begin a few seconds before the milestone
- End time (MM:SS format) - end a few seconds after
- Activity name (2-5 words describing the milestone)
- Description (1 sentence)

Return ONLY a JSON array with this structure:
[
  {
    "start_time": "00:00",
    "end_time": "00:15",
    "activity": "Activity Name",
    "description": "What happens in this segment"
  }
]

No text before or after the JSON.
"#;

const PROMPTS: &[(&str, &str)] = &[
    ("original", ORIGINAL),
    ("detailed", DETAILED),
    ("minimal", MINIMAL),
    ("struggles_focused", STRUGGLES_FOCUSED),
    ("milestone_based", MILESTONE_BASED),
];

/// Look up a prompt by name.
pub fn get(name: &str) -> Option<&'static str> {
    PROMPTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, text)| *text)
}

/// Available prompt names, in registry order.
pub fn names() -> Vec<&'static str> {
    PROMPTS.iter().map(|(n, _)| *n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_prompt_exists() {
        assert!(get("original").is_some());
    }

    #[test]
    fn test_unknown_prompt() {
        assert!(get("no_such_prompt").is_none());
    }

    #[test]
    fn test_all_prompts_request_json_arrays() {
        for name in names() {
            let text = get(name).unwrap();
            assert!(text.contains("start_time"), "{name} missing schema");
            assert!(text.contains("JSON"), "{name} missing JSON instruction");
        }
    }
}
