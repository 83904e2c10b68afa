use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Answers gathered by the personalization interview. Immutable once built;
/// every later stage reads it by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizationProfile {
    pub audience: String,
    pub tone: String,
    pub length: String,
    /// 0.0 = highly adapted, 1.0 = faithful to the original book.
    pub originality_score: f32,
    pub special_adaptations: Vec<String>,
    pub book_id: Option<String>,
}

/// Output of the storytelling stage: prose with `[IMAGE_<n>]` anchors plus a
/// prompt for each anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryDraft {
    pub story_text: String,
    #[serde(default)]
    pub image_prompts: HashMap<String, String>,
}

/// Contract between the illustration and formatting stages. The mapping only
/// holds anchors whose generation succeeded; it is always a subset of the
/// draft's prompt keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffPayload {
    pub story_text: String,
    pub image_mapping: HashMap<String, String>,
    pub book_id: Option<String>,
    pub book_title: Option<String>,
    pub generation_status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handoff_payload_round_trips_expected_keys() {
        let mut mapping = HashMap::new();
        mapping.insert("IMAGE_1".to_string(), "generated_images/a.png".to_string());

        let payload = HandoffPayload {
            story_text: "Once upon a time [IMAGE_1]".to_string(),
            image_mapping: mapping,
            book_id: Some("2701".to_string()),
            book_title: Some("Moby Dick".to_string()),
            generation_status: "1 of 1 images generated successfully".to_string(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("story_text").is_some());
        assert!(json.get("image_mapping").is_some());
        assert!(json.get("book_id").is_some());
        assert!(json.get("book_title").is_some());
        assert!(json.get("generation_status").is_some());
    }

    #[test]
    fn test_story_draft_tolerates_missing_prompts() {
        let draft: StoryDraft = serde_json::from_str(r#"{"story_text": "No images."}"#).unwrap();
        assert!(draft.image_prompts.is_empty());
    }
}
