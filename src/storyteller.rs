use crate::library::BookRecord;
use crate::state::{PersonalizationProfile, StoryDraft};
use anyhow::{Context, Result};
use regex::Regex;

/// Builds the user prompt for the storytelling call: the book's detail
/// record plus the interview profile, both as JSON the model can quote from.
pub fn build_story_prompt(book: &BookRecord, profile: &PersonalizationProfile) -> Result<String> {
    let book_json = serde_json::to_string_pretty(book)?;
    let profile_json = serde_json::to_string_pretty(profile)?;

    Ok(format!(
        "Adapt the following book into a personalized story.\n\n\
         Book details:\n{}\n\n\
         Personalization profile:\n{}\n\n\
         Structure the story into '## Part N' sections. Place an [IMAGE_<n>] \
         anchor at each key visual moment and write a matching illustration \
         prompt. Respond with a single JSON object:\n\
         {{ \"story_text\": \"...\", \"image_prompts\": {{ \"IMAGE_1\": \"...\" }} }}",
        book_json, profile_json
    ))
}

/// Parses the model's reply into a story draft, tolerating Markdown code
/// fences around the JSON.
pub fn parse_story_reply(reply: &str) -> Result<StoryDraft> {
    let clean = strip_code_blocks(reply);
    let draft: StoryDraft = serde_json::from_str(&clean)
        .with_context(|| format!("Failed to parse story JSON: {}", clean))?;
    Ok(draft)
}

pub fn count_anchors(story_text: &str) -> usize {
    let anchor_re = Regex::new(r"\[IMAGE_\d+\]").expect("valid regex");
    anchor_re.find_iter(story_text).count()
}

/// Models often wrap JSON replies in ```/```json fences.
pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if let Some(inner) = s.strip_prefix("```json") {
        inner.trim_end_matches("```").trim().to_string()
    } else if let Some(inner) = s.strip_prefix("```") {
        inner.trim_end_matches("```").trim().to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn sample_book() -> BookRecord {
        BookRecord {
            id: json!(2701),
            title: "Moby Dick; Or, The Whale".to_string(),
            author: Some("Herman Melville".to_string()),
            genre: Some("Adventure".to_string()),
            overview: Some("A whaling voyage.".to_string()),
            extra: HashMap::new(),
        }
    }

    fn sample_profile() -> PersonalizationProfile {
        PersonalizationProfile {
            audience: "Child 5-8".to_string(),
            tone: "Whimsical".to_string(),
            length: "Short".to_string(),
            originality_score: 0.4,
            special_adaptations: vec!["Make the whale friendly".to_string()],
            book_id: Some("2701".to_string()),
        }
    }

    #[test]
    fn test_prompt_carries_book_and_profile() {
        let prompt = build_story_prompt(&sample_book(), &sample_profile()).unwrap();
        assert!(prompt.contains("Moby Dick"));
        assert!(prompt.contains("Whimsical"));
        assert!(prompt.contains("Make the whale friendly"));
        assert!(prompt.contains("image_prompts"));
    }

    #[test]
    fn test_parse_story_reply_plain_json() {
        let reply = r###"{
            "story_text": "## Part 1\nOnce there was a whale. [IMAGE_1]",
            "image_prompts": { "IMAGE_1": "A friendly white whale" }
        }"###;

        let draft = parse_story_reply(reply).unwrap();
        assert!(draft.story_text.contains("[IMAGE_1]"));
        assert_eq!(
            draft.image_prompts.get("IMAGE_1").map(String::as_str),
            Some("A friendly white whale")
        );
    }

    #[test]
    fn test_parse_story_reply_fenced_json() {
        let reply = "```json\n{\"story_text\": \"Tale.\", \"image_prompts\": {}}\n```";
        let draft = parse_story_reply(reply).unwrap();
        assert_eq!(draft.story_text, "Tale.");
        assert!(draft.image_prompts.is_empty());
    }

    #[test]
    fn test_parse_story_reply_garbage_fails_with_context() {
        let err = parse_story_reply("not json at all").unwrap_err();
        assert!(err.to_string().contains("Failed to parse story JSON"));
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("{}"), "{}");
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("  ```json  \n  {}  \n  ```  "), "{}");
    }

    #[test]
    fn test_count_anchors() {
        assert_eq!(count_anchors("no anchors here"), 0);
        assert_eq!(count_anchors("[IMAGE_1] and [IMAGE_12] but not [IMAGE_]"), 2);
    }
}
