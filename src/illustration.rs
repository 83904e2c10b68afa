use crate::image_gen::{is_placeholder, ImageClient};
use crate::state::{HandoffPayload, StoryDraft};
use log::{info, warn};
use std::collections::HashMap;

/// Hard cap on generation attempts per story, regardless of how many
/// prompts the storyteller authored.
const MAX_IMAGES: usize = 6;

/// Two consecutive failures abort the pass to bound worst-case latency.
const MAX_CONSECUTIVE_FAILURES: usize = 2;

/// Selects prompts in anchor-ordinal order and returns at most
/// `MAX_IMAGES` of them. Keys that are not `IMAGE_<n>` are ignored.
fn select_prompts(prompts: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut ordered: Vec<(usize, String, String)> = prompts
        .iter()
        .filter_map(|(anchor, prompt)| {
            let ordinal: usize = anchor.strip_prefix("IMAGE_")?.parse().ok()?;
            Some((ordinal, anchor.clone(), prompt.clone()))
        })
        .collect();
    ordered.sort_by_key(|(ordinal, _, _)| *ordinal);

    ordered
        .into_iter()
        .take(MAX_IMAGES)
        .map(|(_, anchor, prompt)| (anchor, prompt))
        .collect()
}

/// Runs the illustration stage. Always produces a hand-off payload, even
/// when every generation fails: a story with some images beats no story.
pub async fn run_illustration(
    draft: &StoryDraft,
    book_id: Option<String>,
    book_title: Option<String>,
    client: &dyn ImageClient,
) -> HandoffPayload {
    let selected = select_prompts(&draft.image_prompts);
    let total = selected.len();

    let mut mapping = HashMap::new();
    let mut consecutive_failures = 0;

    for (i, (anchor, prompt)) in selected.iter().enumerate() {
        info!("Generating image {}/{} ({})", i + 1, total, anchor);
        let path = client.generate(prompt).await;

        if is_placeholder(&path) {
            consecutive_failures += 1;
            warn!(
                "Image generation failed for {} ({} consecutive)",
                anchor, consecutive_failures
            );
            if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                warn!("Aborting illustration pass after consecutive failures");
                break;
            }
        } else {
            consecutive_failures = 0;
            mapping.insert(anchor.clone(), path);
        }
    }

    let generation_status = format!(
        "{} of {} images generated successfully",
        mapping.len(),
        total
    );
    info!("{}", generation_status);

    HandoffPayload {
        story_text: draft.story_text.clone(),
        image_mapping: mapping,
        book_id,
        book_title,
        generation_status,
    }
}
