use crate::agents;
use crate::config::Config;
use crate::formatter;
use crate::illustration::run_illustration;
use crate::image_gen::ImageClient;
use crate::library::BookRecord;
use crate::llm::LlmClient;
use crate::state::PersonalizationProfile;
use crate::storyteller;
use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

pub struct WorkflowManager {
    config: Config,
    llm: Box<dyn LlmClient>,
    images: Box<dyn ImageClient>,
}

impl WorkflowManager {
    pub fn new(config: Config, llm: Box<dyn LlmClient>, images: Box<dyn ImageClient>) -> Self {
        Self {
            config,
            llm,
            images,
        }
    }

    /// Runs storytelling → illustration → formatting for one selected book
    /// and profile, returning the path of the written storybook.
    pub async fn run(
        &self,
        book: &BookRecord,
        profile: &PersonalizationProfile,
    ) -> Result<PathBuf> {
        // Storytelling
        let storyteller_role =
            agents::role(agents::STORYTELLER).context("storyteller role missing from chain")?;
        println!("[{}] Writing the story...", storyteller_role.name);

        let prompt = storyteller::build_story_prompt(book, profile)?;
        let reply = self
            .llm
            .chat(storyteller_role.instruction, &prompt)
            .await
            .context("Storytelling stage failed")?;
        let draft = storyteller::parse_story_reply(&reply)?;

        info!(
            "Story draft: {} anchors, {} prompts",
            storyteller::count_anchors(&draft.story_text),
            draft.image_prompts.len()
        );

        // Illustration
        println!("[{}] Generating illustrations...", agents::ILLUSTRATOR);
        let payload = run_illustration(
            &draft,
            Some(book.id_string()),
            Some(book.title.clone()),
            self.images.as_ref(),
        )
        .await;
        println!("{}", payload.generation_status);

        // The hand-off contract between illustration and formatting; logged
        // so a session transcript shows exactly what crossed the boundary.
        info!("Hand-off payload: {}", serde_json::to_string(&payload)?);

        // Formatting
        println!("[{}] Formatting the storybook...", agents::FORMATTER);
        let illustrated = formatter::apply_image_mapping(&payload.story_text, &payload.image_mapping);
        let output_path = formatter::format_and_save(
            Path::new(&self.config.output_dir),
            &illustrated,
            payload.book_id.as_deref(),
            payload.book_title.as_deref(),
            None,
        )?;

        println!("Storybook saved: {}", output_path.display());
        Ok(output_path)
    }
}
