mod agents;
mod config;
mod formatter;
mod illustration;
mod image_gen;
mod interview;
mod library;
mod llm;
mod state;
mod storyteller;
mod workflow;

use anyhow::Result;
use config::Config;
use library::BookApiClient;
use log::warn;
use workflow::WorkflowManager;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 1. Configuration, read once. Missing image credentials only degrade
    //    the run; missing model credentials surface when the storyteller
    //    actually needs them.
    let config = Config::from_env()?;
    config.ensure_directories()?;

    if !config.has_model_credentials() {
        warn!("No model credentials configured (GEMINI_API_KEY / OPENAI_API_KEY)");
    }
    if !config.image.is_configured() {
        println!("Image service not configured; illustrations will be skipped.");
    }

    // 2. Library stage: pick a book.
    let library = BookApiClient::new(&config);
    let book = interview::select_book(&library).await?;

    // 3. Personalization interview.
    let profile = interview::run_interview(Some(book.id_string()))?;

    // 4. Story generation, illustration and formatting.
    let llm = llm::create_llm(&config)?;
    let images = image_gen::create_image_client(&config);
    let manager = WorkflowManager::new(config, llm, images);
    manager.run(&book, &profile).await?;

    Ok(())
}
