use anyhow::{Context, Result};
use std::env;
use std::fs;
use url::Url;

/// Runtime configuration, read once from the environment at startup and
/// passed by reference to every client. Missing image-service settings are
/// not an error; the image client degrades to placeholders instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub image: ImageServiceConfig,
    pub books: BookServiceConfig,
    pub output_dir: String,
    pub images_dir: String,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: String, // "gemini" or "openai"
    pub gemini: Option<GeminiConfig>,
    pub openai: Option<OpenAIConfig>,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageServiceConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl ImageServiceConfig {
    /// Both the key and the base URL are required for a real generation call.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.base_url.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct BookServiceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

fn default_book_base_url() -> String {
    "http://127.0.0.1:8010".to_string()
}

fn default_output_dir() -> String {
    "output_stories".to_string()
}

fn default_images_dir() -> String {
    "generated_images".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an injected lookup so tests can supply a fake
    /// environment instead of mutating the process one.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = lookup("LLM_PROVIDER").unwrap_or_else(|| "gemini".to_string());

        let gemini = lookup("GEMINI_API_KEY").map(|api_key| GeminiConfig {
            api_key,
            model: lookup("GEMINI_MODEL").unwrap_or_else(default_gemini_model),
        });

        let openai = lookup("OPENAI_API_KEY").map(|api_key| OpenAIConfig {
            api_key,
            model: lookup("OPENAI_MODEL").unwrap_or_else(default_openai_model),
            base_url: lookup("OPENAI_BASE_URL"),
        });

        let image = ImageServiceConfig {
            api_key: lookup("AIRBRUSH_API_KEY"),
            base_url: lookup("AIRBRUSH_BASE_URL"),
        };
        if let Some(base) = &image.base_url {
            Url::parse(base).context("AIRBRUSH_BASE_URL is not a valid URL")?;
        }

        let books = BookServiceConfig {
            base_url: lookup("BOOK_API_BASE_URL").unwrap_or_else(default_book_base_url),
            api_key: lookup("BOOK_API_KEY"),
        };
        Url::parse(&books.base_url).context("BOOK_API_BASE_URL is not a valid URL")?;

        Ok(Self {
            llm: LlmConfig {
                provider,
                gemini,
                openai,
            },
            image,
            books,
            output_dir: lookup("OUTPUT_DIR").unwrap_or_else(default_output_dir),
            images_dir: lookup("IMAGES_DIR").unwrap_or_else(default_images_dir),
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        fs::create_dir_all(&self.images_dir)?;
        Ok(())
    }

    /// True when some model backend has credentials. Absence is a warning at
    /// startup, not an abort; the pipeline only fails when the storytelling
    /// stage actually needs a model.
    pub fn has_model_credentials(&self) -> bool {
        self.llm.gemini.is_some() || self.llm.openai.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(map: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn test_defaults_with_empty_environment() {
        let vars = HashMap::new();
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();

        assert_eq!(config.llm.provider, "gemini");
        assert!(config.llm.gemini.is_none());
        assert!(!config.image.is_configured());
        assert_eq!(config.books.base_url, "http://127.0.0.1:8010");
        assert_eq!(config.output_dir, "output_stories");
        assert_eq!(config.images_dir, "generated_images");
        assert!(!config.has_model_credentials());
    }

    #[test]
    fn test_image_service_requires_both_key_and_url() {
        let mut vars = HashMap::new();
        vars.insert("AIRBRUSH_API_KEY", "secret");
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();
        assert!(!config.image.is_configured());

        vars.insert("AIRBRUSH_BASE_URL", "https://example.com");
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();
        assert!(config.image.is_configured());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut vars = HashMap::new();
        vars.insert("BOOK_API_BASE_URL", "not a url");
        assert!(Config::from_lookup(lookup_from(&vars)).is_err());
    }

    #[test]
    fn test_model_credentials_detected() {
        let mut vars = HashMap::new();
        vars.insert("GEMINI_API_KEY", "key");
        vars.insert("GEMINI_MODEL", "gemini-2.5-pro");
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();

        assert!(config.has_model_credentials());
        assert_eq!(config.llm.gemini.as_ref().unwrap().model, "gemini-2.5-pro");
    }
}
