use crate::config::Config;
use anyhow::Result;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Opaque payload from the book service. The pipeline only reads `id` and
/// `title`; everything else is carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: Value,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl BookRecord {
    /// Book ids come back as numbers or strings depending on the backend.
    pub fn id_string(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Lookup outcomes are values, never `Err`: an unreachable or failing book
/// service degrades the session, it does not abort it.
#[derive(Debug)]
pub enum BookLookup {
    Found(BookRecord),
    NotFound,
    ServiceError(String),
}

#[derive(Debug)]
pub enum BookList {
    Listed(Vec<BookRecord>),
    ServiceError(String),
}

#[derive(Debug)]
pub enum CharacterList {
    Listed(Vec<Value>),
    ServiceError(String),
}

pub struct BookApiClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl BookApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.books.base_url.trim_end_matches('/').to_string(),
            api_key: config.books.api_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("accept", "application/json")
            .timeout(LOOKUP_TIMEOUT);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }
        req
    }

    pub async fn list_books(&self, category: Option<&str>) -> BookList {
        let mut req = self.get("/books");
        if let Some(category) = category {
            req = req.query(&[("category", category)]);
        }

        match Self::fetch_json::<Vec<BookRecord>>(req).await {
            Ok(Some(books)) => BookList::Listed(books),
            Ok(None) => BookList::Listed(vec![]),
            Err(e) => BookList::ServiceError(format!("Failed to fetch books: {}", e)),
        }
    }

    pub async fn get_book(&self, book_id: &str) -> BookLookup {
        let req = self.get(&format!("/books/{}", book_id));
        match Self::fetch_json::<BookRecord>(req).await {
            Ok(Some(book)) => BookLookup::Found(book),
            Ok(None) => BookLookup::NotFound,
            Err(e) => BookLookup::ServiceError(format!("Failed to fetch book details: {}", e)),
        }
    }

    pub async fn get_characters(&self, book_id: &str) -> CharacterList {
        let req = self.get(&format!("/books/{}/characters", book_id));
        match Self::fetch_json::<Vec<Value>>(req).await {
            Ok(Some(characters)) => CharacterList::Listed(characters),
            Ok(None) => CharacterList::Listed(vec![]),
            Err(e) => CharacterList::ServiceError(format!("Failed to fetch characters: {}", e)),
        }
    }

    /// One GET, no retries. `Ok(None)` is a 404; other non-success statuses
    /// and transport errors surface as `Err` for the callers to convert.
    async fn fetch_json<T: serde::de::DeserializeOwned>(
        req: reqwest::RequestBuilder,
    ) -> Result<Option<T>> {
        let resp = req.send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            anyhow::bail!("book service returned {}", resp.status());
        }
        Ok(Some(resp.json::<T>().await?))
    }
}
