use std::env;
use std::fmt;

use crate::error::{NewsletterError, Result};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo-preview";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsapi.org/v2";

const SETUP_HINT: &str = "To fix this, create ~/.config/aidt-weekly/.env with:\n  \
    OPENAI_API_KEY=your_key_here\n  \
    NEWS_API_KEY=your_key_here   # only needed with --news\n\n\
    Get an OpenAI API key from: https://platform.openai.com/api-keys";

#[derive(Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub news_api_key: Option<String>,
    pub news_api_base_url: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("openai_api_key", &"<redacted>")
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("news_api_key", &self.news_api_key.as_ref().map(|_| "<redacted>"))
            .field("news_api_base_url", &self.news_api_base_url)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_api_key = get("OPENAI_API_KEY").ok_or_else(|| {
            NewsletterError::config(format!("OPENAI_API_KEY not found.\n\n{SETUP_HINT}"))
        })?;

        Ok(Self {
            openai_api_key,
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            news_api_key: get("NEWS_API_KEY"),
            news_api_base_url: get("NEWS_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_NEWS_API_BASE_URL.to_string()),
        })
    }

    /// The search credential, required only for news-backed builds.
    pub fn require_news_api_key(&self) -> Result<&str> {
        self.news_api_key.as_deref().ok_or_else(|| {
            NewsletterError::config(format!(
                "NEWS_API_KEY not found; it is required for news-backed issues.\n\n{SETUP_HINT}"
            ))
        })
    }

    /// Load the first `.env` found into the process environment.
    pub fn load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/aidt-weekly/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("aidt-weekly").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}
