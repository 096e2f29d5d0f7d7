use std::env;

use anyhow::{Context, Result};
use async_openai::{Client, config::OpenAIConfig};
use async_trait::async_trait;

use super::response::request_single_text_response;
use crate::utils::trim_line;

pub const DEFAULT_MODEL: &str = "gpt-5-nano";
pub const MODEL_ENV: &str = "BLUESTUDY_MODEL";
pub const API_BASE_ENV: &str = "BLUESTUDY_API_BASE";

/// A text-completion service reachable with a credential and a prompt.
///
/// Implementations must be free of side effects beyond the call itself: the
/// rotating generator discards failed attempts and tries the next credential.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, credential: &str, model: &str, prompt: &str) -> Result<String>;
}

/// Responses API backend. A client is built per credential.
#[derive(Debug, Clone, Default)]
pub struct OpenAiGenerator {
    api_base: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(api_base: Option<String>) -> Self {
        Self { api_base }
    }

    pub fn from_env() -> Self {
        let api_base = env::var(API_BASE_ENV)
            .ok()
            .and_then(|value| trim_line(&value).map(str::to_string));
        Self::new(api_base)
    }

    fn client_for(&self, credential: &str) -> Client<OpenAIConfig> {
        let mut config = OpenAIConfig::new().with_api_key(credential);
        if let Some(api_base) = &self.api_base {
            config = config.with_api_base(api_base);
        }
        Client::with_config(config)
    }

    pub async fn healthcheck(&self, credential: &str) -> Result<()> {
        self.client_for(credential)
            .models()
            .list()
            .await
            .context("Failed to validate API key")?;
        Ok(())
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn complete(&self, credential: &str, model: &str, prompt: &str) -> Result<String> {
        let client = self.client_for(credential);
        request_single_text_response(&client, model, prompt).await
    }
}

/// `--model` flag, then `BLUESTUDY_MODEL`, then the built-in default.
pub fn resolve_model(flag: Option<String>) -> String {
    flag.and_then(|value| trim_line(&value).map(str::to_string))
        .or_else(|| {
            env::var(MODEL_ENV)
                .ok()
                .and_then(|value| trim_line(&value).map(str::to_string))
        })
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_flag_wins() {
        assert_eq!(resolve_model(Some(" gpt-4o-mini ".into())), "gpt-4o-mini");
    }

    #[test]
    fn blank_model_flag_is_ignored() {
        let model = resolve_model(Some("   ".into()));
        assert!(!model.trim().is_empty());
    }
}
