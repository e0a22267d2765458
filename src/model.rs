// The language model the gateway asks for dork queries.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Message, MessagesRequest, MessagesResponse};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 128;
const TEMPERATURE: f32 = 0.2;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("API key not configured")]
    MissingCredential,

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Model service returned {status}: {body}")]
    Status { status: u16, body: String },
}

// Turns a system + user prompt pair into free-form text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, system: &str, user: &str) -> Result<String, ModelError>;
}

pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl AnthropicClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model,
        })
    }
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn generate_text(&self, system: &str, user: &str) -> Result<String, ModelError> {
        let api_key = self.api_key.as_deref().ok_or(ModelError::MissingCredential)?;

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system,
            messages: vec![Message { role: "user", content: user }],
        };

        let res = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ModelError::Status { status: status.as_u16(), body });
        }

        let completion: MessagesResponse = res.json().await?;
        Ok(join_text(completion))
    }
}

// Text blocks joined with a space, anything else (tool use etc) ignored
fn join_text(completion: MessagesResponse) -> String {
    completion
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    // Fake model: hands back a canned reply and remembers the prompts it saw
    pub struct CannedGenerator {
        reply: Option<String>,
        pub seen: Mutex<Vec<(String, String)>>,
    }

    impl CannedGenerator {
        pub fn replying(text: &str) -> Self {
            Self { reply: Some(text.to_string()), seen: Mutex::new(Vec::new()) }
        }

        pub fn failing() -> Self {
            Self { reply: None, seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate_text(&self, system: &str, user: &str) -> Result<String, ModelError> {
            self.seen.lock().unwrap().push((system.to_string(), user.to_string()));
            match &self.reply {
                Some(text) => Ok(text.clone()),
                None => Err(ModelError::Status { status: 529, body: "overloaded".to_string() }),
            }
        }
    }
}
