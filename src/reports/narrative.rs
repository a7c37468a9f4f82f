//! Client for the external text-generation service that writes report
//! narratives.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::NarrativeConfig;

const SYSTEM_PROMPT: &str = "You are a nutritionist writing a short, encouraging summary of a \
client's food and hydration log. Use at most three short paragraphs. Do not invent numbers.";

#[async_trait]
pub trait NarrativeWriter: Send + Sync {
    /// False when no service is configured; callers skip the call entirely.
    fn enabled(&self) -> bool {
        true
    }

    async fn write(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Used when no API key is configured.
pub struct DisabledNarrative;

#[async_trait]
impl NarrativeWriter for DisabledNarrative {
    fn enabled(&self) -> bool {
        false
    }

    async fn write(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("narrative service not configured")
    }
}

/// OpenAI-compatible `chat/completions` client.
pub struct ChatCompletionsWriter {
    client: reqwest::Client,
    cfg: NarrativeConfig,
}

impl ChatCompletionsWriter {
    pub fn new(cfg: NarrativeConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("build narrative http client")?;
        Ok(Self { client, cfg })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

fn first_reply(res: ChatResponse) -> anyhow::Result<String> {
    res.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .context("narrative service returned no text")
}

#[async_trait]
impl NarrativeWriter for ChatCompletionsWriter {
    async fn write(&self, prompt: &str) -> anyhow::Result<String> {
        let body = ChatRequest {
            model: &self.cfg.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.4,
        };
        let res = self
            .client
            .post(&self.cfg.api_url)
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .context("narrative request")?
            .error_for_status()
            .context("narrative service status")?
            .json::<ChatResponse>()
            .await
            .context("decode narrative response")?;
        let text = first_reply(res)?;
        debug!(chars = text.len(), "narrative generated");
        Ok(text)
    }
}
