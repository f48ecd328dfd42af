use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::{NewsletterError, Result};
use crate::markdown;
use crate::models::{Section, SectionKind, SectionStatus};
use crate::newsletter::escape_html;
use crate::prompts::PromptContext;

/// Anything that can turn a system + user prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str, temperature: f32)
        -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Chat-completions client. The key is passed in, never read from globals.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(NewsletterError::config("OpenAI API key is empty"));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| NewsletterError::config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| NewsletterError::generation(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NewsletterError::generation(format!("failed to read response: {e}")))?;

        parse_chat_response(status.as_u16(), &body)
    }
}

fn parse_chat_response(status: u16, body: &str) -> Result<String> {
    if !(200..300).contains(&status) {
        let detail = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        return Err(NewsletterError::generation(format!(
            "API error ({status}): {detail}"
        )));
    }

    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| NewsletterError::generation(format!("malformed response: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| NewsletterError::generation("response contained no text"))
}

/// Produces one rendered [`Section`] per call and never fails.
pub struct SectionGenerator<'a> {
    client: &'a dyn TextGenerator,
    system_prompt: String,
    temperature: f32,
}

impl<'a> SectionGenerator<'a> {
    pub fn new(
        client: &'a dyn TextGenerator,
        system_prompt: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
            temperature,
        }
    }

    /// Override text wins without touching the client; otherwise one
    /// request is made and any failure becomes a visible placeholder.
    #[instrument(level = "info", skip_all, fields(section = %kind))]
    pub async fn generate_section(
        &self,
        kind: SectionKind,
        prompt_template: &str,
        context: &PromptContext,
        override_text: Option<&str>,
    ) -> Section {
        if let Some(text) = override_text.filter(|t| !t.trim().is_empty()) {
            info!(status = %SectionStatus::Overridden, "Using supplied text");
            return Section {
                kind,
                body: markdown::to_html(text),
                status: SectionStatus::Overridden,
                error: None,
            };
        }

        let prompt = context.resolve(prompt_template);
        let t0 = Instant::now();
        match self
            .client
            .complete(&self.system_prompt, &prompt, self.temperature)
            .await
        {
            Ok(text) => {
                info!(
                    status = %SectionStatus::Ok,
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Section generated"
                );
                Section {
                    kind,
                    body: markdown::to_html(&text),
                    status: SectionStatus::Ok,
                    error: None,
                }
            }
            Err(e) => {
                error!(
                    status = %SectionStatus::Failed,
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    error = %e,
                    "Section generation failed; using placeholder"
                );
                failed_section(kind, &e.to_string())
            }
        }
    }
}

/// Placeholder section that shows the error inline.
pub fn failed_section(kind: SectionKind, message: &str) -> Section {
    Section {
        kind,
        body: format!(
            "<p class=\"error\">콘텐츠 생성 오류: {}</p>",
            escape_html(message)
        ),
        status: SectionStatus::Failed,
        error: Some(message.to_string()),
    }
}
