//! LLM Bridge — flattens persona + conversation into one transcript prompt and sends it
//! to an Ollama-compatible `/api/generate` endpoint (non-streaming).

use crate::config::{ChatConfig, DEFAULT_LLM_MODEL, DEFAULT_OLLAMA_ENDPOINT};
use crate::error::LlmError;
use crate::types::{ChatMessage, Role};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Returned in place of a completion whenever the backend cannot be reached or misbehaves.
pub const LLM_FALLBACK_TEXT: &str = "I apologize, but I'm having trouble responding right now.";

/// Ollama generate request body.
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Renders the transcript the model continues: persona, one line per turn, then an
/// `Assistant:` cue. System turns are not rendered; the persona plays that role.
pub fn build_prompt(persona: &str, conversation: &[ChatMessage]) -> String {
    let mut prompt = format!("{}\n\n", persona);
    for msg in conversation {
        match msg.role {
            Role::User => {
                prompt.push_str("Human: ");
                prompt.push_str(&msg.content);
                prompt.push('\n');
            }
            Role::Assistant => {
                prompt.push_str("Assistant: ");
                prompt.push_str(&msg.content);
                prompt.push('\n');
            }
            Role::System => {}
        }
    }
    prompt.push_str("Assistant:");
    prompt
}

/// Client for the local text-generation server.
#[derive(Debug, Clone)]
pub struct LlmClient {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl Default for LlmClient {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_ENDPOINT)
    }
}

impl LlmClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(cfg: &ChatConfig) -> Self {
        let client = match cfg.request_timeout_secs {
            Some(secs) => reqwest::Client::builder()
                .timeout(Duration::from_secs(secs))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            None => reqwest::Client::new(),
        };
        Self {
            endpoint: cfg.ollama_endpoint.trim_end_matches('/').to_string(),
            model: cfg.llm_model.clone(),
            client,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Completion for the conversation. Never fails: any backend problem is logged and
    /// replaced by [`LLM_FALLBACK_TEXT`].
    pub async fn generate(&self, persona: &str, conversation: &[ChatMessage]) -> String {
        match self.try_generate(persona, conversation).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(target: "picto::llm", error = %e, "LLM call failed; using fallback reply");
                LLM_FALLBACK_TEXT.to_string()
            }
        }
    }

    /// Single non-streaming generate call. A missing `response` field yields an empty string.
    pub async fn try_generate(
        &self,
        persona: &str,
        conversation: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let prompt = build_prompt(persona, conversation);
        tracing::debug!(target: "picto::llm", model = %self.model, prompt = %prompt, "sending prompt to LLM");

        let body = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
        };

        let res = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            return Err(LlmError::Status(status.as_u16(), text));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::Decode(e.to_string()))?;
        let reply = parsed.response.unwrap_or_default();
        tracing::info!(target: "picto::llm", chars = reply.len(), "LLM reply received");
        Ok(reply)
    }
}
