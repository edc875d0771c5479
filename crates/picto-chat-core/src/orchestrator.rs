//! Chat orchestrator: one LLM call, a keyword check for image intent, an optional image
//! call, and a single merged reply for the UI.
//!
//! Upstreams sit behind [`TextGenerator`] and [`ImageGenerator`] so the decision logic can
//! run against fakes. The image step never aborts a turn; only a text-generation error
//! (or a bad request) fails the whole turn, and [`ChatOrchestrator::reply`] turns that into
//! an apology payload.

use crate::config::{ChatConfig, DEFAULT_PERSONA};
use crate::error::{ImageError, LlmError, OrchestratorError};
use crate::image::{ImageClient, ImageRequest};
use crate::llm::LlmClient;
use crate::memory::{MemoryEntry, MemoryStore};
use crate::types::{ChatMessage, ChatRequest, ChatResponsePayload, Role};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::sync::Arc;

pub const IMAGE_SUCCESS_TEXT: &str = "\nHere's the image you requested!";
pub const IMAGE_UNAVAILABLE_TEXT: &str =
    "\nI apologize, but I couldn't generate the image at this time.";
pub const IMAGE_ERROR_TEXT: &str = "\nI encountered an error while trying to generate the image.";

/// Steps requested on the plain chat path.
pub const CHAT_IMAGE_STEPS: u32 = 4;
/// Steps requested for seed-consistent generations (clamped by the image client).
pub const CONSISTENT_IMAGE_STEPS: u32 = 20;
/// Upper bound (exclusive) for freshly drawn seeds.
pub const SEED_RANGE: u64 = 1_000_000;

/// Heuristic trigger. Substring match, so "showing" or "remake" count too.
static IMAGE_TRIGGER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)show|image|photo|picture|display|generate|create|draw|make")
        .expect("static image trigger regex")
});

/// Filler words removed from the user's text to leave the subject.
static STOP_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(show|me|an?|the|image|of|picture|photo)\b")
        .expect("static stop-word regex")
});

/// Source of assistant text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, persona: &str, conversation: &[ChatMessage])
        -> Result<String, LlmError>;
}

/// Source of base64 images. `Ok(None)` means the provider produced nothing usable.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &ImageRequest) -> Result<Option<String>, ImageError>;
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn complete(
        &self,
        persona: &str,
        conversation: &[ChatMessage],
    ) -> Result<String, LlmError> {
        Ok(self.generate(persona, conversation).await)
    }
}

#[async_trait]
impl ImageGenerator for ImageClient {
    async fn generate(&self, request: &ImageRequest) -> Result<Option<String>, ImageError> {
        Ok(self.generate_image(request).await)
    }
}

/// True when the lowercased user text plus reply mentions any image keyword.
pub fn wants_image(user_text: &str, reply: &str) -> bool {
    let combined = format!("{} {}", user_text.to_lowercase(), reply).to_lowercase();
    IMAGE_TRIGGER.is_match(&combined)
}

/// Subject of the request: the lowercased user text without filler words, whitespace collapsed.
pub fn image_subject(user_text: &str) -> String {
    let lower = user_text.to_lowercase();
    let stripped = STOP_WORDS.replace_all(&lower, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Prompt sent to the image provider for a user message.
pub fn image_prompt_for(user_text: &str) -> String {
    format!("High quality, detailed image of {}", image_subject(user_text))
}

fn last_user_text(conversation: &[ChatMessage]) -> &str {
    conversation
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

pub struct ChatOrchestrator {
    text: Arc<dyn TextGenerator>,
    images: Arc<dyn ImageGenerator>,
    memory: Arc<MemoryStore>,
    default_persona: String,
}

impl ChatOrchestrator {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
        memory: Arc<MemoryStore>,
    ) -> Self {
        Self {
            text,
            images,
            memory,
            default_persona: DEFAULT_PERSONA.to_string(),
        }
    }

    /// Real Ollama + Together clients over the process-wide memory store.
    pub fn from_config(cfg: &ChatConfig) -> Self {
        Self::new(
            Arc::new(LlmClient::from_config(cfg)),
            Arc::new(ImageClient::from_config(cfg)),
            MemoryStore::global(),
        )
        .with_default_persona(&cfg.default_persona)
    }

    pub fn with_default_persona(mut self, persona: &str) -> Self {
        self.default_persona = persona.to_string();
        self
    }

    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    /// Best-effort reply. Turn-level failures become an apology with `error` set.
    pub async fn reply(&self, request: &ChatRequest) -> ChatResponsePayload {
        match self.respond(request).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(target: "picto::chat", error = %e, "chat turn failed");
                ChatResponsePayload::apology(e.to_string())
            }
        }
    }

    pub async fn respond(
        &self,
        request: &ChatRequest,
    ) -> Result<ChatResponsePayload, OrchestratorError> {
        let persona = request
            .persona
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(self.default_persona.as_str());

        let mut text = self.text.complete(persona, &request.conversation).await?;
        let mut image_base64 = None;

        let user_text = last_user_text(&request.conversation);
        if wants_image(user_text, &text) {
            tracing::info!(target: "picto::chat", user_text = %user_text, "image generation triggered");
            let prompt = image_prompt_for(user_text);
            tracing::info!(target: "picto::chat", prompt = %prompt, "using image prompt");

            let outcome = match request.memory_key.as_deref() {
                Some(key) => self.generate_consistent_image(&prompt, key).await,
                None => {
                    let req = ImageRequest::new(prompt).with_steps(CHAT_IMAGE_STEPS);
                    self.images.generate(&req).await
                }
            };

            match outcome {
                Ok(Some(b64)) => {
                    text.push_str(IMAGE_SUCCESS_TEXT);
                    image_base64 = Some(b64);
                }
                Ok(None) => text.push_str(IMAGE_UNAVAILABLE_TEXT),
                Err(e) => {
                    tracing::error!(target: "picto::chat", error = %e, "image step failed");
                    text.push_str(IMAGE_ERROR_TEXT);
                }
            }
        }

        Ok(ChatResponsePayload {
            text,
            image_base64,
            error: None,
        })
    }

    /// Generates with the seed remembered under `memory_key` (a fresh random seed the first
    /// time) and remembers prompt, seed, and image when the provider returns one.
    pub async fn generate_consistent_image(
        &self,
        prompt: &str,
        memory_key: &str,
    ) -> Result<Option<String>, ImageError> {
        let seed = self
            .memory
            .get_memory(memory_key)
            .and_then(|m| m.seed)
            .unwrap_or_else(|| rand::thread_rng().gen_range(0..SEED_RANGE));

        let req = ImageRequest::new(prompt)
            .with_steps(CONSISTENT_IMAGE_STEPS)
            .with_seed(seed);
        let image = self.images.generate(&req).await?;

        if let Some(b64) = &image {
            self.memory.set_memory(
                memory_key,
                &MemoryEntry {
                    prompt_info: prompt.to_string(),
                    seed: Some(seed),
                    image_url: Some(b64.clone()),
                },
            );
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_matches_keywords_in_either_side() {
        assert!(wants_image("Show me a dog", "Sure."));
        assert!(wants_image("hello", "I can DRAW that"));
        assert!(wants_image("remake it", ""));
        assert!(!wants_image("how are you?", "I am fine, thanks."));
    }

    #[test]
    fn subject_strips_filler_words() {
        assert_eq!(image_subject("show me a picture of a cat"), "cat");
        assert_eq!(image_subject("Show me THE image of an old barn"), "old barn");
        assert_eq!(image_subject("draw a theater"), "draw theater");
    }

    #[test]
    fn prompt_wraps_subject() {
        assert_eq!(
            image_prompt_for("show me a picture of a cat"),
            "High quality, detailed image of cat"
        );
    }

    #[test]
    fn last_user_text_skips_trailing_assistant_turns() {
        let convo = vec![ChatMessage::user("first"), ChatMessage::assistant("reply")];
        assert_eq!(last_user_text(&convo), "first");
        assert_eq!(last_user_text(&[]), "");
    }
}
