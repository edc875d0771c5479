//! Integration test: chat orchestration with fake text and image generators.
//!
//! Covers the image decision, prompt derivation, success/failure sentences, the apology
//! path, and seed reuse for memory-keyed generations.

use async_trait::async_trait;
use picto_chat_core::{
    ChatMessage, ChatOrchestrator, ChatRequest, ImageError, ImageGenerator, ImageRequest, LlmError,
    MemoryEntry, MemoryStore, TextGenerator, IMAGE_ERROR_TEXT, IMAGE_SUCCESS_TEXT,
    IMAGE_UNAVAILABLE_TEXT,
};
use std::sync::{Arc, Mutex};

struct FixedText(&'static str);

#[async_trait]
impl TextGenerator for FixedText {
    async fn complete(&self, _: &str, _: &[ChatMessage]) -> Result<String, LlmError> {
        Ok(self.0.to_string())
    }
}

/// Records the persona it was given.
#[derive(Default)]
struct PersonaSpy(Mutex<Vec<String>>);

#[async_trait]
impl TextGenerator for PersonaSpy {
    async fn complete(&self, persona: &str, _: &[ChatMessage]) -> Result<String, LlmError> {
        self.0.lock().unwrap().push(persona.to_string());
        Ok("ok".to_string())
    }
}

struct BrokenText;

#[async_trait]
impl TextGenerator for BrokenText {
    async fn complete(&self, _: &str, _: &[ChatMessage]) -> Result<String, LlmError> {
        Err(LlmError::Decode("unexpected token".to_string()))
    }
}

enum Outcome {
    Image(&'static str),
    Nothing,
    Fail,
}

struct FakeImages {
    outcome: Outcome,
    calls: Mutex<Vec<ImageRequest>>,
}

impl FakeImages {
    fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<ImageRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate(&self, request: &ImageRequest) -> Result<Option<String>, ImageError> {
        self.calls.lock().unwrap().push(request.clone());
        match self.outcome {
            Outcome::Image(b64) => Ok(Some(b64.to_string())),
            Outcome::Nothing => Ok(None),
            Outcome::Fail => Err(ImageError::Status(500, "provider exploded".to_string())),
        }
    }
}

fn orchestrator(text: Arc<dyn TextGenerator>, images: Arc<FakeImages>) -> ChatOrchestrator {
    ChatOrchestrator::new(text, images, Arc::new(MemoryStore::new()))
}

fn request(last: &str) -> ChatRequest {
    ChatRequest {
        conversation: vec![
            ChatMessage::assistant("Hi! How can I help?"),
            ChatMessage::user(last),
        ],
        persona: None,
        memory_key: None,
    }
}

#[tokio::test]
async fn no_keywords_means_no_image_call() {
    let images = FakeImages::new(Outcome::Image("aW1n"));
    let orch = orchestrator(Arc::new(FixedText("I'm doing well, thanks.")), images.clone());

    let payload = orch.reply(&request("how are you today?")).await;
    assert_eq!(payload.text, "I'm doing well, thanks.");
    assert!(payload.image_base64.is_none());
    assert!(payload.error.is_none());
    assert!(images.calls().is_empty());
}

#[tokio::test]
async fn image_request_uses_stripped_prompt_and_success_sentence() {
    let images = FakeImages::new(Outcome::Image("aW1n"));
    let orch = orchestrator(Arc::new(FixedText("Here is a cat.")), images.clone());

    let payload = orch.reply(&request("show me a picture of a cat")).await;
    assert_eq!(payload.image_base64.as_deref(), Some("aW1n"));
    assert!(payload.text.starts_with("Here is a cat."));
    assert!(payload.text.ends_with(IMAGE_SUCCESS_TEXT));

    let calls = images.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].prompt, "High quality, detailed image of cat");
    assert_eq!(calls[0].steps, 4);
    assert!(calls[0].seed.is_none());
}

#[tokio::test]
async fn keyword_in_reply_alone_triggers_image() {
    let images = FakeImages::new(Outcome::Nothing);
    let orch = orchestrator(Arc::new(FixedText("I could draw that for you.")), images.clone());

    let payload = orch.reply(&request("a lighthouse at dusk")).await;
    assert_eq!(images.calls().len(), 1);
    assert!(payload.image_base64.is_none());
    assert!(payload.text.ends_with(IMAGE_UNAVAILABLE_TEXT));
}

#[tokio::test]
async fn image_error_appends_error_sentence_without_failing_turn() {
    let images = FakeImages::new(Outcome::Fail);
    let orch = orchestrator(Arc::new(FixedText("Sure.")), images);

    let payload = orch.reply(&request("draw a dragon")).await;
    assert_eq!(payload.text, format!("Sure.{}", IMAGE_ERROR_TEXT));
    assert!(payload.image_base64.is_none());
    assert!(payload.error.is_none());
}

#[tokio::test]
async fn text_failure_becomes_apology_with_error() {
    let orch = orchestrator(Arc::new(BrokenText), FakeImages::new(Outcome::Nothing));

    let payload = orch.reply(&request("hello")).await;
    assert_eq!(payload.text, "I apologize, but I encountered an error.");
    assert!(payload.error.unwrap().contains("unexpected token"));
    assert!(payload.image_base64.is_none());
}

#[tokio::test]
async fn persona_defaults_when_missing_or_empty() {
    let spy = Arc::new(PersonaSpy::default());
    let orch = orchestrator(spy.clone(), FakeImages::new(Outcome::Nothing));

    let mut req = request("hi");
    orch.reply(&req).await;
    req.persona = Some(String::new());
    orch.reply(&req).await;
    req.persona = Some("You are a pirate.".to_string());
    orch.reply(&req).await;

    let seen = spy.0.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            "You are a helpful AI assistant.".to_string(),
            "You are a helpful AI assistant.".to_string(),
            "You are a pirate.".to_string(),
        ]
    );
}

#[tokio::test]
async fn consistent_image_reuses_stored_seed() {
    let images = FakeImages::new(Outcome::Image("Y2F0"));
    let orch = orchestrator(Arc::new(FixedText("ok")), images.clone());
    orch.memory().set_memory(
        "cat",
        &MemoryEntry {
            prompt_info: "old".to_string(),
            seed: Some(777),
            image_url: None,
        },
    );

    let out = orch.generate_consistent_image("a cat", "cat").await.unwrap();
    assert_eq!(out.as_deref(), Some("Y2F0"));

    let calls = images.calls();
    assert_eq!(calls[0].seed, Some(777));
    assert_eq!(calls[0].steps, 20);

    let stored = orch.memory().get_memory("cat").unwrap();
    assert_eq!(stored.prompt_info, "a cat");
    assert_eq!(stored.seed, Some(777));
    assert_eq!(stored.image_url.as_deref(), Some("Y2F0"));
}

#[tokio::test]
async fn consistent_image_draws_seed_once_and_keeps_it() {
    let images = FakeImages::new(Outcome::Image("Y2F0"));
    let orch = orchestrator(Arc::new(FixedText("ok")), images.clone());

    orch.generate_consistent_image("a cat", "cat").await.unwrap();
    orch.generate_consistent_image("a cat again", "cat").await.unwrap();

    let calls = images.calls();
    let first = calls[0].seed.unwrap();
    assert!(first < 1_000_000);
    assert_eq!(calls[1].seed, Some(first));
}

#[tokio::test]
async fn failed_consistent_image_does_not_store() {
    let images = FakeImages::new(Outcome::Nothing);
    let orch = orchestrator(Arc::new(FixedText("ok")), images);

    assert!(orch.generate_consistent_image("a cat", "cat").await.unwrap().is_none());
    assert!(orch.memory().get_memory("cat").is_none());
}

#[tokio::test]
async fn memory_key_routes_chat_image_through_seed_memory() {
    let images = FakeImages::new(Outcome::Image("aW1n"));
    let orch = orchestrator(Arc::new(FixedText("Here you go.")), images.clone());

    let mut req = request("show me a picture of a cat");
    req.memory_key = Some("cat".to_string());
    let payload = orch.reply(&req).await;

    assert_eq!(payload.image_base64.as_deref(), Some("aW1n"));
    let stored = orch.memory().get_memory("cat").unwrap();
    assert_eq!(stored.prompt_info, "High quality, detailed image of cat");
    assert_eq!(images.calls()[0].seed, stored.seed);
}
