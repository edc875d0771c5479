//! Picto Chat — Core library.
//! LLM and image bridges, seed memory, and the reply orchestrator behind `/api/chat`.

pub mod config;
pub mod error;
pub mod image;
pub mod llm;
pub mod memory;
pub mod orchestrator;
pub mod types;

pub use config::ChatConfig;
pub use error::{ImageError, LlmError, OrchestratorError};
pub use image::{ImageClient, ImageRequest, MAX_STEPS};
pub use llm::{build_prompt, LlmClient, LLM_FALLBACK_TEXT};
pub use memory::{MemoryEntry, MemoryStore};
pub use orchestrator::{
    image_prompt_for, image_subject, wants_image, ChatOrchestrator, ImageGenerator, TextGenerator,
    IMAGE_ERROR_TEXT, IMAGE_SUCCESS_TEXT, IMAGE_UNAVAILABLE_TEXT,
};
pub use types::{ChatMessage, ChatRequest, ChatResponsePayload, Role};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
