//! Error types for the upstream bridges and the orchestrator.

use thiserror::Error;

/// Failure talking to the text-generation backend.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM backend returned {0}: {1}")]
    Status(u16, String),

    #[error("LLM response parse: {0}")]
    Decode(String),
}

/// Failure talking to the image-generation backend.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("image API key not configured")]
    MissingApiKey,

    #[error("image request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("image API returned {0}: {1}")]
    Status(u16, String),

    #[error("image response parse: {0}")]
    Decode(String),

    #[error("image API returned no base64 payload")]
    EmptyResult,
}

/// Failure that aborts a whole chat turn. Surfaced to the caller as an apology plus `error`.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Text(#[from] LlmError),

    #[error("invalid chat request: {0}")]
    InvalidRequest(String),
}
