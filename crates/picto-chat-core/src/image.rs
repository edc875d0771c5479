//! Image Bridge — Together AI image generation (FLUX.1-schnell) returning base64 payloads.

use crate::config::{ChatConfig, DEFAULT_IMAGE_API_BASE, DEFAULT_IMAGE_MODEL};
use crate::error::ImageError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider ceiling for the free FLUX schnell model.
pub const MAX_STEPS: u32 = 4;

/// Parameters for one generation call. Defaults: 4 steps, 1 image, 1024x768, random seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub steps: u32,
    pub n: u32,
    pub width: u32,
    pub height: u32,
    pub seed: Option<u64>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            steps: 4,
            n: 1,
            width: 1024,
            height: 768,
            seed: None,
        }
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Step count actually sent upstream.
    pub fn clamped_steps(&self) -> u32 {
        self.steps.min(MAX_STEPS)
    }
}

#[derive(Serialize)]
struct GenerationBody<'a> {
    model: &'a str,
    prompt: &'a str,
    width: u32,
    height: u32,
    steps: u32,
    n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Option<Vec<GenerationDatum>>,
}

#[derive(Debug, Deserialize)]
struct GenerationDatum {
    #[serde(default)]
    b64_json: Option<String>,
}

/// Client for the remote image-generation API.
#[derive(Debug, Clone)]
pub struct ImageClient {
    api_base: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl ImageClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_base: DEFAULT_IMAGE_API_BASE.to_string(),
            api_key: api_key.trim().to_string(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
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
            api_base: cfg.image_api_base.trim_end_matches('/').to_string(),
            api_key: cfg.together_api_key.trim().to_string(),
            model: cfg.image_model.clone(),
            client,
        }
    }

    /// Point the client at another OpenAI-style images API (mock servers, proxies).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Base64 of the first generated image, or `None` on any failure.
    pub async fn generate_image(&self, request: &ImageRequest) -> Option<String> {
        tracing::info!(target: "picto::image", prompt = %request.prompt, "generating image");
        match self.try_generate_image(request).await {
            Ok(b64) => Some(b64),
            Err(e) => {
                tracing::error!(target: "picto::image", error = %e, "image generation failed");
                None
            }
        }
    }

    pub async fn try_generate_image(&self, request: &ImageRequest) -> Result<String, ImageError> {
        if self.api_key.is_empty() {
            return Err(ImageError::MissingApiKey);
        }

        let body = GenerationBody {
            model: &self.model,
            prompt: &request.prompt,
            width: request.width,
            height: request.height,
            steps: request.clamped_steps(),
            n: request.n,
            seed: request.seed,
            response_format: "b64_json",
        };

        let res = self
            .client
            .post(format!("{}/images/generations", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            return Err(ImageError::Status(status.as_u16(), text));
        }

        let parsed: GenerationResponse =
            serde_json::from_str(&text).map_err(|e| ImageError::Decode(e.to_string()))?;

        parsed
            .data
            .and_then(|d| d.into_iter().next())
            .and_then(|d| d.b64_json)
            .filter(|b| !b.is_empty())
            .ok_or(ImageError::EmptyResult)
    }
}
