//! Runtime configuration: defaults, optional TOML file, then environment.
//!
//! | Source | Example |
//! |--------|---------|
//! | file (`PICTO_CONFIG`, default `config/picto-chat`) | `port = 3000` |
//! | env, prefix `PICTO`, separator `__` | `PICTO__PORT=8080` |
//! | legacy env | `OLLAMA_ENDPOINT`, `TOGETHER_API_KEY` |

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_LLM_MODEL: &str = "llama3.2:latest";
pub const DEFAULT_IMAGE_API_BASE: &str = "https://api.together.xyz/v1";
pub const DEFAULT_IMAGE_MODEL: &str = "black-forest-labs/FLUX.1-schnell-Free";
pub const DEFAULT_PERSONA: &str = "You are a helpful AI assistant.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the Ollama server (without `/api/generate`).
    pub ollama_endpoint: String,
    pub llm_model: String,
    pub image_api_base: String,
    pub image_model: String,
    /// Together API key. Empty means image generation is unavailable.
    #[serde(default)]
    pub together_api_key: String,
    pub default_persona: String,
    /// Per-request upstream timeout. Unset keeps the HTTP client default.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ollama_endpoint: DEFAULT_OLLAMA_ENDPOINT.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            image_api_base: DEFAULT_IMAGE_API_BASE.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            together_api_key: String::new(),
            default_persona: DEFAULT_PERSONA.to_string(),
            request_timeout_secs: None,
        }
    }
}

impl ChatConfig {
    /// Load config. Precedence: legacy env > `PICTO__*` env > config file > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("PICTO_CONFIG").unwrap_or_else(|_| "config/picto-chat".to_string());
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("ollama_endpoint", defaults.ollama_endpoint)?
            .set_default("llm_model", defaults.llm_model)?
            .set_default("image_api_base", defaults.image_api_base)?
            .set_default("image_model", defaults.image_model)?
            .set_default("together_api_key", defaults.together_api_key)?
            .set_default("default_persona", defaults.default_persona)?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder.add_source(config::File::with_name(&config_path).required(false))
        };

        let built = builder
            .add_source(config::Environment::with_prefix("PICTO").separator("__"))
            .set_override_option("ollama_endpoint", non_empty_env("OLLAMA_ENDPOINT"))?
            .set_override_option("together_api_key", non_empty_env("TOGETHER_API_KEY"))?
            .build()?;

        built.try_deserialize()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn has_image_key(&self) -> bool {
        !self.together_api_key.trim().is_empty()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
