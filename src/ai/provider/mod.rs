//! LLM Provider Abstraction
//!
//! Defines the `TextProvider` trait and the request/response shapes shared by
//! every vendor. All providers normalize their output into `AiResponse`.
//!
//! ## Modules
//!
//! - `http`: generic HTTP adapter driven by a `VendorProfile`
//! - `openai`, `anthropic`, `google`: per-vendor profiles
//! - `sse`: Server-Sent-Events decoding for streamed completions

mod anthropic;
mod google;
mod http;
mod openai;
pub mod sse;

pub use http::{HttpProvider, VendorError, VendorProfile};

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{env as env_constants, generation};
use crate::types::{AiError, AiErrorCode, AiResult};

// =============================================================================
// Provider Identity
// =============================================================================

/// Supported language-model vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Anthropic,
    Google,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Google,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Google => "Google",
        }
    }

    /// Environment variable holding this provider's API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => env_constants::OPENAI_API_KEY,
            ProviderKind::Anthropic => env_constants::ANTHROPIC_API_KEY,
            ProviderKind::Google => env_constants::GOOGLE_AI_KEY,
        }
    }

    /// Vendor profile driving the HTTP adapter
    pub fn profile(&self) -> &'static VendorProfile {
        match self {
            ProviderKind::OpenAi => &openai::PROFILE,
            ProviderKind::Anthropic => &anthropic::PROFILE,
            ProviderKind::Google => &google::PROFILE,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "google" => Ok(ProviderKind::Google),
            _ => Err(format!(
                "Unknown provider: {}. Supported: openai, anthropic, google",
                s
            )),
        }
    }
}

// =============================================================================
// Messages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One role-tagged message. Order within a conversation is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: Role,
    pub content: String,
}

impl AiMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// =============================================================================
// Model Configuration
// =============================================================================

/// Per-provider settings loaded from configuration
///
/// Note: API keys are never serialized to output and are redacted in debug
/// output. Providers convert the key to `SecretString` on construction.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Model name (provider-specific); vendor default when absent
    pub model: Option<String>,
    /// API base URL (for proxies and custom endpoints)
    pub api_base: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// API key; takes precedence over the environment variable
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            model: None,
            api_base: None,
            temperature: generation::DEFAULT_TEMPERATURE,
            max_tokens: generation::DEFAULT_MAX_TOKENS,
            api_key: None,
        }
    }
}

/// Per-request overrides; unset fields fall back to provider settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
}

impl ModelParams {
    /// Resolve the immutable model configuration for one request
    pub fn resolve(
        &self,
        provider: ProviderKind,
        settings: &ProviderSettings,
        default_model: &str,
    ) -> AiModelConfig {
        AiModelConfig {
            provider,
            model: self
                .model
                .clone()
                .or_else(|| settings.model.clone())
                .unwrap_or_else(|| default_model.to_string()),
            temperature: self.temperature.unwrap_or(settings.temperature),
            max_tokens: self.max_tokens.unwrap_or(settings.max_tokens),
            top_p: self.top_p,
            frequency_penalty: self.frequency_penalty,
            presence_penalty: self.presence_penalty,
        }
    }
}

/// Fully resolved model configuration, immutable per request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiModelConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
}

/// Input to a single text-generation call
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub messages: Vec<AiMessage>,
    pub params: ModelParams,
    /// Request deadline; the service default applies when absent
    pub timeout: Option<Duration>,
}

impl GenerateOptions {
    pub fn new(messages: Vec<AiMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.params.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.params.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.params.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// =============================================================================
// Response
// =============================================================================

/// Token usage in the shared shape every vendor maps into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    /// Accumulate another usage record
    pub fn add(&mut self, other: &Usage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

/// Normalized generation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub content: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl AiResponse {
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            usage: None,
            metadata: None,
        }
    }

    pub fn with_usage(mut self, usage: Option<Usage>) -> Self {
        self.usage = usage;
        self
    }

    /// Insert one metadata entry, creating the map on first use
    pub fn insert_metadata(&mut self, key: &str, value: Value) {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value);
    }
}

/// Incremental text deltas from a streamed completion
pub type TextStream = Pin<Box<dyn Stream<Item = AiResult<String>> + Send>>;

// =============================================================================
// Provider Trait
// =============================================================================

/// A language-model backend able to turn messages into text
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Vendor behind this provider
    fn kind(&self) -> ProviderKind;

    /// Model used when a request does not name one
    fn model(&self) -> &str;

    /// Generate a complete response
    async fn generate_text(&self, options: &GenerateOptions) -> AiResult<AiResponse>;

    /// Stream text deltas; providers without a streaming endpoint refuse
    async fn stream_text(&self, _options: &GenerateOptions) -> AiResult<TextStream> {
        Err(AiError::new(
            AiErrorCode::StreamingNotSupported,
            format!("{} does not support streaming", self.kind().display_name()),
        )
        .with_provider(self.kind()))
    }
}

/// Shared provider type for concurrent access across request handlers
pub type SharedProvider = Arc<dyn TextProvider>;

/// Create a shared provider for `kind`
///
/// Fails with `MISSING_API_KEY` when `api_key` is absent or blank.
pub fn create_provider(
    kind: ProviderKind,
    api_key: Option<String>,
    settings: &ProviderSettings,
) -> AiResult<SharedProvider> {
    Ok(Arc::new(HttpProvider::new(
        kind.profile(),
        api_key,
        settings,
    )?))
}
