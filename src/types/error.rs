//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Layers
//!
//! - **AiError**: tagged error produced by the text-generation core. Carries a
//!   machine-readable code and an HTTP-like status so the calling route layer
//!   can map it to a user-facing response.
//! - **ScriptError**: application error wrapping `AiError` together with IO,
//!   configuration and prompt failures.
//!
//! Nothing here is retried; errors surface immediately to the caller.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::ai::provider::ProviderKind;

// =============================================================================
// Error Codes
// =============================================================================

/// Machine-readable error codes produced by the AI core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiErrorCode {
    /// Adapter constructed without credentials
    MissingApiKey,
    /// Requested or default provider is not registered
    ProviderNotAvailable,
    /// Request exceeded its timeout
    RequestTimeout,
    /// Non-2xx vendor response whose body carried no usable code
    ProviderApi(ProviderKind),
    /// Code reported by the vendor in its error body
    Vendor(String),
    /// Unexpected failure while generating
    Generation,
    /// Response body unreadable while streaming
    Stream,
    /// Provider has no streaming endpoint
    StreamingNotSupported,
    /// 2xx response that could not be decoded
    InvalidResponse,
}

impl std::fmt::Display for AiErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "MISSING_API_KEY"),
            Self::ProviderNotAvailable => write!(f, "PROVIDER_NOT_AVAILABLE"),
            Self::RequestTimeout => write!(f, "REQUEST_TIMEOUT"),
            Self::ProviderApi(kind) => write!(f, "{}_API_ERROR", kind.as_str().to_uppercase()),
            Self::Vendor(code) => write!(f, "{}", code),
            Self::Generation => write!(f, "GENERATION_ERROR"),
            Self::Stream => write!(f, "STREAM_ERROR"),
            Self::StreamingNotSupported => write!(f, "STREAMING_NOT_SUPPORTED"),
            Self::InvalidResponse => write!(f, "INVALID_RESPONSE"),
        }
    }
}

impl AiErrorCode {
    /// HTTP-equivalent status used when the error carries none of its own
    pub fn default_status(&self) -> u16 {
        match self {
            Self::MissingApiKey | Self::ProviderNotAvailable | Self::StreamingNotSupported => 400,
            Self::RequestTimeout => 408,
            Self::InvalidResponse => 502,
            Self::ProviderApi(_) | Self::Vendor(_) | Self::Generation | Self::Stream => 500,
        }
    }
}

// =============================================================================
// AI Error
// =============================================================================

/// Tagged error raised by providers and the AI service
#[derive(Debug, Clone)]
pub struct AiError {
    /// Human-readable message
    pub message: String,
    /// Machine-readable code
    pub code: AiErrorCode,
    /// HTTP-like status
    pub status_code: Option<u16>,
    /// Extra payload (vendor error body, timeout duration, ...)
    pub details: Option<Value>,
    /// Provider that produced the error
    pub provider: Option<ProviderKind>,
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.code, self.message)
        } else {
            write!(f, "[{}] {}", self.code, self.message)
        }
    }
}

impl std::error::Error for AiError {}

impl AiError {
    /// Create an error with its code's default status
    pub fn new(code: AiErrorCode, message: impl Into<String>) -> Self {
        let status_code = Some(code.default_status());
        Self {
            message: message.into(),
            code,
            status_code,
            details: None,
            provider: None,
        }
    }

    /// Create an error without a status; `normalized` fills it in later
    pub fn bare(code: AiErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            status_code: None,
            details: None,
            provider: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn missing_api_key(provider: ProviderKind) -> Self {
        Self::new(
            AiErrorCode::MissingApiKey,
            format!(
                "{} API key is not configured. Set {}",
                provider.display_name(),
                provider.api_key_env()
            ),
        )
        .with_provider(provider)
    }

    pub fn provider_not_available(provider: ProviderKind) -> Self {
        Self::new(
            AiErrorCode::ProviderNotAvailable,
            format!("Provider {} is not available", provider),
        )
        .with_provider(provider)
    }

    pub fn request_timeout(provider: ProviderKind, timeout: Duration) -> Self {
        Self::new(
            AiErrorCode::RequestTimeout,
            format!(
                "{} request timed out after {}ms",
                provider.display_name(),
                timeout.as_millis()
            ),
        )
        .with_provider(provider)
        .with_details(serde_json::json!({ "timeout_ms": timeout.as_millis() as u64 }))
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::new(AiErrorCode::Generation, message)
    }

    pub fn stream(message: impl Into<String>) -> Self {
        Self::new(AiErrorCode::Stream, message)
    }

    /// Fill in the defaults applied when an adapter error reaches the service
    pub fn normalized(mut self) -> Self {
        if self.status_code.is_none() {
            self.status_code = Some(500);
        }
        self
    }

    /// Status code, falling back to the code's default
    pub fn status(&self) -> u16 {
        self.status_code
            .unwrap_or_else(|| self.code.default_status())
    }

    pub fn is_timeout(&self) -> bool {
        self.code == AiErrorCode::RequestTimeout
    }
}

pub type AiResult<T> = std::result::Result<T, AiError>;

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ScriptError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // AI Errors
    // -------------------------------------------------------------------------
    #[error("AI error: {0}")]
    Ai(AiError),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Unknown report type: {0}")]
    UnknownReportType(String),

    #[error("Invalid chunking options: {0}")]
    InvalidChunking(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Input error: {0}")]
    Input(String),
}

impl From<AiError> for ScriptError {
    fn from(err: AiError) -> Self {
        ScriptError::Ai(err)
    }
}

pub type Result<T> = std::result::Result<T, ScriptError>;

impl ScriptError {
    /// The AI error, if this is one
    pub fn as_ai(&self) -> Option<&AiError> {
        match self {
            Self::Ai(e) => Some(e),
            _ => None,
        }
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| ScriptError::Input(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| ScriptError::Input(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
