//! AI Service
//!
//! Single entry point for "generate text from a language model". Holds the
//! registry of configured providers and the default-provider selection.
//!
//! Constructed once and shared between request handlers as
//! `Arc<AiService>`. The registry is immutable after construction; only the
//! default selection changes, and only for calls that resolve after the change.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use super::provider::{
    AiResponse, GenerateOptions, ProviderKind, SharedProvider, TextStream, create_provider,
};
use crate::config::AiConfig;
use crate::types::{AiError, AiResult};

// =============================================================================
// Credentials
// =============================================================================

/// API keys per provider; presence decides which providers get registered
#[derive(Default)]
pub struct Credentials {
    keys: HashMap<ProviderKind, SecretString>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut present: Vec<_> = self.keys.keys().map(|k| k.as_str()).collect();
        present.sort_unstable();
        f.debug_struct("Credentials")
            .field("providers", &present)
            .finish()
    }
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `OPENAI_API_KEY`, `ANTHROPIC_API_KEY` and `GOOGLE_AI_KEY`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve each provider's key through `lookup(env_var_name)`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        ProviderKind::ALL
            .into_iter()
            .fold(Self::new(), |creds, kind| match lookup(kind.api_key_env()) {
                Some(key) => creds.with_key(kind, key),
                None => creds,
            })
    }

    /// Set a key; blank keys are ignored
    pub fn with_key(mut self, kind: ProviderKind, key: impl Into<String>) -> Self {
        let key = key.into();
        if !key.trim().is_empty() {
            self.keys.insert(kind, SecretString::from(key));
        }
        self
    }

    /// Apply keys set in configuration; they take precedence
    pub fn with_config(self, config: &AiConfig) -> Self {
        ProviderKind::ALL.into_iter().fold(self, |creds, kind| {
            match config.provider(kind).api_key.as_deref() {
                Some(key) => creds.with_key(kind, key),
                None => creds,
            }
        })
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&SecretString> {
        self.keys.get(&kind)
    }

    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.keys.contains_key(&kind)
    }
}

// =============================================================================
// Service
// =============================================================================

/// Multi-provider text generation service
pub struct AiService {
    providers: HashMap<ProviderKind, SharedProvider>,
    default_provider: RwLock<ProviderKind>,
    default_timeout: Duration,
}

/// Shared service handle passed to request handlers
pub type SharedService = Arc<AiService>;

impl std::fmt::Debug for AiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiService")
            .field("providers", &self.available_providers())
            .field("default_provider", &self.default_provider())
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl AiService {
    /// Register a provider for every credential present
    ///
    /// Providers without a credential are left out silently; a later call
    /// naming them fails with `PROVIDER_NOT_AVAILABLE`.
    pub fn new(credentials: &Credentials, config: &AiConfig) -> Self {
        let mut providers: HashMap<ProviderKind, SharedProvider> = HashMap::new();

        for kind in ProviderKind::ALL {
            let Some(key) = credentials.get(kind) else {
                debug!("No credentials for {}, skipping", kind.display_name());
                continue;
            };

            match create_provider(
                kind,
                Some(key.expose_secret().to_string()),
                config.provider(kind),
            ) {
                Ok(provider) => {
                    providers.insert(kind, provider);
                }
                Err(e) => warn!("Failed to register {}: {}", kind.display_name(), e),
            }
        }

        info!(
            "AI service ready: {} provider(s) registered, default {}",
            providers.len(),
            config.default_provider
        );

        Self {
            providers,
            default_provider: RwLock::new(config.default_provider),
            default_timeout: config.timeout(),
        }
    }

    /// Build from `config` with keys from the environment (config keys win)
    pub fn from_env(config: &AiConfig) -> Self {
        let credentials = Credentials::from_env().with_config(config);
        Self::new(&credentials, config)
    }

    /// Build from already-constructed providers
    pub fn with_providers(
        providers: impl IntoIterator<Item = SharedProvider>,
        default_provider: ProviderKind,
        default_timeout: Duration,
    ) -> Self {
        Self {
            providers: providers.into_iter().map(|p| (p.kind(), p)).collect(),
            default_provider: RwLock::new(default_provider),
            default_timeout,
        }
    }

    pub fn into_shared(self) -> SharedService {
        Arc::new(self)
    }

    /// Generate text with `provider`, or the current default
    pub async fn generate_text(
        &self,
        mut options: GenerateOptions,
        provider: Option<ProviderKind>,
    ) -> AiResult<AiResponse> {
        let adapter = self.resolve(provider)?;
        options.timeout.get_or_insert(self.default_timeout);

        adapter
            .generate_text(&options)
            .await
            .map_err(|e| Self::rewrap(e, adapter.kind()))
    }

    /// Stream text deltas with `provider`, or the current default
    ///
    /// The timeout bounds the initial request only; the returned stream
    /// yields until the vendor signals completion.
    pub async fn stream_text(
        &self,
        mut options: GenerateOptions,
        provider: Option<ProviderKind>,
    ) -> AiResult<TextStream> {
        let adapter = self.resolve(provider)?;
        options.timeout.get_or_insert(self.default_timeout);

        adapter
            .stream_text(&options)
            .await
            .map_err(|e| Self::rewrap(e, adapter.kind()))
    }

    /// Change the default for future calls
    pub fn set_default_provider(&self, provider: ProviderKind) -> AiResult<()> {
        if !self.has_provider(provider) {
            return Err(AiError::provider_not_available(provider));
        }
        *self
            .default_provider
            .write()
            .unwrap_or_else(PoisonError::into_inner) = provider;
        info!("Default provider set to {}", provider);
        Ok(())
    }

    pub fn default_provider(&self) -> ProviderKind {
        *self
            .default_provider
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registered providers in canonical order
    pub fn available_providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.providers.contains_key(kind))
            .collect()
    }

    pub fn has_provider(&self, provider: ProviderKind) -> bool {
        self.providers.contains_key(&provider)
    }

    /// Model the given (or default) provider uses when a request names none
    pub fn model_for(&self, provider: Option<ProviderKind>) -> Option<String> {
        let kind = provider.unwrap_or_else(|| self.default_provider());
        self.providers.get(&kind).map(|p| p.model().to_string())
    }

    fn resolve(&self, provider: Option<ProviderKind>) -> AiResult<&SharedProvider> {
        let kind = provider.unwrap_or_else(|| self.default_provider());
        self.providers
            .get(&kind)
            .ok_or_else(|| AiError::provider_not_available(kind))
    }

    fn rewrap(err: AiError, kind: ProviderKind) -> AiError {
        let err = err.normalized();
        if err.provider.is_some() {
            err
        } else {
            err.with_provider(kind)
        }
    }
}
