//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/scriptgenius/) and project (./scriptgenius.toml)
//! level configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ai::provider::{ProviderKind, ProviderSettings};
use crate::constants::network as net_constants;
use crate::script::ChunkingOptions;
use crate::types::{Result, ScriptError};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Text-generation provider settings
    pub ai: AiConfig,

    /// Script chunking settings
    pub chunking: ChunkingOptions,

    /// Defaults for analysis requests
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ScriptError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        for kind in ProviderKind::ALL {
            let settings = self.ai.provider(kind);

            if !(0.0..=2.0).contains(&settings.temperature) {
                return Err(ScriptError::Config(format!(
                    "ai.{}.temperature must be between 0.0 and 2.0, got {}",
                    kind, settings.temperature
                )));
            }

            if settings.max_tokens == 0 {
                return Err(ScriptError::Config(format!(
                    "ai.{}.max_tokens must be greater than 0",
                    kind
                )));
            }

            if let Some(base) = &settings.api_base {
                let url = url::Url::parse(base).map_err(|e| {
                    ScriptError::Config(format!("ai.{}.api_base is not a valid URL: {}", kind, e))
                })?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(ScriptError::Config(format!(
                        "ai.{}.api_base must use http or https, got {}",
                        kind,
                        url.scheme()
                    )));
                }
            }
        }

        if self.ai.timeout_ms == 0 {
            return Err(ScriptError::Config(
                "ai.timeout_ms must be greater than 0".to_string(),
            ));
        }

        self.chunking
            .validate()
            .map_err(|e| ScriptError::Config(format!("chunking: {}", e)))?;

        Ok(())
    }
}

// =============================================================================
// AI Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Provider used when a request names none
    pub default_provider: ProviderKind,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    pub openai: ProviderSettings,
    pub anthropic: ProviderSettings,
    pub google: ProviderSettings,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            default_provider: ProviderKind::OpenAi,
            timeout_ms: net_constants::DEFAULT_TIMEOUT_MS,
            openai: ProviderSettings::default(),
            anthropic: ProviderSettings::default(),
            google: ProviderSettings::default(),
        }
    }
}

impl AiConfig {
    pub fn provider(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::Google => &self.google,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// =============================================================================
// Analysis Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Report type used when none is given
    pub report_type: String,

    /// Persona used when none is given
    pub persona: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            report_type: "coverage".to_string(),
            persona: "general".to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
