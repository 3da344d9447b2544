//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/scriptgenius/config.toml)
//! 3. Project config (./scriptgenius.toml)
//! 4. Environment variables (SCRIPTGENIUS_* prefix, `__` separates nesting)

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::constants::env as env_constants;
use crate::types::{Result, ScriptError};

const PROJECT_CONFIG_FILE: &str = "scriptgenius.toml";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Merge global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        // Merge project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        Self::extract(figment.merge(Self::env_provider()))
    }

    /// Load configuration from a specific file (plus env overrides)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(ScriptError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        debug!("Loading config from: {}", path.display());

        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(path))
                .merge(Self::env_provider()),
        )
    }

    /// e.g. SCRIPTGENIUS_AI__TIMEOUT_MS -> ai.timeout_ms
    fn env_provider() -> Env {
        Env::prefixed(env_constants::CONFIG_PREFIX)
            .split("__")
            .lowercase(true)
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .extract()
            .map_err(|e| ScriptError::Config(format!("Configuration error: {}", e)))?;

        // Validate configuration after loading
        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/scriptgenius/)
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "scriptgenius").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(PROJECT_CONFIG_FILE)
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Render the effective configuration as TOML or JSON
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| ScriptError::Config(e.to_string()))
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write a commented default config to `path`
    ///
    /// Existing files are kept unless `force` is set. Returns whether the
    /// file was written.
    pub fn init_at(path: &Path, force: bool) -> Result<bool> {
        if path.exists() && !force {
            info!("Config exists: {}", path.display());
            return Ok(false);
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, Self::default_config())?;
        info!("Created config: {}", path.display());
        Ok(true)
    }

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let path = Self::global_config_path().ok_or_else(|| {
            ScriptError::Config("Cannot determine global config directory".to_string())
        })?;
        Self::init_at(&path, force)?;
        Ok(path)
    }

    /// Initialize project configuration in the current directory
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let path = Self::project_config_path();
        Self::init_at(&path, force)?;
        Ok(path)
    }

    /// Default config file content (TOML)
    fn default_config() -> String {
        r#"# ScriptGenius Configuration
# Global: ~/.config/scriptgenius/config.toml
# Project: ./scriptgenius.toml (overrides global)
# Env: SCRIPTGENIUS_AI__DEFAULT_PROVIDER=anthropic (overrides both)
#
# API keys are read from OPENAI_API_KEY, ANTHROPIC_API_KEY and GOOGLE_AI_KEY.

[ai]
default_provider = "openai"
timeout_ms = 30000

[ai.openai]
# model = "gpt-4o"
temperature = 0.7
max_tokens = 4096

[ai.anthropic]
# model = "claude-2.1"
temperature = 0.7
max_tokens = 4096

[ai.google]
# model = "gemini-1.5-pro"
temperature = 0.7
max_tokens = 4096

[chunking]
max_chunk_size = 4000
overlap = 200
separator = "\n\n"

[analysis]
report_type = "coverage"
persona = "general"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::ProviderKind;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_file_parses() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        assert!(ConfigLoader::init_at(&path, false).unwrap());
        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.ai.default_provider, ProviderKind::OpenAi);
        assert_eq!(config.chunking.separator, "\n\n");
        assert_eq!(config.analysis.persona, "general");
    }

    #[test]
    fn test_init_keeps_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        assert!(ConfigLoader::init_at(&path, false).unwrap());
        fs::write(&path, "[ai]\ntimeout_ms = 5\n").unwrap();

        assert!(!ConfigLoader::init_at(&path, false).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "[ai]\ntimeout_ms = 5\n");

        assert!(ConfigLoader::init_at(&path, true).unwrap());
        assert!(fs::read_to_string(&path).unwrap().contains("timeout_ms = 30000"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "[ai]\ndefault_provider = \"google\"\n\n[ai.google]\nmodel = \"gemini-test\"\n\n[chunking]\nmax_chunk_size = 1000\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.ai.default_provider, ProviderKind::Google);
        assert_eq!(config.ai.google.model.as_deref(), Some("gemini-test"));
        assert_eq!(config.chunking.max_chunk_size, 1000);
        assert_eq!(config.chunking.overlap, 200);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[chunking]\nmax_chunk_size = 100\noverlap = 100\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ScriptError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_env_override() {
        figment::Jail::expect_with(|jail| {
            let path = jail.directory().join("config.toml");
            jail.create_file("config.toml", "[ai]\ntimeout_ms = 1000\n")?;
            jail.set_env("SCRIPTGENIUS_AI__TIMEOUT_MS", "2500");
            jail.set_env("SCRIPTGENIUS_AI__ANTHROPIC__MODEL", "claude-test");

            let config = ConfigLoader::load_from_file(&path).map_err(|e| e.to_string())?;
            assert_eq!(config.ai.timeout_ms, 2500);
            assert_eq!(config.ai.anthropic.model.as_deref(), Some("claude-test"));
            Ok(())
        });
    }

    #[test]
    fn test_render_formats() {
        let config = Config::default();
        let toml = ConfigLoader::render(&config, false).unwrap();
        assert!(toml.contains("[chunking]"));
        let json = ConfigLoader::render(&config, true).unwrap();
        assert!(json.contains("\"max_chunk_size\": 4000"));
    }
}
