//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::io::Read;
use std::path::Path;

use crate::ai::service::{AiService, SharedService};
use crate::analysis::ScriptAnalyzer;
use crate::config::{Config, ConfigLoader};
use crate::script::ScriptChunker;
use crate::types::{Result, ResultExt, ScriptError};

/// Path argument that reads the script from standard input
pub const STDIN_PATH: &str = "-";

/// Command execution context
///
/// Holds the resolved configuration. Commands that talk to a vendor build
/// the service from it on demand, so offline commands never touch
/// credentials.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
}

impl CommandContext {
    /// Load configuration from `path`, or the layered default locations
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(Self { config })
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Provider registry built from configured and environment credentials
    pub fn service(&self) -> SharedService {
        AiService::from_env(&self.config.ai).into_shared()
    }

    pub fn chunker(&self) -> Result<ScriptChunker> {
        ScriptChunker::new(self.config.chunking.clone())
    }

    pub fn analyzer(&self) -> Result<ScriptAnalyzer> {
        ScriptAnalyzer::new(self.service(), self.config.chunking.clone())
    }
}

/// Read a script from a file, or from stdin when the path is `-`
pub fn read_script(path: &Path) -> Result<String> {
    let text = if path.as_os_str() == STDIN_PATH {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .with_context("Failed to read script from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context_fn(|| format!("Failed to read script {}", path.display()))?
    };

    if text.trim().is_empty() {
        return Err(ScriptError::Input(format!(
            "Script is empty: {}",
            path.display()
        )));
    }
    Ok(text)
}

/// Output format shared by all commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(format: &str) -> Result<Self> {
        match format.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ScriptError::Input(format!(
                "Invalid format '{}'. Valid values: text, json",
                other
            ))),
        }
    }

    pub fn is_json(self) -> bool {
        self == Self::Json
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
