//! ScriptGenius - AI-Assisted Screenplay Analysis
//!
//! Turns a screenplay into industry-style reports (coverage, development
//! notes, character, structure, dialogue and market analysis) using any of
//! several language-model vendors behind one provider-neutral interface.
//!
//! ## Core Features
//!
//! - **Provider Abstraction**: OpenAI, Anthropic and Google behind `TextProvider`
//! - **Report Templates**: six report types, five reader personas
//! - **Chunking**: scene, sequence and paragraph aware splitting under a token budget
//! - **Streaming**: incremental output decoded from Server-Sent Events
//!
//! ## Quick Start
//!
//! ```ignore
//! use scriptgenius::{AiService, AnalysisRequest, Config, ScriptAnalyzer};
//!
//! let config = Config::default();
//! let service = AiService::from_env(&config.ai).into_shared();
//! let analyzer = ScriptAnalyzer::new(service, config.chunking.clone())?;
//! let report = analyzer
//!     .analyze(&AnalysisRequest::new(script).with_report_type("structure-analysis"))
//!     .await?;
//! println!("{}", report.content);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: providers, service registry, prompt templates
//! - [`script`]: screenplay parsing and chunking
//! - [`analysis`]: end-to-end report generation
//! - [`config`]: layered configuration

pub mod ai;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod constants;
pub mod script;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{AiConfig, AnalysisConfig, Config, ConfigLoader};

// Error Types
pub use types::error::{AiError, AiErrorCode, AiResult, Result, ResultExt, ScriptError};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    AiMessage, AiResponse, AiService, Credentials, GenerateOptions, ModelParams, PromptManager,
    ProviderKind, ScriptContext, SharedService, TextProvider, TextStream, Usage, with_timeout,
};

// =============================================================================
// Script Re-exports
// =============================================================================

pub use analysis::{AnalysisReport, AnalysisRequest, ScriptAnalyzer, prepare_conversations};
pub use script::{ChunkSet, ChunkStrategy, ChunkingOptions, ScriptChunker, ScriptOutline, chunk_text};
