//! AI Integration Layer
//!
//! Provider-neutral text generation for script analysis: vendor adapters,
//! the provider registry, prompt assembly and request deadlines.

pub mod prompt;
pub mod provider;
pub mod service;
pub mod timeout;
pub mod tokenizer;

pub use prompt::{PromptBuilder, PromptManager, ReportTemplate, ReportTypeInfo, ScriptContext};
pub use provider::{
    AiMessage, AiModelConfig, AiResponse, GenerateOptions, ModelParams, ProviderKind,
    ProviderSettings, Role, SharedProvider, TextProvider, TextStream, Usage, create_provider,
};
pub use service::{AiService, Credentials, SharedService};
pub use timeout::{default_timeout, with_timeout};
pub use tokenizer::{TokenCounter, estimate_tokens};
