//! Script Analysis
//!
//! Runs one report over a whole script: chunk, prompt, generate, aggregate.
//! Scripts over the token budget are analyzed part by part, each part
//! prefixed with `[Part i of n]`, and the part responses are concatenated.
//! Parts run sequentially; the first failure aborts the analysis.
//!
//! When a script needs more than one part it is re-split with room reserved
//! for the part label, so a labelled part stays within `max_chunk_size`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::ai::prompt::{PromptManager, ScriptContext};
use crate::ai::provider::{
    AiMessage, AiResponse, GenerateOptions, ModelParams, ProviderKind, TextStream, Usage,
};
use crate::ai::service::SharedService;
use crate::ai::tokenizer::estimate_tokens;
use crate::script::{ChunkSet, ChunkStrategy, ChunkingOptions, ScriptChunker};
use crate::types::{Result, ScriptError};

/// Separator between part responses
const PART_SEPARATOR: &str = "\n\n";

// =============================================================================
// Request / Report
// =============================================================================

/// One analysis to run
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub script: String,
    pub report_type: String,
    pub persona: String,
    pub context: ScriptContext,
    /// Provider to use; the service default when absent
    pub provider: Option<ProviderKind>,
    pub params: ModelParams,
    pub timeout: Option<Duration>,
}

impl AnalysisRequest {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            report_type: "coverage".to_string(),
            persona: "general".to_string(),
            context: ScriptContext::default(),
            provider: None,
            params: ModelParams::default(),
            timeout: None,
        }
    }

    pub fn with_report_type(mut self, report_type: impl Into<String>) -> Self {
        self.report_type = report_type.into();
        self
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn with_context(mut self, context: ScriptContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_provider(mut self, provider: Option<ProviderKind>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn options(&self, messages: Vec<AiMessage>) -> GenerateOptions {
        GenerateOptions {
            messages,
            params: self.params.clone(),
            timeout: self.timeout,
        }
    }
}

/// Aggregated result of one analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub report_type: String,
    pub persona: String,
    pub provider: ProviderKind,
    pub model: String,
    pub strategy: ChunkStrategy,
    pub content: String,
    pub parts: Vec<AiResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub generated_at: DateTime<Utc>,
}

fn part_label(index: usize, total: usize) -> String {
    format!("[Part {} of {}]\n\n", index, total)
}

/// Chunk the script, reserving label tokens when it spans several parts
fn split_for_parts(chunker: &ScriptChunker, script: &str) -> Result<ChunkSet> {
    let chunks = chunker.chunk(script);
    if chunks.len() <= 1 {
        return Ok(chunks);
    }

    // Sized for ten times the first count so a finer split still fits
    let widest = chunks.len() * 10;
    let reserve = estimate_tokens(&part_label(widest, widest));
    let options = chunker.options();
    let max = options.max_chunk_size.saturating_sub(reserve);
    if max == 0 {
        return Ok(chunks);
    }

    let reserved = ChunkingOptions {
        max_chunk_size: max,
        overlap: options.overlap.min(max - 1),
        ..options.clone()
    };
    Ok(ScriptChunker::new(reserved)?.chunk(script))
}

/// Chunk the script and build one conversation per chunk
///
/// Fails before any network call on a blank script or unknown report type.
pub fn prepare_conversations(
    chunker: &ScriptChunker,
    request: &AnalysisRequest,
) -> Result<(ChunkStrategy, Vec<Vec<AiMessage>>)> {
    if request.script.trim().is_empty() {
        return Err(ScriptError::Input("Script is empty".to_string()));
    }

    let chunks = split_for_parts(chunker, &request.script)?;
    let total = chunks.len();
    debug!(
        "Prepared {} part(s) using {} strategy",
        total, chunks.strategy
    );

    let conversations = chunks
        .chunks
        .iter()
        .map(|chunk| {
            let content = if total > 1 {
                format!("{}{}", part_label(chunk.index + 1, total), chunk.content)
            } else {
                chunk.content.clone()
            };
            PromptManager::prepare_messages(
                &content,
                &request.report_type,
                &request.persona,
                &request.context,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((chunks.strategy, conversations))
}

// =============================================================================
// Analyzer
// =============================================================================

pub struct ScriptAnalyzer {
    service: SharedService,
    chunker: ScriptChunker,
}

impl ScriptAnalyzer {
    pub fn new(service: SharedService, chunking: ChunkingOptions) -> Result<Self> {
        Ok(Self {
            service,
            chunker: ScriptChunker::new(chunking)?,
        })
    }

    pub fn service(&self) -> &SharedService {
        &self.service
    }

    /// Chunk the script and build one conversation per chunk
    pub fn prepare(&self, request: &AnalysisRequest) -> Result<(ChunkStrategy, Vec<Vec<AiMessage>>)> {
        prepare_conversations(&self.chunker, request)
    }

    /// Run the report and aggregate the part responses
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let (strategy, conversations) = self.prepare(request)?;
        let provider = request
            .provider
            .unwrap_or_else(|| self.service.default_provider());
        let total = conversations.len();

        info!(
            "Running {} analysis ({} persona) with {} in {} part(s)",
            request.report_type, request.persona, provider, total
        );

        let mut parts = Vec::with_capacity(total);
        for (index, messages) in conversations.into_iter().enumerate() {
            debug!("Generating part {}/{}", index + 1, total);
            let response = self
                .service
                .generate_text(request.options(messages), Some(provider))
                .await?;
            parts.push(response);
        }

        let content = parts
            .iter()
            .map(|p| p.content.trim())
            .collect::<Vec<_>>()
            .join(PART_SEPARATOR);

        let usage = parts
            .iter()
            .filter_map(|p| p.usage.as_ref())
            .fold(None, |acc: Option<Usage>, usage| {
                let mut total = acc.unwrap_or_default();
                total.add(usage);
                Some(total)
            });

        let model = parts
            .first()
            .map(|p| p.model.clone())
            .unwrap_or_default();

        info!(
            "Analysis complete: {} chars{}",
            content.len(),
            usage
                .map(|u| format!(", {} tokens", u.total_tokens))
                .unwrap_or_default()
        );

        Ok(AnalysisReport {
            id: Uuid::new_v4(),
            report_type: request.report_type.clone(),
            persona: request.persona.clone(),
            provider,
            model,
            strategy,
            content,
            parts,
            usage,
            generated_at: Utc::now(),
        })
    }

    /// Stream the report; parts are streamed in order, separated by a blank line
    ///
    /// The stream ends after the first error; later parts are never requested.
    pub fn stream(&self, request: &AnalysisRequest) -> Result<TextStream> {
        let (_, conversations) = self.prepare(request)?;
        let provider = request
            .provider
            .unwrap_or_else(|| self.service.default_provider());

        let state = PartStream {
            service: Arc::clone(&self.service),
            request: request.clone(),
            provider,
            parts: conversations.into_iter().enumerate(),
            current: None,
            failed: false,
        };

        let deltas = stream::unfold(state, |mut state| async move {
            loop {
                if state.failed {
                    return None;
                }

                if let Some(current) = state.current.as_mut() {
                    match current.next().await {
                        Some(Ok(delta)) => return Some((Ok(delta), state)),
                        Some(Err(e)) => {
                            state.failed = true;
                            return Some((Err(e), state));
                        }
                        None => state.current = None,
                    }
                }

                let (index, messages) = state.parts.next()?;
                debug!("Streaming part {}", index + 1);
                let options = state.request.options(messages);
                match state.service.stream_text(options, Some(state.provider)).await {
                    Ok(deltas) => {
                        state.current = Some(deltas);
                        if index > 0 {
                            return Some((Ok(PART_SEPARATOR.to_string()), state));
                        }
                    }
                    Err(e) => {
                        state.failed = true;
                        return Some((Err(e), state));
                    }
                }
            }
        });

        Ok(Box::pin(deltas))
    }
}

/// Cursor over the parts of a streamed analysis
struct PartStream {
    service: SharedService,
    request: AnalysisRequest,
    provider: ProviderKind,
    parts: std::iter::Enumerate<std::vec::IntoIter<Vec<AiMessage>>>,
    current: Option<TextStream>,
    failed: bool,
}
