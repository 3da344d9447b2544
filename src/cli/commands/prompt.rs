//! Prompt Command
//!
//! Print the conversations an analysis would send, without sending them.
//!
//! Usage:
//!   scriptgenius prompt <file> [-r coverage] [-p hollywood] [-f json]

use std::path::Path;

use serde::Serialize;

use crate::ai::provider::AiMessage;
use crate::analysis::{AnalysisRequest, prepare_conversations};
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, print_json, read_script};
use crate::script::ChunkStrategy;
use crate::types::Result;

#[derive(Serialize)]
struct PromptPreview {
    strategy: ChunkStrategy,
    conversations: Vec<Vec<AiMessage>>,
}

pub fn run(ctx: &CommandContext, file: &Path, request: AnalysisRequest, format: &str) -> Result<()> {
    let format = OutputFormat::parse(format)?;
    let request = AnalysisRequest {
        script: read_script(file)?,
        ..request
    };

    let (strategy, conversations) = prepare_conversations(&ctx.chunker()?, &request)?;

    if format.is_json() {
        return print_json(&PromptPreview {
            strategy,
            conversations,
        });
    }

    let out = Output::new();
    let total = conversations.len();
    for (i, messages) in conversations.iter().enumerate() {
        out.header(&format!(
            "Part {} of {} ({}, {} strategy)",
            i + 1,
            total,
            request.report_type,
            strategy
        ));
        for message in messages {
            out.section(message.role.as_str());
            println!("{}", message.content);
        }
    }
    Ok(())
}
