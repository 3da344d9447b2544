//! Chunk Command
//!
//! Preview how a script would be split before analysis.
//!
//! Usage:
//!   scriptgenius chunk <file> [--max-chunk-size N] [--overlap N] [-f json]

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, print_json, read_script};
use crate::script::{ChunkSet, ScriptChunker};
use crate::types::Result;

/// Characters of each chunk shown in text output
const PREVIEW_CHARS: usize = 60;

pub fn run(
    ctx: &CommandContext,
    file: &Path,
    max_chunk_size: Option<usize>,
    overlap: Option<usize>,
    format: &str,
) -> Result<()> {
    let format = OutputFormat::parse(format)?;
    let text = read_script(file)?;

    let mut options = ctx.config.chunking.clone();
    if let Some(max) = max_chunk_size {
        options.max_chunk_size = max;
    }
    if let Some(overlap) = overlap {
        options.overlap = overlap;
    }

    let chunks = ScriptChunker::new(options)?.chunk(&text);

    if format.is_json() {
        return print_json(&chunks);
    }

    render(&chunks);
    Ok(())
}

fn render(chunks: &ChunkSet) {
    let out = Output::new();

    out.header("Chunks");
    out.field("Strategy", &chunks.strategy.to_string());
    out.field("Chunks", &chunks.len().to_string());
    out.field("Tokens (est.)", &chunks.total_tokens().to_string());

    out.section("Parts");
    for chunk in &chunks.chunks {
        println!(
            "{:>4}. {:>6} tokens  {}",
            chunk.index + 1,
            chunk.estimated_tokens,
            preview(&chunk.content)
        );
    }
}

/// First non-blank line, truncated
fn preview(content: &str) -> String {
    let line = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    if line.chars().count() > PREVIEW_CHARS {
        format!("{}…", line.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        line.to_string()
    }
}
