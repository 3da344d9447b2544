//! Analyze Command
//!
//! Generate a report for a script with the configured provider.
//!
//! Usage:
//!   scriptgenius analyze <file> [-r coverage] [-p hollywood] [--provider anthropic]
//!                        [--stream] [-f json] [-o report.md]

use std::io::Write;
use std::path::{Path, PathBuf};

use futures::StreamExt;

use crate::analysis::{AnalysisReport, AnalysisRequest};
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, read_script};
use crate::types::{Result, ScriptError};

/// How to deliver the report
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOutput {
    /// Print text as it arrives
    pub stream: bool,
    pub format: String,
    /// Also write the report to this file
    pub output: Option<PathBuf>,
}

pub async fn run(
    ctx: &CommandContext,
    file: &Path,
    request: AnalysisRequest,
    delivery: AnalyzeOutput,
) -> Result<()> {
    let format = OutputFormat::parse(&delivery.format)?;
    if delivery.stream && format.is_json() {
        return Err(ScriptError::Input(
            "--stream cannot be combined with --format json".to_string(),
        ));
    }

    let request = AnalysisRequest {
        script: read_script(file)?,
        ..request
    };
    let analyzer = ctx.analyzer()?;
    let out = Output::new();

    let provider = request
        .provider
        .unwrap_or_else(|| analyzer.service().default_provider());
    out.status(&format!(
        "{} report ({} persona) via {}",
        request.report_type,
        request.persona,
        provider.display_name()
    ));

    if delivery.stream {
        let content = stream_to_stdout(analyzer.stream(&request)?).await?;
        return write_output(delivery.output.as_deref(), &content, &out);
    }

    let report = analyzer.analyze(&request).await?;
    let rendered = if format.is_json() {
        serde_json::to_string_pretty(&report)?
    } else {
        report.content.clone()
    };

    println!("{}", rendered);
    summarize(&report, &out);
    write_output(delivery.output.as_deref(), &rendered, &out)
}

/// Print deltas as they arrive; returns the accumulated text
async fn stream_to_stdout(mut stream: crate::ai::provider::TextStream) -> Result<String> {
    let mut content = String::new();
    let mut stdout = std::io::stdout();

    while let Some(delta) = stream.next().await {
        let delta = delta?;
        stdout.write_all(delta.as_bytes())?;
        stdout.flush()?;
        content.push_str(&delta);
    }
    println!();
    Ok(content)
}

fn summarize(report: &AnalysisReport, out: &Output) {
    let usage = report
        .usage
        .map(|u| format!(", {} tokens", u.total_tokens))
        .unwrap_or_default();
    out.status(&format!(
        "{} using {} in {} part(s){}",
        report.model,
        report.strategy,
        report.parts.len(),
        usage
    ));
}

fn write_output(path: Option<&Path>, content: &str, out: &Output) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    out.status(&format!("Saved to {}", path.display()));
    Ok(())
}
