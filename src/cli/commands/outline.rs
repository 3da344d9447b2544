//! Outline Command
//!
//! Show the structure of a script without calling any model.
//!
//! Usage:
//!   scriptgenius outline <file> [-f json]

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{OutputFormat, print_json, read_script};
use crate::script::{self, ScriptOutline};
use crate::types::Result;

pub fn run(file: &Path, format: &str) -> Result<()> {
    let format = OutputFormat::parse(format)?;
    let text = read_script(file)?;
    let outline = script::parse(&text);

    if format.is_json() {
        return print_json(&outline);
    }

    render(&outline);
    Ok(())
}

fn render(outline: &ScriptOutline) {
    let out = Output::new();

    out.header(outline.title.as_deref().unwrap_or("Untitled"));
    out.field("Scenes", &outline.scenes.len().to_string());
    out.field("Characters", &outline.characters.len().to_string());
    out.field("Tokens (est.)", &outline.estimated_tokens.to_string());

    if !outline.scenes.is_empty() {
        out.section("Scenes");
        for (i, scene) in outline.scenes.iter().enumerate() {
            let time = scene
                .time_of_day
                .as_deref()
                .map(|t| format!(" ({})", t))
                .unwrap_or_default();
            println!(
                "{:>4}. {:<7} {}{}  [line {}]",
                i + 1,
                scene.setting.to_string(),
                scene.location,
                time,
                scene.line
            );
        }
    }

    if !outline.characters.is_empty() {
        out.section("Characters");
        println!("{}", outline.characters.join(", "));
    }
}
