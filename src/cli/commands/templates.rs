//! Templates Command
//!
//! List the built-in report types and personas.

use crate::ai::prompt::PromptManager;
use crate::cli::ui::Output;
use crate::cli::util::{OutputFormat, print_json};
use crate::types::Result;

pub fn run(format: &str) -> Result<()> {
    let format = OutputFormat::parse(format)?;
    let report_types = PromptManager::report_types();
    let personas = PromptManager::personas();

    if format.is_json() {
        return print_json(&serde_json::json!({
            "report_types": report_types,
            "personas": personas,
        }));
    }

    let out = Output::new();
    out.section("Report types");
    for info in &report_types {
        println!("  {:<20} {}", info.id, info.name);
        println!("  {:<20} {}", "", info.description);
    }

    out.section("Personas");
    for persona in personas {
        let instruction = PromptManager::persona_instruction(persona).unwrap_or_default();
        println!("  {:<20} {}", persona, instruction);
    }
    Ok(())
}
