//! Prompt Assembly
//!
//! Builds the ordered message sequence sent to a provider from a report
//! template, a persona and script metadata. Everything here is pure: the
//! template table is static and nothing is mutated after start-up.
//!
//! ## Message Order
//!
//! 1. System: base instruction, persona paragraph, template system prompt,
//!    output format
//! 2. User: template instruction
//! 3. User: `Title: ...`
//! 4. User: `Genre: ...`
//! 5. User: full script content

mod templates;

use serde::{Deserialize, Serialize};

use crate::ai::provider::AiMessage;
use crate::constants::prompt as prompt_constants;
use crate::types::{Result, ScriptError};

use templates::{BASE_INSTRUCTION, PERSONAS, TEMPLATES, TemplateDef};

// =============================================================================
// Prompt Builder
// =============================================================================

/// Joins prompt sections with blank lines, skipping empty ones
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain text section
    pub fn text(mut self, content: &str) -> Self {
        if !content.trim().is_empty() {
            self.sections.push(content.trim().to_string());
        }
        self
    }

    /// Add a text section when present
    pub fn optional_text(self, content: Option<&str>) -> Self {
        match content {
            Some(content) => self.text(content),
            None => self,
        }
    }

    /// Add a section with a header line
    pub fn section(mut self, header: &str, content: &str) -> Self {
        if !content.trim().is_empty() {
            self.sections
                .push(format!("{}\n{}", header, content.trim()));
        }
        self
    }

    pub fn build(self) -> String {
        self.sections.join("\n\n")
    }
}

// =============================================================================
// Types
// =============================================================================

/// A report template, with the system prompt resolved for one persona
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub output_format: String,
}

/// Listing entry for a built-in report type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportTypeInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Script metadata used in prompt assembly
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptContext {
    pub title: Option<String>,
    pub genre: Option<String>,
}

impl ScriptContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }
}

// =============================================================================
// Prompt Manager
// =============================================================================

/// Stateless prompt assembly over the built-in templates
pub struct PromptManager;

impl PromptManager {
    /// Built-in report types in display order
    pub fn report_types() -> Vec<ReportTypeInfo> {
        TEMPLATES
            .iter()
            .map(|t| ReportTypeInfo {
                id: t.id,
                name: t.name,
                description: t.description,
            })
            .collect()
    }

    /// Known persona keys
    pub fn personas() -> Vec<&'static str> {
        PERSONAS.iter().map(|(key, _)| *key).collect()
    }

    /// Persona paragraph by exact key
    pub fn persona_instruction(persona: &str) -> Option<&'static str> {
        PERSONAS
            .iter()
            .find(|(key, _)| *key == persona)
            .map(|(_, text)| *text)
    }

    pub fn has_report_type(report_type: &str) -> bool {
        Self::definition(report_type).is_some()
    }

    /// Look up a template and resolve its system prompt for `persona`
    ///
    /// Unknown personas contribute no paragraph.
    pub fn get_report_template(report_type: &str, persona: &str) -> Result<ReportTemplate> {
        let def = Self::definition(report_type)
            .ok_or_else(|| ScriptError::UnknownReportType(report_type.to_string()))?;

        let system_prompt = PromptBuilder::new()
            .text(BASE_INSTRUCTION)
            .optional_text(Self::persona_instruction(persona))
            .text(def.system_prompt)
            .section(
                "Format your response with the following sections:",
                def.output_format,
            )
            .build();

        Ok(ReportTemplate {
            id: def.id.to_string(),
            name: def.name.to_string(),
            description: def.description.to_string(),
            system_prompt,
            user_prompt: def.user_prompt.to_string(),
            output_format: def.output_format.to_string(),
        })
    }

    /// The five-message conversation for one analysis request
    pub fn prepare_messages(
        script: &str,
        report_type: &str,
        persona: &str,
        context: &ScriptContext,
    ) -> Result<Vec<AiMessage>> {
        let template = Self::get_report_template(report_type, persona)?;

        let title = context
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(prompt_constants::UNTITLED);
        let genre = context
            .genre
            .as_deref()
            .filter(|g| !g.trim().is_empty())
            .unwrap_or(prompt_constants::GENRE_NOT_SPECIFIED);

        Ok(vec![
            AiMessage::system(template.system_prompt),
            AiMessage::user(template.user_prompt),
            AiMessage::user(format!("Title: {}", title)),
            AiMessage::user(format!("Genre: {}", genre)),
            AiMessage::user(script),
        ])
    }

    fn definition(report_type: &str) -> Option<&'static TemplateDef> {
        TEMPLATES.iter().find(|t| t.id == report_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::Role;

    #[test]
    fn test_prepare_messages_order() {
        let context = ScriptContext::new().with_title("X").with_genre("Drama");
        let messages =
            PromptManager::prepare_messages("script text", "coverage", "general", &context)
                .unwrap();

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[1..].iter().all(|m| m.role == Role::User));
        assert!(messages[2].content.contains("X"));
        assert!(messages[3].content.contains("Drama"));
        assert!(messages[4].content.contains("script text"));
    }

    #[test]
    fn test_prepare_messages_defaults() {
        let messages = PromptManager::prepare_messages(
            "FADE IN:",
            "dialogue-analysis",
            "general",
            &ScriptContext::default(),
        )
        .unwrap();
        assert_eq!(messages[2].content, "Title: Untitled");
        assert_eq!(messages[3].content, "Genre: Not specified");
    }

    #[test]
    fn test_unknown_report_type() {
        let err = PromptManager::get_report_template("nonexistent-type", "general").unwrap_err();
        assert!(matches!(err, ScriptError::UnknownReportType(ref t) if t == "nonexistent-type"));

        assert!(
            PromptManager::prepare_messages("x", "nonexistent-type", "general", &ScriptContext::new())
                .is_err()
        );
    }

    #[test]
    fn test_system_prompt_composition() {
        let template = PromptManager::get_report_template("coverage", "hollywood").unwrap();
        let persona = PromptManager::persona_instruction("hollywood").unwrap();

        let base_at = template.system_prompt.find(BASE_INSTRUCTION).unwrap();
        let persona_at = template.system_prompt.find(persona).unwrap();
        let format_at = template
            .system_prompt
            .find("Format your response")
            .unwrap();
        assert!(base_at < persona_at);
        assert!(persona_at < format_at);
        assert!(template.system_prompt.ends_with(&template.output_format));
    }

    #[test]
    fn test_unknown_persona_adds_nothing() {
        let plain = PromptManager::get_report_template("coverage", "no-such-persona").unwrap();
        for key in PromptManager::personas() {
            let persona = PromptManager::persona_instruction(key).unwrap();
            assert!(!plain.system_prompt.contains(persona));
        }
        assert!(plain.system_prompt.starts_with(BASE_INSTRUCTION));
    }

    #[test]
    fn test_persona_lookup_is_exact() {
        assert!(PromptManager::persona_instruction("Hollywood").is_none());
        assert!(PromptManager::persona_instruction("hollywood").is_some());
    }

    #[test]
    fn test_listings() {
        let ids: Vec<_> = PromptManager::report_types().iter().map(|t| t.id).collect();
        assert_eq!(
            ids,
            vec![
                "coverage",
                "development-notes",
                "character-analysis",
                "structure-analysis",
                "dialogue-analysis",
                "market-analysis"
            ]
        );
        assert_eq!(PromptManager::personas().len(), 5);
        for id in ids {
            assert!(PromptManager::get_report_template(id, "general").is_ok());
        }
    }

    #[test]
    fn test_builder_skips_empty_sections() {
        let prompt = PromptBuilder::new()
            .text("one")
            .optional_text(None)
            .text("   ")
            .section("Header:", "two")
            .build();
        assert_eq!(prompt, "one\n\nHeader:\ntwo");
    }
}
