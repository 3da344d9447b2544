//! Screenplay Parser
//!
//! Line-oriented recognition of screenplay elements: scene headings, the
//! title-page title and speaking characters. Scene-heading recognition is
//! shared with the scene chunking strategy.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ai::tokenizer::estimate_tokens;

// =============================================================================
// Patterns
// =============================================================================

static SCENE_HEADING: OnceLock<Option<Regex>> = OnceLock::new();
static SEQUENCE_MARKER: OnceLock<Option<Regex>> = OnceLock::new();
static TITLE_LINE: OnceLock<Option<Regex>> = OnceLock::new();

/// `INT.`, `EXT.`, `INT/EXT.`, `I/E.` (or `-` in place of the dot) at line start
pub(crate) fn scene_heading_regex() -> Option<&'static Regex> {
    SCENE_HEADING
        .get_or_init(|| Regex::new(r"(?m)^[ \t]*(INT\./EXT|INT/EXT|EXT/INT|I/E|INT|EXT)[.\-]").ok())
        .as_ref()
}

/// Lines starting with one or more `#`
pub(crate) fn sequence_marker_regex() -> Option<&'static Regex> {
    SEQUENCE_MARKER
        .get_or_init(|| Regex::new(r"(?m)^[ \t]*#+").ok())
        .as_ref()
}

fn title_line_regex() -> Option<&'static Regex> {
    TITLE_LINE
        .get_or_init(|| Regex::new(r"(?i)^\s*title\s*:\s*(.+?)\s*$").ok())
        .as_ref()
}

/// Byte offsets of every line start matched by `pattern`
fn line_starts(text: &str, pattern: Option<&Regex>) -> Vec<usize> {
    pattern
        .map(|re| re.find_iter(text).map(|m| m.start()).collect())
        .unwrap_or_default()
}

/// Byte offsets of scene-heading lines
pub fn scene_boundaries(text: &str) -> Vec<usize> {
    line_starts(text, scene_heading_regex())
}

/// Byte offsets of sequence-marker lines
pub fn sequence_boundaries(text: &str) -> Vec<usize> {
    line_starts(text, sequence_marker_regex())
}

// =============================================================================
// Types
// =============================================================================

/// Where a scene takes place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Setting {
    Interior,
    Exterior,
    Both,
}

impl std::fmt::Display for Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Setting::Interior => write!(f, "INT"),
            Setting::Exterior => write!(f, "EXT"),
            Setting::Both => write!(f, "INT/EXT"),
        }
    }
}

/// One parsed scene heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Heading line as written
    pub heading: String,
    pub setting: Setting,
    pub location: String,
    pub time_of_day: Option<String>,
    /// 1-based line number of the heading
    pub line: usize,
}

impl Scene {
    /// Parse a single heading line; `None` if it is not a scene heading
    pub fn parse_heading(line: &str, line_number: usize) -> Option<Self> {
        let heading = line.trim();
        let prefix = scene_heading_regex()?.captures(heading)?.get(1)?;

        let setting = match prefix.as_str() {
            "INT" => Setting::Interior,
            "EXT" => Setting::Exterior,
            _ => Setting::Both,
        };

        // Skip the prefix and its `.` or `-` terminator
        let rest = heading[prefix.end()..]
            .trim_start_matches(['.', '-'])
            .trim();

        let (location, time_of_day) = match rest.rsplit_once(" - ") {
            Some((location, time)) if !time.trim().is_empty() => {
                (location.trim(), Some(time.trim().to_string()))
            }
            _ => (rest.trim_end_matches(['-', ' ']), None),
        };

        Some(Self {
            heading: heading.to_string(),
            setting,
            location: location.to_string(),
            time_of_day,
            line: line_number,
        })
    }
}

/// Structural summary of a script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptOutline {
    pub title: Option<String>,
    pub scenes: Vec<Scene>,
    /// Speaking characters in order of first appearance
    pub characters: Vec<String>,
    pub estimated_tokens: usize,
}

// =============================================================================
// Parsing
// =============================================================================

/// Normalize line endings, drop form feeds and trailing whitespace
pub fn normalize(text: &str) -> String {
    let unified = text
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{000C}', "");

    unified
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract the outline of a script
pub fn parse(text: &str) -> ScriptOutline {
    let text = normalize(text);
    let lines: Vec<&str> = text.lines().collect();

    let mut scenes = Vec::new();
    let mut characters: Vec<String> = Vec::new();
    let mut title = None;

    for (idx, line) in lines.iter().enumerate() {
        if let Some(scene) = Scene::parse_heading(line, idx + 1) {
            scenes.push(scene);
            continue;
        }

        // Title page precedes the first scene
        if title.is_none()
            && scenes.is_empty()
            && let Some(caps) = title_line_regex().and_then(|re| re.captures(line))
        {
            title = caps.get(1).map(|m| m.as_str().to_string());
            continue;
        }

        let prev_blank = idx == 0 || lines[idx - 1].trim().is_empty();
        let next_has_text = lines.get(idx + 1).is_some_and(|l| !l.trim().is_empty());
        if prev_blank
            && next_has_text
            && let Some(name) = character_cue(line)
            && !characters.contains(&name)
        {
            characters.push(name);
        }
    }

    debug!(
        "Parsed outline: {} scenes, {} characters",
        scenes.len(),
        characters.len()
    );

    ScriptOutline {
        title,
        scenes,
        characters,
        estimated_tokens: estimate_tokens(&text),
    }
}

const TRANSITIONS: &[&str] = &["FADE IN", "FADE OUT", "FADE TO BLACK", "THE END", "CONTINUED"];

/// Character name from a dialogue cue line, extensions stripped
fn character_cue(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 40 {
        return None;
    }
    if trimmed.starts_with('#') || trimmed.starts_with('(') || trimmed.ends_with(':') {
        return None;
    }
    if !trimmed.chars().any(char::is_alphabetic) || trimmed.chars().any(char::is_lowercase) {
        return None;
    }

    // Drop "(V.O.)", "(CONT'D)" and the dual-dialogue caret
    let name = match trimmed.find('(') {
        Some(pos) => &trimmed[..pos],
        None => trimmed,
    };
    let name = name.trim_end_matches('^').trim();

    let bare = name.trim_end_matches(['.', '!']);
    if name.is_empty() || TRANSITIONS.contains(&bare) {
        return None;
    }
    Some(name.to_string())
}
