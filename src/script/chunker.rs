//! Script Chunking
//!
//! Splits long scripts into pieces that fit a model's token budget.
//!
//! ## Strategy
//!
//! 1. Text within budget is returned unchanged as a single chunk
//! 2. Otherwise the first strategy in `STRATEGIES` that applies produces the
//!    units: scene headings, then sequence markers, then paragraphs
//! 3. Units are greedily merged; when a unit does not fit, the next chunk is
//!    seeded with a word tail of the previous unit (the overlap)
//!
//! Units larger than the budget on their own are hard-wrapped on line, then
//! word boundaries first, so every chunk fits.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::parser::{scene_boundaries, sequence_boundaries};
use crate::ai::tokenizer::estimate_tokens;
use crate::constants::{chunking as chunk_constants, tokens};
use crate::types::{Result, ScriptError};

// =============================================================================
// Options
// =============================================================================

/// Chunking parameters; `overlap` must stay below `max_chunk_size`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingOptions {
    /// Token budget per chunk
    pub max_chunk_size: usize,
    /// Tokens carried over from the previous unit
    pub overlap: usize,
    /// Text used to rejoin units
    pub separator: String,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: chunk_constants::DEFAULT_MAX_CHUNK_SIZE,
            overlap: chunk_constants::DEFAULT_OVERLAP,
            separator: chunk_constants::DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl ChunkingOptions {
    pub fn new(max_chunk_size: usize, overlap: usize) -> Result<Self> {
        let options = Self {
            max_chunk_size,
            overlap,
            ..Default::default()
        };
        options.validate()?;
        Ok(options)
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(ScriptError::InvalidChunking(
                "max_chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.overlap >= self.max_chunk_size {
            return Err(ScriptError::InvalidChunking(format!(
                "overlap ({}) must be less than max_chunk_size ({})",
                self.overlap, self.max_chunk_size
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Chunks
// =============================================================================

/// How a script was divided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// Fit the budget, returned as is
    Whole,
    Scene,
    Sequence,
    Paragraph,
}

impl std::fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkStrategy::Whole => write!(f, "whole"),
            ChunkStrategy::Scene => write!(f, "scene"),
            ChunkStrategy::Sequence => write!(f, "sequence"),
            ChunkStrategy::Paragraph => write!(f, "paragraph"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptChunk {
    pub index: usize,
    pub content: String,
    pub estimated_tokens: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSet {
    pub strategy: ChunkStrategy,
    pub chunks: Vec<ScriptChunk>,
}

impl ChunkSet {
    fn from_contents(strategy: ChunkStrategy, contents: Vec<String>) -> Self {
        let chunks = contents
            .into_iter()
            .enumerate()
            .map(|(index, content)| ScriptChunk {
                index,
                estimated_tokens: estimate_tokens(&content),
                content,
            })
            .collect();
        Self { strategy, chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_tokens(&self) -> usize {
        self.chunks.iter().map(|c| c.estimated_tokens).sum()
    }

    pub fn into_contents(self) -> Vec<String> {
        self.chunks.into_iter().map(|c| c.content).collect()
    }
}

// =============================================================================
// Splitting Strategies
// =============================================================================

/// A splitting strategy: `None` when it does not apply to the text
pub type SplitFn = fn(&str) -> Option<Vec<String>>;

/// Strategies in priority order; the first that applies wins
pub const STRATEGIES: &[(ChunkStrategy, SplitFn)] = &[
    (ChunkStrategy::Scene, split_by_scenes),
    (ChunkStrategy::Sequence, split_by_sequences),
    (ChunkStrategy::Paragraph, split_by_paragraphs),
];

/// Units starting at each scene heading; applies with more than one heading
pub fn split_by_scenes(text: &str) -> Option<Vec<String>> {
    split_at(text, &scene_boundaries(text))
}

/// Units starting at each `#` marker line; applies with more than one marker
pub fn split_by_sequences(text: &str) -> Option<Vec<String>> {
    split_at(text, &sequence_boundaries(text))
}

/// Blank-line-delimited paragraphs; applies to any non-blank text
pub fn split_by_paragraphs(text: &str) -> Option<Vec<String>> {
    let mut units = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                units.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        units.push(current.join("\n"));
    }

    (!units.is_empty()).then_some(units)
}

/// Cut `text` at `boundaries`; text before the first boundary is its own unit
fn split_at(text: &str, boundaries: &[usize]) -> Option<Vec<String>> {
    if boundaries.len() < 2 {
        return None;
    }

    let mut cuts = Vec::with_capacity(boundaries.len() + 2);
    cuts.push(0);
    cuts.extend_from_slice(boundaries);
    cuts.push(text.len());

    let units = cuts
        .windows(2)
        .map(|w| text[w[0]..w[1]].trim())
        .filter(|unit| !unit.is_empty())
        .map(String::from)
        .collect();
    Some(units)
}

// =============================================================================
// Chunker
// =============================================================================

/// Token-bounded script splitter
#[derive(Debug, Clone)]
pub struct ScriptChunker {
    options: ChunkingOptions,
}

impl ScriptChunker {
    /// Fails with `InvalidChunking` if `overlap >= max_chunk_size`
    pub fn new(options: ChunkingOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &ChunkingOptions {
        &self.options
    }

    /// Chunk contents only
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        self.chunk(text).into_contents()
    }

    pub fn chunk(&self, text: &str) -> ChunkSet {
        let max = self.options.max_chunk_size;
        let total = estimate_tokens(text);

        if total <= max {
            debug!("Script fits budget ({} <= {} tokens)", total, max);
            return ChunkSet::from_contents(ChunkStrategy::Whole, vec![text.to_string()]);
        }

        let (strategy, units) = STRATEGIES
            .iter()
            .find_map(|(strategy, split)| split(text).map(|units| (*strategy, units)))
            .unwrap_or((ChunkStrategy::Paragraph, Vec::new()));

        debug!(
            "Splitting {} tokens by {} into {} units",
            total,
            strategy,
            units.len()
        );

        let contents = self.merge(units);
        debug!("Produced {} chunks", contents.len());
        ChunkSet::from_contents(strategy, contents)
    }

    /// Greedy merge with overlap seeding
    fn merge(&self, units: Vec<String>) -> Vec<String> {
        let max = self.options.max_chunk_size;
        let separator = self.options.separator.as_str();

        let units: Vec<String> = units
            .into_iter()
            .flat_map(|unit| hard_wrap(unit, max))
            .collect();

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut previous: Option<&str> = None;

        for unit in &units {
            if current.is_empty() {
                current.push_str(unit);
            } else {
                let candidate = format!("{}{}{}", current, separator, unit);
                if estimate_tokens(&candidate) <= max {
                    current = candidate;
                } else {
                    chunks.push(std::mem::take(&mut current));

                    // Cap the tail so the seeded chunk stays within budget
                    let room = max.saturating_sub(estimate_tokens(&format!("{}{}", separator, unit)));
                    let budget = self.options.overlap.min(room);
                    let tail = previous
                        .map(|prev| overlap_tail(prev, budget))
                        .unwrap_or_default();

                    if !tail.is_empty() {
                        current.push_str(&tail);
                        current.push_str(separator);
                    }
                    current.push_str(unit);
                }
            }
            previous = Some(unit);
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }
}

/// Trailing words of `unit`, as many as fit in `budget` tokens
pub fn overlap_tail(unit: &str, budget: usize) -> String {
    if budget == 0 {
        return String::new();
    }

    let max_chars = budget * tokens::CHARS_PER_TOKEN;
    let mut words: Vec<&str> = Vec::new();
    let mut chars = 0;

    for word in unit.split_whitespace().rev() {
        let needed = word.chars().count() + usize::from(!words.is_empty());
        if chars + needed > max_chars {
            break;
        }
        chars += needed;
        words.push(word);
    }

    words.reverse();
    words.join(" ")
}

/// Split a unit over budget on lines, then words, then characters
fn hard_wrap(unit: String, max: usize) -> Vec<String> {
    if estimate_tokens(&unit) <= max {
        return vec![unit];
    }
    let lines = unit
        .lines()
        .flat_map(|line| wrap_line(line, max))
        .collect::<Vec<_>>();
    pack(lines, "\n", max)
}

fn wrap_line(line: &str, max: usize) -> Vec<String> {
    if estimate_tokens(line) <= max {
        return vec![line.to_string()];
    }
    let words = line
        .split_whitespace()
        .flat_map(|word| split_word(word, max))
        .collect::<Vec<_>>();
    pack(words, " ", max)
}

fn split_word(word: &str, max: usize) -> Vec<String> {
    if estimate_tokens(word) <= max {
        return vec![word.to_string()];
    }
    word.chars()
        .collect::<Vec<_>>()
        .chunks(max * tokens::CHARS_PER_TOKEN)
        .map(|c| c.iter().collect())
        .collect()
}

/// Greedily join pieces (each within budget) while the result fits
fn pack(pieces: Vec<String>, joiner: &str, max: usize) -> Vec<String> {
    let mut packed = Vec::new();
    let mut current = String::new();

    for piece in pieces {
        if current.is_empty() {
            current = piece;
            continue;
        }
        let candidate = format!("{}{}{}", current, joiner, piece);
        if estimate_tokens(&candidate) <= max {
            current = candidate;
        } else {
            packed.push(std::mem::replace(&mut current, piece));
        }
    }
    if !current.trim().is_empty() {
        packed.push(current);
    }
    packed
}

/// Chunk `text` with `options`
pub fn chunk_text(text: &str, options: &ChunkingOptions) -> Result<Vec<String>> {
    Ok(ScriptChunker::new(options.clone())?.chunk_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunker(max: usize, overlap: usize) -> ScriptChunker {
        ScriptChunker::new(ChunkingOptions::new(max, overlap).unwrap()).unwrap()
    }

    fn scene(name: &str, words: usize) -> String {
        let body = (0..words)
            .map(|i| format!("{}{}", name.to_lowercase(), i))
            .collect::<Vec<_>>()
            .join(" ");
        format!("INT. {} - DAY\n\n{}", name, body)
    }

    #[test]
    fn test_small_text_returned_unchanged() {
        let text = "INT. ROOM - DAY\n\nShort.  \n";
        let set = chunker(100, 10).chunk(text);
        assert_eq!(set.strategy, ChunkStrategy::Whole);
        assert_eq!(set.into_contents(), vec![text.to_string()]);
    }

    #[test]
    fn test_options_validation() {
        assert!(ChunkingOptions::new(100, 100).is_err());
        assert!(ChunkingOptions::new(100, 150).is_err());
        assert!(ChunkingOptions::new(0, 0).is_err());
        assert!(ChunkingOptions::new(100, 99).is_ok());
        assert!(matches!(
            ScriptChunker::new(ChunkingOptions {
                overlap: 5000,
                ..Default::default()
            }),
            Err(ScriptError::InvalidChunking(_))
        ));
    }

    #[test]
    fn test_split_by_scenes_keeps_preamble() {
        let text = "FADE IN:\n\nINT. A - DAY\nOne.\n\nEXT. B - NIGHT\nTwo.";
        let units = split_by_scenes(text).unwrap();
        assert_eq!(
            units,
            vec!["FADE IN:", "INT. A - DAY\nOne.", "EXT. B - NIGHT\nTwo."]
        );
    }

    #[test]
    fn test_split_by_scenes_needs_two_headings() {
        assert!(split_by_scenes("INT. A - DAY\nOnly one scene.").is_none());
        assert!(split_by_scenes("No headings at all.").is_none());
    }

    #[test]
    fn test_split_by_sequences() {
        let text = "# ACT ONE\nSetup.\n\n## Sequence 2\nConflict.";
        assert_eq!(
            split_by_sequences(text).unwrap(),
            vec!["# ACT ONE\nSetup.", "## Sequence 2\nConflict."]
        );
    }

    #[test]
    fn test_split_by_paragraphs() {
        let text = "\n\nFirst line\nstill first.\n  \nSecond.\n\n\n";
        assert_eq!(
            split_by_paragraphs(text).unwrap(),
            vec!["First line\nstill first.", "Second."]
        );
        assert!(split_by_paragraphs(" \n\n ").is_none());
    }

    #[test]
    fn test_scene_strategy_preferred() {
        let text = [scene("A", 30), scene("B", 30), scene("C", 30)].join("\n\n");
        let set = chunker(80, 0).chunk(&text);
        assert_eq!(set.strategy, ChunkStrategy::Scene);
        assert!(set.len() > 1);
        assert!(set.chunks[0].content.starts_with("INT. A"));
    }

    #[test]
    fn test_paragraph_fallback() {
        let text = (0..20)
            .map(|i| format!("Paragraph number {} with some words.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let set = chunker(30, 0).chunk(&text);
        assert_eq!(set.strategy, ChunkStrategy::Paragraph);
        assert!(set.chunks.iter().all(|c| c.estimated_tokens <= 30));
    }

    #[test]
    fn test_overlap_seeds_next_chunk_with_previous_tail() {
        let a = scene("A", 40);
        let b = scene("B", 40);
        let text = format!("{}\n\n{}", a, b);
        let set = chunker(60, 5).chunk(&text);

        assert_eq!(set.strategy, ChunkStrategy::Scene);
        assert_eq!(set.len(), 2);
        assert_eq!(set.chunks[0].content, a);
        assert_eq!(set.chunks[1].content, format!("a35 a36 a37 a38 a39\n\n{}", b));
    }

    #[test]
    fn test_zero_overlap_starts_with_unit() {
        let a = scene("A", 40);
        let b = scene("B", 40);
        let set = chunker(60, 0).chunk(&format!("{}\n\n{}", a, b));
        assert_eq!(set.into_contents(), vec![a, b]);
    }

    #[test]
    fn test_overlap_tail_within_budget() {
        assert_eq!(overlap_tail("one two three four", 3), "three four");
        assert_eq!(overlap_tail("one two three four", 2), "four");
        assert_eq!(overlap_tail("one two three four", 0), "");
        assert_eq!(overlap_tail("supercalifragilistic", 1), "");
    }

    #[test]
    fn test_oversized_unit_is_wrapped() {
        let long_line = "word ".repeat(200);
        let text = format!("INT. A - DAY\n{}\n\nINT. B - DAY\nShort.", long_line.trim());
        let set = chunker(50, 10).chunk(&text);
        assert!(set.chunks.iter().all(|c| c.estimated_tokens <= 50));
        assert!(set.chunks.last().unwrap().content.ends_with("Short."));
    }

    #[test]
    fn test_free_function_validates() {
        let bad = ChunkingOptions {
            max_chunk_size: 10,
            overlap: 10,
            separator: "\n".to_string(),
        };
        assert!(chunk_text("text", &bad).is_err());
        let ok = ChunkingOptions::new(10, 2).unwrap().with_separator("\n");
        assert_eq!(chunk_text("text", &ok).unwrap(), vec!["text"]);
    }

    fn scene_script() -> impl Strategy<Value = (Vec<String>, String)> {
        prop::collection::vec(("[A-Z]{3,8}", 1usize..40), 2..12).prop_map(|scenes| {
            let units: Vec<String> = scenes
                .iter()
                .map(|(name, words)| scene(name, *words))
                .collect();
            let text = units.join("\n\n");
            (units, text)
        })
    }

    proptest! {
        #[test]
        fn prop_small_text_single_chunk(text in "[a-zA-Z .\n]{0,200}") {
            let chunks = chunker(60, 5).chunk_text(&text);
            prop_assert_eq!(chunks, vec![text]);
        }

        #[test]
        fn prop_chunks_fit_budget(
            text in "[a-zA-Z .#\n]{0,3000}",
            max in 10usize..200,
            overlap_pct in 0usize..90,
        ) {
            let overlap = max * overlap_pct / 100;
            let set = chunker(max, overlap).chunk(&text);
            for chunk in &set.chunks {
                prop_assert!(chunk.estimated_tokens <= max);
            }
        }

        #[test]
        fn prop_zero_overlap_preserves_units((units, text) in scene_script(), max in 120usize..400) {
            let chunks = chunker(max, 0).chunk_text(&text);
            if chunks.len() > 1 {
                prop_assert_eq!(chunks.join("\n\n"), units.join("\n\n"));
            }
        }

        #[test]
        fn prop_overlap_tail_never_exceeds_budget(text in "[a-z ]{0,300}", budget in 0usize..40) {
            let tail = overlap_tail(&text, budget);
            prop_assert!(estimate_tokens(&tail) <= budget);
            prop_assert!(text.split_whitespace().collect::<Vec<_>>().ends_with(
                &tail.split_whitespace().collect::<Vec<_>>()
            ));
        }
    }
}
