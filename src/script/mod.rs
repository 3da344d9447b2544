//! Script Text Handling
//!
//! Parsing and chunking of screenplay text before it reaches a model.

pub mod chunker;
pub mod parser;

pub use chunker::{
    ChunkSet, ChunkStrategy, ChunkingOptions, STRATEGIES, ScriptChunk, ScriptChunker, chunk_text,
    overlap_tail, split_by_paragraphs, split_by_scenes, split_by_sequences,
};
pub use parser::{Scene, ScriptOutline, Setting, normalize, parse, scene_boundaries};
