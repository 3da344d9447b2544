//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Token estimation constants
pub mod tokens {
    /// Characters per token for the approximate estimator
    pub const CHARS_PER_TOKEN: usize = 4;
}

/// Chunking constants
pub mod chunking {
    /// Default token budget per chunk
    pub const DEFAULT_MAX_CHUNK_SIZE: usize = 4000;

    /// Default tokens carried over from the previous unit
    pub const DEFAULT_OVERLAP: usize = 200;

    /// Default separator used to rejoin units
    pub const DEFAULT_SEPARATOR: &str = "\n\n";
}

/// HTTP/Network constants
pub mod network {
    /// Default per-request timeout (milliseconds)
    pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 10;
}

/// Model defaults shared by all providers
pub mod generation {
    /// Default sampling temperature
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    /// Default maximum tokens to generate
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;
}

/// Environment variables holding provider credentials
pub mod env {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
    pub const GOOGLE_AI_KEY: &str = "GOOGLE_AI_KEY";

    /// Prefix for configuration overrides (e.g. SCRIPTGENIUS_AI__TIMEOUT_MS)
    pub const CONFIG_PREFIX: &str = "SCRIPTGENIUS_";
}

/// Prompt placeholders
pub mod prompt {
    /// Title used when the script context has none
    pub const UNTITLED: &str = "Untitled";

    /// Genre used when the script context has none
    pub const GENRE_NOT_SPECIFIED: &str = "Not specified";
}
