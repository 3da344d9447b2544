//! Token Estimation
//!
//! Approximate token counting used to size prompts and chunks before they
//! are sent to a language model.
//!
//! ## Strategy
//! - Fixed 4-characters-per-token heuristic, rounded up
//! - Counts Unicode scalar values, not bytes
//!
//! The estimate is intentionally approximate; it does not match any provider
//! tokenizer exactly.

use crate::constants::tokens::CHARS_PER_TOKEN;

/// Token counter for context management
#[derive(Debug, Clone, Copy)]
pub struct TokenCounter {
    chars_per_token: usize,
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new(CHARS_PER_TOKEN)
    }
}

impl TokenCounter {
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    /// Estimate token count for a string: `ceil(chars / chars_per_token)`
    pub fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }

    /// Check if content fits within token budget
    pub fn fits_budget(&self, text: &str, budget: usize) -> bool {
        self.count(text) <= budget
    }

    /// Calculate remaining budget after content
    pub fn remaining_budget(&self, text: &str, budget: usize) -> usize {
        budget.saturating_sub(self.count(text))
    }
}

/// Estimate tokens with the default counter
pub fn estimate_tokens(text: &str) -> usize {
    TokenCounter::default().count(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_rounds_up() {
        let counter = TokenCounter::default();
        assert_eq!(counter.count(""), 0);
        assert_eq!(counter.count("a"), 1);
        assert_eq!(counter.count("abcd"), 1);
        assert_eq!(counter.count("abcde"), 2);
        assert_eq!(counter.count(&"x".repeat(400)), 100);
    }

    #[test]
    fn test_count_uses_chars_not_bytes() {
        // 4 chars, 8 bytes
        assert_eq!(estimate_tokens("éééé"), 1);
    }

    #[test]
    fn test_fits_budget() {
        let counter = TokenCounter::default();
        assert!(counter.fits_budget("12345678", 2));
        assert!(!counter.fits_budget("123456789", 2));
    }

    #[test]
    fn test_remaining_budget() {
        let counter = TokenCounter::default();
        assert_eq!(counter.remaining_budget("12345678", 10), 8);
        assert_eq!(counter.remaining_budget(&"x".repeat(100), 10), 0);
    }

    #[test]
    fn test_zero_ratio_is_clamped() {
        let counter = TokenCounter::new(0);
        assert_eq!(counter.count("abc"), 3);
    }
}
