//! CLIP-style prompt pre-tokenization.
//!
//! Splits a prompt the way the CLIP text encoder does before byte-pair
//! merging and applies its 77-slot context window. Two slots hold the start
//! and end markers, so at most 75 content tokens survive; the rest are cut.

use std::sync::LazyLock;

use regex::Regex;

/// Total slots in the CLIP text context.
pub const CONTEXT_LENGTH: usize = 77;

/// Content tokens that fit between the start and end markers.
pub const MAX_CONTENT_TOKENS: usize = CONTEXT_LENGTH - 2;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'s|'t|'re|'ve|'m|'ll|'d|\p{L}+|\p{N}|[^\s\p{L}\p{N}]+").expect("valid regex")
});

/// A prompt after pre-tokenization and truncation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedPrompt {
    /// Surviving tokens, in order.
    pub tokens: Vec<String>,
    /// The normalised prompt cut after the last surviving token.
    pub text: String,
    /// True when tokens were dropped to fit the window.
    pub truncated: bool,
}

impl TokenizedPrompt {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Lower-case, collapse whitespace, split, and truncate to the window.
pub fn tokenize(prompt: &str) -> TokenizedPrompt {
    let normalised = prompt
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut tokens = Vec::new();
    let mut end = 0;
    let mut truncated = false;
    for m in TOKEN_RE.find_iter(&normalised) {
        if tokens.len() == MAX_CONTENT_TOKENS {
            truncated = true;
            break;
        }
        tokens.push(m.as_str().to_string());
        end = m.end();
    }

    TokenizedPrompt {
        tokens,
        text: normalised[..end].to_string(),
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words_numbers_and_punctuation() {
        let t = tokenize("A fox's  2 tails,   glowing!!");
        assert_eq!(
            t.tokens,
            vec!["a", "fox", "'s", "2", "tails", ",", "glowing", "!!"]
        );
        assert_eq!(t.text, "a fox's 2 tails, glowing!!");
        assert!(!t.truncated);
    }

    #[test]
    fn digits_are_single_tokens() {
        assert_eq!(tokenize("256").tokens, vec!["2", "5", "6"]);
    }

    #[test]
    fn long_prompt_is_cut_to_window() {
        let prompt = (0..100).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let t = tokenize(&prompt);
        // each "wN" yields a letter token plus one token per digit
        assert_eq!(t.len(), MAX_CONTENT_TOKENS);
        assert!(t.truncated);
        assert!(prompt.starts_with(&t.text));
        assert!(t.text.len() < prompt.len());
    }

    #[test]
    fn blank_prompt_has_no_tokens() {
        let t = tokenize("   ");
        assert!(t.is_empty());
        assert_eq!(t.text, "");
    }
}
