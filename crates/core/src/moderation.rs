//! Post-generation safety gate.
//!
//! The gate decides whether generated text may be shown. Flagged text is
//! replaced by [`REFUSAL_MESSAGE`] and reported as a success, not an error.
//!
//! [`KeywordGate`] is a substring match on lower-cased text. It catches a
//! model that announces its own refusal and little else; it is a policy knob,
//! not semantic moderation. Swap in a stronger [`ModerationGate`] where that
//! matters.

use crate::artifact::GeneratedText;

/// Text substituted for flagged completions.
pub const REFUSAL_MESSAGE: &str = "The story cannot be generated due to inappropriate content.";

/// Default keyword checked by [`KeywordGate`].
pub const DEFAULT_FLAG_KEYWORD: &str = "inappropriate";

/// Outcome of a moderation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationVerdict {
    Allowed,
    Flagged,
}

/// Classifies generated text.
pub trait ModerationGate: Send + Sync {
    fn classify(&self, text: &str) -> ModerationVerdict;
}

/// Flags text containing any of a set of keywords, case-insensitively.
#[derive(Debug, Clone)]
pub struct KeywordGate {
    keywords: Vec<String>,
}

impl KeywordGate {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

impl Default for KeywordGate {
    fn default() -> Self {
        Self::new([DEFAULT_FLAG_KEYWORD])
    }
}

impl ModerationGate for KeywordGate {
    fn classify(&self, text: &str) -> ModerationVerdict {
        let lowered = text.to_lowercase();
        if self.keywords.iter().any(|k| lowered.contains(k.as_str())) {
            ModerationVerdict::Flagged
        } else {
            ModerationVerdict::Allowed
        }
    }
}

/// Run `raw` through `gate`, substituting the refusal message when flagged.
pub fn moderate(gate: &dyn ModerationGate, raw: String) -> GeneratedText {
    match gate.classify(&raw) {
        ModerationVerdict::Allowed => GeneratedText {
            content: raw,
            flagged: false,
        },
        ModerationVerdict::Flagged => GeneratedText {
            content: REFUSAL_MESSAGE.to_string(),
            flagged: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_passes_unchanged() {
        let raw = "The fox found the key beneath the old oak.".to_string();
        let text = moderate(&KeywordGate::default(), raw.clone());
        assert_eq!(text.content, raw);
        assert!(!text.flagged);
    }

    #[test]
    fn keyword_is_matched_case_insensitively() {
        for raw in [
            "That request is inappropriate.",
            "INAPPROPRIATE",
            "I find this InAppropriate to write.",
        ] {
            let text = moderate(&KeywordGate::default(), raw.to_string());
            assert!(text.flagged, "{raw:?} should be flagged");
            assert_eq!(text.content, REFUSAL_MESSAGE);
        }
    }

    #[test]
    fn keyword_inside_longer_word_is_flagged() {
        let gate = KeywordGate::default();
        assert_eq!(
            gate.classify("inappropriately long"),
            ModerationVerdict::Flagged
        );
    }

    #[test]
    fn custom_keywords() {
        let gate = KeywordGate::new(["Gore", ""]);
        assert_eq!(gate.classify("so much gore"), ModerationVerdict::Flagged);
        assert_eq!(gate.classify("inappropriate"), ModerationVerdict::Allowed);
        assert_eq!(gate.classify("anything"), ModerationVerdict::Allowed);
    }
}
