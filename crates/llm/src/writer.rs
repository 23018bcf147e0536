//! Story writer: compiled prompt in, moderated story text out.

use std::sync::Arc;
use std::time::Instant;

use storyloom_core::artifact::GeneratedText;
use storyloom_core::error::GenerationError;
use storyloom_core::moderation::{moderate, KeywordGate, ModerationGate};

use crate::client::{ChatCompletion, ChatMessage};

/// System instruction establishing the writer persona.
pub const STORY_SYSTEM_PROMPT: &str = "You are a creative story writer.";

/// Generates story text through a [`ChatCompletion`] and applies the safety
/// gate to whatever comes back.
pub struct StoryWriter {
    completion: Arc<dyn ChatCompletion>,
    gate: Arc<dyn ModerationGate>,
}

impl StoryWriter {
    /// Writer using the default [`KeywordGate`].
    pub fn new(completion: Arc<dyn ChatCompletion>) -> Self {
        Self::with_gate(completion, Arc::new(KeywordGate::default()))
    }

    pub fn with_gate(completion: Arc<dyn ChatCompletion>, gate: Arc<dyn ModerationGate>) -> Self {
        Self { completion, gate }
    }

    /// Generate a story for an already-compiled prompt.
    ///
    /// Flagged output is returned as a success carrying the refusal message.
    /// Failures of the completion call are returned as-is, never retried.
    pub async fn generate_story(&self, prompt: &str) -> Result<GeneratedText, GenerationError> {
        let messages = [
            ChatMessage::system(STORY_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];

        let start = Instant::now();
        let raw = self.completion.complete(&messages).await.map_err(|e| {
            tracing::warn!(model = self.completion.model(), error = %e, "Story completion failed");
            GenerationError::from(e)
        })?;

        let text = moderate(self.gate.as_ref(), raw);
        tracing::info!(
            model = self.completion.model(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            flagged = text.flagged,
            chars = text.content.len(),
            "Story generated",
        );
        Ok(text)
    }
}
