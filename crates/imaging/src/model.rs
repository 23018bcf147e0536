//! The diffusion capability interface.

use async_trait::async_trait;
use storyloom_core::error::GenerationError;

use crate::tokenizer::{self, TokenizedPrompt};

/// Text conditioning produced by [`DiffusionModel::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPrompt {
    /// Conditioning text fed to the model's text encoder.
    pub text: String,
    pub token_count: usize,
    pub truncated: bool,
}

impl From<&TokenizedPrompt> for EncodedPrompt {
    fn from(tokens: &TokenizedPrompt) -> Self {
        Self {
            text: tokens.text.clone(),
            token_count: tokens.len(),
            truncated: tokens.truncated,
        }
    }
}

/// What generation is conditioned on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conditioning {
    /// The prompt exactly as the caller supplied it.
    Raw(String),
    Encoded(EncodedPrompt),
}

impl Conditioning {
    /// Text handed to the backend's text encoder.
    pub fn text(&self) -> &str {
        match self {
            Self::Raw(prompt) => prompt,
            Self::Encoded(encoded) => &encoded.text,
        }
    }
}

/// One render request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Model name; backends map it onto concrete weights.
    pub model: String,
    pub conditioning: Conditioning,
    pub width: u32,
    pub height: u32,
}

/// A text-to-image diffusion backend.
///
/// Implementations hold heavyweight resources and are shared read-only
/// across requests through [`crate::DiffusionResources`].
#[async_trait]
pub trait DiffusionModel: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Load weights or reach the backend. Called once per process.
    async fn load(&self) -> Result<(), GenerationError> {
        Ok(())
    }

    /// Release whatever [`load`](Self::load) acquired.
    async fn unload(&self) -> Result<(), GenerationError> {
        Ok(())
    }

    /// Split a prompt into the model's token window.
    fn tokenize(&self, prompt: &str) -> Result<TokenizedPrompt, GenerationError> {
        Ok(tokenizer::tokenize(prompt))
    }

    /// Turn tokens into the conditioning input for generation.
    async fn encode(&self, tokens: &TokenizedPrompt) -> Result<EncodedPrompt, GenerationError> {
        Ok(EncodedPrompt::from(tokens))
    }

    /// Render an image and return its encoded bytes.
    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<u8>, GenerationError>;
}
