//! Outputs of the three pipeline stages.

use serde::{Deserialize, Serialize};

/// Story text returned by the text stage.
///
/// When `flagged` is set, `content` holds the moderation refusal message
/// instead of the model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub content: String,
    pub flagged: bool,
}

/// A raster image persisted by the image stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Filesystem location of the PNG.
    pub path: String,
    pub width: u32,
    pub height: u32,
    /// SHA-256 hex digest of the prompt; the image's storage key.
    pub prompt_hash: String,
}

/// The composed title + image + text document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDocument {
    pub title: String,
    pub image: Option<String>,
    pub body: String,
    pub path: String,
    pub pages: usize,
}
