use std::fmt;

use crate::types::DbId;

/// Domain errors raised by the Story Store and the auth layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Malformed pipeline input (scenario, prompt, or title).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// The generative stage an error or timeout belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    Text,
    Image,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Image => f.write_str("image"),
        }
    }
}

/// Failure of a remote or model-backed generation stage.
///
/// Adapters convert their transport-specific errors into this type at their
/// boundary. Nothing in the pipeline retries on any variant.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Network, DNS, or TLS failure before a response arrived.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The capability rejected our credentials.
    #[error("Authentication rejected: {0}")]
    Auth(String),

    /// Quota or rate limit hit.
    #[error("Rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Any other non-success status from the capability.
    #[error("Upstream error ({status}): {body}")]
    Upstream { status: u16, body: String },

    /// A success status with a body we could not interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model resources could not be loaded or reached.
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    /// The model ran but did not produce a usable result.
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("{stage} generation timed out after {secs}s")]
    Timeout { stage: GenerationStage, secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationError),
}

/// Failure while assembling the artifact document.
#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    /// The referenced image does not exist or cannot be read.
    #[error("Image not readable at {path}: {reason}")]
    MissingImage { path: String, reason: String },

    /// The image file exists but is not a decodable raster image.
    #[error("Image at {path} could not be decoded: {reason}")]
    ImageDecode { path: String, reason: String },

    #[error("Document rendering failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_stage() {
        let err = GenerationError::Timeout {
            stage: GenerationStage::Image,
            secs: 600,
        };
        assert_eq!(err.to_string(), "image generation timed out after 600s");
    }

    #[test]
    fn validation_error_converts_into_both_stage_errors() {
        let gen: GenerationError = ValidationError::new("prompt", "must not be blank").into();
        assert_eq!(gen.to_string(), "Invalid input: prompt: must not be blank");

        let comp: CompositionError = ValidationError::new("title", "must not be blank").into();
        assert_eq!(comp.to_string(), "Invalid input: title: must not be blank");
    }
}
