//! Image generation stage.
//!
//! A [`DiffusionModel`] capability (tokenize, encode, generate) lives behind
//! a process-scoped [`DiffusionResources`] holder that loads it once and
//! serialises inference. [`ImageGenerator`] drives it for a prompt and
//! persists the result under a prompt-hash filename.

pub mod comfy;
pub mod config;
pub mod generator;
pub mod model;
pub mod resources;
pub mod tokenizer;

pub use comfy::ComfyUiDiffusion;
pub use config::{DiffusionConfig, EmbeddingMode};
pub use generator::{ImageGenerator, ImageOptions, DEFAULT_IMAGE_MODEL};
pub use model::{Conditioning, DiffusionModel, EncodedPrompt, GenerateRequest};
pub use resources::DiffusionResources;
pub use tokenizer::TokenizedPrompt;
