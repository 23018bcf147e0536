//! Prompt in, PNG on disk out.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use image::{ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};
use storyloom_core::artifact::GeneratedImage;
use storyloom_core::error::{GenerationError, ValidationError};
use storyloom_core::hashing::prompt_hash;
use storyloom_core::naming::image_filename;
use storyloom_core::prompt::compile_image_prompt;

use crate::config::EmbeddingMode;
use crate::model::{Conditioning, GenerateRequest};
use crate::resources::DiffusionResources;

/// Model name callers use when they do not pick one.
pub const DEFAULT_IMAGE_MODEL: &str = "base-diffusion-v1";

const MIN_DIMENSION: u32 = 64;
const MAX_DIMENSION: u32 = 2048;

/// Per-request generation options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    pub model: String,
    pub width: u32,
    pub height: u32,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_IMAGE_MODEL.to_string(),
            width: 256,
            height: 256,
        }
    }
}

impl ImageOptions {
    /// Dimensions must be multiples of 8 (the latent stride) within
    /// 64..=2048 pixels.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.model.trim().is_empty() {
            return Err(ValidationError::new("model", "must not be blank"));
        }
        check_dimension("width", self.width)?;
        check_dimension("height", self.height)
    }
}

fn check_dimension(field: &'static str, value: u32) -> Result<(), ValidationError> {
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        return Err(ValidationError::new(
            field,
            format!("must be between {MIN_DIMENSION} and {MAX_DIMENSION}"),
        ));
    }
    if value % 8 != 0 {
        return Err(ValidationError::new(field, "must be a multiple of 8"));
    }
    Ok(())
}

/// Image generation adapter.
pub struct ImageGenerator {
    resources: Arc<DiffusionResources>,
    mode: EmbeddingMode,
    image_dir: PathBuf,
}

impl ImageGenerator {
    pub fn new(
        resources: Arc<DiffusionResources>,
        mode: EmbeddingMode,
        image_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resources,
            mode,
            image_dir: image_dir.into(),
        }
    }

    pub fn resources(&self) -> &Arc<DiffusionResources> {
        &self.resources
    }

    /// Generate an image for `prompt` and store it at
    /// `{image_dir}/generated_image_{sha256(prompt)}.png`.
    ///
    /// Identical prompts share a path; a later render overwrites an earlier
    /// one.
    pub async fn generate_image(
        &self,
        prompt: &str,
        options: &ImageOptions,
    ) -> Result<GeneratedImage, GenerationError> {
        let prompt = compile_image_prompt(prompt);
        if prompt.trim().is_empty() {
            return Err(ValidationError::new("prompt", "must not be blank").into());
        }
        options.validate()?;

        let hash = prompt_hash(&prompt);
        let start = Instant::now();

        let bytes = {
            let model = self.resources.acquire().await?;
            let conditioning = match self.mode {
                EmbeddingMode::Raw => Conditioning::Raw(prompt.clone()),
                EmbeddingMode::Conditioned => {
                    let tokens = model.tokenize(&prompt)?;
                    if tokens.truncated {
                        tracing::debug!(prompt_hash = %hash, "Prompt truncated to token window");
                    }
                    Conditioning::Encoded(model.encode(&tokens).await?)
                }
            };
            model
                .generate(&GenerateRequest {
                    model: options.model.clone(),
                    conditioning,
                    width: options.width,
                    height: options.height,
                })
                .await?
        };

        let (png, rendered_width, rendered_height) = normalise_png(bytes)?;
        if (rendered_width, rendered_height) != (options.width, options.height) {
            tracing::warn!(
                prompt_hash = %hash,
                requested_width = options.width,
                requested_height = options.height,
                rendered_width,
                rendered_height,
                "Backend rendered a different size than requested",
            );
        }

        let path = self.image_dir.join(image_filename(&prompt));
        let dir = self.image_dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&dir, &target, &png))
            .await
            .map_err(|e| GenerationError::Generation(format!("Image write task failed: {e}")))??;

        let path = path.to_string_lossy().into_owned();
        tracing::info!(
            prompt_hash = %hash,
            model = %options.model,
            width = options.width,
            height = options.height,
            elapsed_ms = start.elapsed().as_millis() as u64,
            path = %path,
            "Image generated",
        );

        Ok(GeneratedImage {
            path,
            width: options.width,
            height: options.height,
            prompt_hash: hash,
        })
    }
}

/// Write `bytes` to a temp file in `dir` and rename it over `path`, so
/// readers and concurrent writers of the same prompt never see a partial file.
fn write_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Sniff the format, read dimensions, and re-encode non-PNG output as PNG.
fn normalise_png(bytes: Vec<u8>) -> Result<(Vec<u8>, u32, u32), GenerationError> {
    let invalid = |e: image::ImageError| {
        GenerationError::InvalidResponse(format!("backend returned an unreadable image: {e}"))
    };

    let reader = ImageReader::new(Cursor::new(bytes.as_slice())).with_guessed_format()?;
    match reader.format() {
        Some(ImageFormat::Png) => {
            let (width, height) = reader.into_dimensions().map_err(invalid)?;
            Ok((bytes, width, height))
        }
        Some(_) => {
            let decoded = reader.decode().map_err(invalid)?;
            let mut out = Cursor::new(Vec::new());
            decoded
                .write_to(&mut out, ImageFormat::Png)
                .map_err(|e| GenerationError::Generation(format!("PNG encoding failed: {e}")))?;
            Ok((out.into_inner(), decoded.width(), decoded.height()))
        }
        None => Err(GenerationError::InvalidResponse(
            "backend returned bytes that are not a recognised image format".into(),
        )),
    }
}
