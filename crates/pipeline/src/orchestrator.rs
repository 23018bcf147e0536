use std::sync::Arc;

use serde::Serialize;
use storyloom_core::artifact::{ArtifactDocument, GeneratedImage, GeneratedText};
use storyloom_core::error::{CompositionError, GenerationError, GenerationStage};
use storyloom_core::prompt::compile_story_prompt;
use storyloom_core::scenario::Scenario;
use storyloom_core::store::StoryStore;
use storyloom_core::types::{CallerId, DbId};
use storyloom_document::Compositor;
use storyloom_imaging::{ImageGenerator, ImageOptions};
use storyloom_llm::StoryWriter;

use crate::timeouts::StageTimeouts;

/// Result of a story request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryOutcome {
    #[serde(flatten)]
    pub text: GeneratedText,
    /// Id of the saved copy, when one was requested and the write succeeded.
    pub saved_story_id: Option<DbId>,
}

/// Coordinates the text, image and document stages.
///
/// Holds no per-request state; a single instance serves all callers.
pub struct StoryPipeline {
    writer: Arc<StoryWriter>,
    images: Arc<ImageGenerator>,
    compositor: Compositor,
    store: Option<Arc<dyn StoryStore>>,
    timeouts: StageTimeouts,
}

impl StoryPipeline {
    pub fn new(
        writer: Arc<StoryWriter>,
        images: Arc<ImageGenerator>,
        compositor: Compositor,
        timeouts: StageTimeouts,
    ) -> Self {
        Self {
            writer,
            images,
            compositor,
            store: None,
            timeouts,
        }
    }

    /// Save generated stories to `store` when the caller asks for it.
    pub fn with_store(mut self, store: Arc<dyn StoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn images(&self) -> &Arc<ImageGenerator> {
        &self.images
    }

    /// Compile the scenario, generate the story, and optionally save it.
    ///
    /// A failed save is logged and reported as `saved_story_id: None`; the
    /// story is still returned. Refused (flagged) stories are never saved.
    pub async fn request_story(
        &self,
        caller: CallerId,
        scenario: &Scenario,
        save_as: Option<&str>,
    ) -> Result<StoryOutcome, GenerationError> {
        scenario.validate()?;
        let prompt = compile_story_prompt(scenario);

        let text = self
            .timeouts
            .run(GenerationStage::Text, self.writer.generate_story(&prompt))
            .await
            .inspect_err(|e| tracing::warn!(caller, error = %e, "Story request failed"))?;

        let saved_story_id = match (save_as, &self.store) {
            (Some(title), Some(store)) if !text.flagged => {
                match store.save(caller, title, &text.content).await {
                    Ok(id) => Some(id),
                    Err(e) => {
                        tracing::error!(caller, error = %e, "Failed to save generated story");
                        None
                    }
                }
            }
            _ => None,
        };

        tracing::info!(
            caller,
            flagged = text.flagged,
            saved_story_id,
            "Story request completed",
        );
        Ok(StoryOutcome {
            text,
            saved_story_id,
        })
    }

    /// Generate and persist an image for `prompt`.
    pub async fn request_image(
        &self,
        caller: CallerId,
        prompt: &str,
        options: &ImageOptions,
    ) -> Result<GeneratedImage, GenerationError> {
        let image = self
            .timeouts
            .run(
                GenerationStage::Image,
                self.images.generate_image(prompt, options),
            )
            .await
            .inspect_err(|e| tracing::warn!(caller, error = %e, "Image request failed"))?;

        tracing::info!(
            caller,
            prompt_hash = %image.prompt_hash,
            path = %image.path,
            "Image request completed",
        );
        Ok(image)
    }

    /// Compose a document on a blocking thread.
    pub async fn request_document(
        &self,
        caller: CallerId,
        title: &str,
        text: &str,
        image_path: Option<&str>,
    ) -> Result<ArtifactDocument, CompositionError> {
        let compositor = self.compositor.clone();
        let title = title.to_string();
        let text = text.to_string();
        let image_path = image_path.map(str::to_string);

        let document = tokio::task::spawn_blocking(move || {
            compositor.compose_document(&title, &text, image_path.as_deref())
        })
        .await
        .map_err(|e| CompositionError::Render(format!("Composition task failed: {e}")))?
        .inspect_err(|e| tracing::warn!(caller, error = %e, "Document request failed"))?;

        tracing::info!(caller, path = %document.path, "Document request completed");
        Ok(document)
    }
}
