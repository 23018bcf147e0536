//! [`DiffusionModel`] backed by a ComfyUI server.
//!
//! Generation submits a txt2img workflow, polls the prompt's history until
//! an output image appears, and downloads it. A render that outlives the
//! configured timeout, or whose caller gives up first, is removed from
//! ComfyUI before its in-flight slot is released.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use storyloom_comfyui::api::{ComfyUIApi, ComfyUIApiError};
use storyloom_comfyui::workflow::Txt2ImgWorkflow;
use storyloom_core::error::{GenerationError, GenerationStage};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::DiffusionConfig;
use crate::generator::DEFAULT_IMAGE_MODEL;
use crate::model::{DiffusionModel, GenerateRequest};

/// Diffusion backend driving a ComfyUI instance over REST.
pub struct ComfyUiDiffusion {
    api: ComfyUIApi,
    client_id: String,
    checkpoint: String,
    steps: u32,
    cfg: f32,
    poll_interval: Duration,
    timeout: Duration,
    /// Renders submitted to ComfyUI and not yet finished or removed.
    in_flight: Arc<Semaphore>,
}

impl ComfyUiDiffusion {
    pub fn new(config: &DiffusionConfig) -> Result<Self, GenerationError> {
        let api = ComfyUIApi::with_timeout(
            config.comfyui_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
        .map_err(|e| GenerationError::ModelLoad(format!("ComfyUI client setup failed: {e}")))?;

        Ok(Self {
            api,
            client_id: uuid::Uuid::new_v4().to_string(),
            checkpoint: config.checkpoint.clone(),
            steps: config.steps,
            cfg: config.cfg,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            timeout: Duration::from_secs(config.timeout_secs),
            in_flight: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
        })
    }

    /// Checkpoint file for a model name. The default model name maps to the
    /// configured checkpoint; anything else is taken as a checkpoint file.
    pub fn checkpoint_for(&self, model: &str) -> String {
        if model == DEFAULT_IMAGE_MODEL {
            self.checkpoint.clone()
        } else {
            model.to_string()
        }
    }

    // ---- private helpers ----

    /// Poll history until the prompt finishes or the deadline passes.
    async fn wait_for_output(
        &self,
        render: PendingRender,
        started: Instant,
    ) -> Result<Vec<u8>, GenerationError> {
        loop {
            let polled = self.api.get_history(render.prompt_id()).await;
            let entry = match polled {
                Ok(entry) => entry,
                Err(e) => {
                    render.remove().await;
                    return Err(api_error(e));
                }
            };

            if let Some(entry) = entry {
                if entry.is_error() {
                    render.finish();
                    let reason = entry
                        .error_message()
                        .unwrap_or_else(|| "execution failed".to_string());
                    return Err(GenerationError::Generation(reason));
                }
                if let Some(image) = entry.first_image() {
                    render.finish();
                    return self.api.view_image(image).await.map_err(api_error);
                }
                if entry.status.completed {
                    render.finish();
                    return Err(GenerationError::Generation(
                        "workflow completed without an image output".into(),
                    ));
                }
            }

            if started.elapsed() >= self.timeout {
                tracing::warn!(
                    prompt_id = render.prompt_id(),
                    timeout_secs = self.timeout.as_secs(),
                    "Render timed out",
                );
                render.remove().await;
                return Err(GenerationError::Timeout {
                    stage: GenerationStage::Image,
                    secs: self.timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl DiffusionModel for ComfyUiDiffusion {
    fn name(&self) -> &str {
        "comfyui"
    }

    /// Probe the server; the checkpoint itself is loaded by ComfyUI on first
    /// render.
    async fn load(&self) -> Result<(), GenerationError> {
        self.api
            .system_stats()
            .await
            .map(|_| ())
            .map_err(|e| GenerationError::ModelLoad(format!("ComfyUI unreachable: {e}")))
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<u8>, GenerationError> {
        let workflow = Txt2ImgWorkflow::new(
            self.checkpoint_for(&request.model),
            request.conditioning.text(),
        )
        .size(request.width, request.height)
        .seed(u64::from(rand::random::<u32>()))
        .steps(self.steps)
        .cfg(self.cfg);

        let slot = Arc::clone(&self.in_flight)
            .acquire_owned()
            .await
            .map_err(|_| GenerationError::ModelLoad("ComfyUI backend is closed".into()))?;

        let started = Instant::now();
        let submitted = self
            .api
            .submit_workflow(&workflow.to_json(), &self.client_id)
            .await
            .map_err(api_error)?;
        let prompt_id = submitted.prompt_id.clone();
        let render = PendingRender {
            api: self.api.clone(),
            prompt_id: submitted.prompt_id,
            slot: Some(slot),
        };

        let bytes = self.wait_for_output(render, started).await?;
        tracing::debug!(
            prompt_id = %prompt_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = bytes.len(),
            "ComfyUI render finished",
        );
        Ok(bytes)
    }
}

/// A submitted prompt that has not reached a final state.
///
/// Dropped without [`finish`](Self::finish) or [`remove`](Self::remove),
/// which happens when the caller stops awaiting the render, it removes the
/// prompt from ComfyUI on a background task and holds the in-flight slot
/// until that is done.
struct PendingRender {
    api: ComfyUIApi,
    prompt_id: String,
    slot: Option<OwnedSemaphorePermit>,
}

impl PendingRender {
    fn prompt_id(&self) -> &str {
        &self.prompt_id
    }

    /// ComfyUI reached a final state; nothing to remove.
    fn finish(mut self) {
        self.slot.take();
    }

    async fn remove(mut self) {
        remove_render(&self.api, &self.prompt_id).await;
        self.slot.take();
    }
}

impl Drop for PendingRender {
    fn drop(&mut self) {
        let Some(slot) = self.slot.take() else {
            return;
        };
        let api = self.api.clone();
        let prompt_id = std::mem::take(&mut self.prompt_id);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                tracing::warn!(prompt_id = %prompt_id, "Render abandoned, removing from ComfyUI");
                runtime.spawn(async move {
                    remove_render(&api, &prompt_id).await;
                    drop(slot);
                });
            }
            Err(_) => tracing::warn!(
                prompt_id = %prompt_id,
                "Render abandoned outside a runtime, left on the ComfyUI queue",
            ),
        }
    }
}

/// Drop the prompt from the queue, and stop it if it is already running.
async fn remove_render(api: &ComfyUIApi, prompt_id: &str) {
    if let Err(e) = api.cancel_execution(prompt_id).await {
        tracing::warn!(prompt_id, error = %e, "ComfyUI queue removal failed");
    }
    if let Err(e) = api.interrupt(prompt_id).await {
        tracing::warn!(prompt_id, error = %e, "ComfyUI interrupt failed");
    }
}

fn api_error(err: ComfyUIApiError) -> GenerationError {
    match err {
        ComfyUIApiError::Request(e) if e.is_timeout() => {
            GenerationError::Transport(format!("ComfyUI request timed out: {e}"))
        }
        ComfyUIApiError::Request(e) => GenerationError::Transport(e.to_string()),
        ComfyUIApiError::ApiError { status, body } => GenerationError::Upstream { status, body },
        ComfyUIApiError::Decode(msg) => GenerationError::InvalidResponse(msg),
    }
}
