use std::future::Future;
use std::time::Duration;

use storyloom_core::error::{GenerationError, GenerationStage};

/// Default bound on story generation.
pub const DEFAULT_TEXT_TIMEOUT_SECS: u64 = 120;

/// Default bound on image generation.
pub const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 600;

/// Slack the image stage allows beyond the backend's own render deadline,
/// covering the wait for an inference slot and the removal of a timed-out
/// render.
pub const IMAGE_STAGE_GRACE_SECS: u64 = 30;

/// Upper bounds on the two model-backed stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimeouts {
    pub text: Duration,
    pub image: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self::from_secs(DEFAULT_TEXT_TIMEOUT_SECS, DEFAULT_IMAGE_TIMEOUT_SECS)
    }
}

impl StageTimeouts {
    pub fn from_secs(text: u64, image: u64) -> Self {
        Self {
            text: Duration::from_secs(text),
            image: Duration::from_secs(image),
        }
    }

    /// Bounds for a diffusion backend that enforces `render_secs` itself.
    ///
    /// The image stage outlasts the backend deadline, so the backend's own
    /// timeout (which removes the render) fires first.
    pub fn with_render_deadline(text_secs: u64, render_secs: u64) -> Self {
        Self::from_secs(text_secs, render_secs.saturating_add(IMAGE_STAGE_GRACE_SECS))
    }

    fn limit(&self, stage: GenerationStage) -> Duration {
        match stage {
            GenerationStage::Text => self.text,
            GenerationStage::Image => self.image,
        }
    }

    /// Run a stage future under its bound. Expiry drops the future and
    /// yields [`GenerationError::Timeout`].
    pub async fn run<T, F>(&self, stage: GenerationStage, fut: F) -> Result<T, GenerationError>
    where
        F: Future<Output = Result<T, GenerationError>>,
    {
        let limit = self.limit(stage);
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout {
                stage,
                secs: limit.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn fast_stage_passes_through() {
        let timeouts = StageTimeouts::default();
        let out = timeouts
            .run(GenerationStage::Text, async { Ok::<_, GenerationError>(7) })
            .await
            .unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn slow_stage_times_out_with_its_stage() {
        let timeouts = StageTimeouts {
            text: Duration::from_secs(60),
            image: Duration::from_millis(20),
        };
        let err = timeouts
            .run(GenerationStage::Image, async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, GenerationError>(())
            })
            .await
            .unwrap_err();
        assert_matches!(
            err,
            GenerationError::Timeout {
                stage: GenerationStage::Image,
                ..
            }
        );
    }

    #[test]
    fn image_stage_outlasts_backend_render_deadline() {
        let t = StageTimeouts::with_render_deadline(120, 600);
        assert_eq!(t.text, Duration::from_secs(120));
        assert!(t.image > Duration::from_secs(600));
        assert_eq!(t.image, Duration::from_secs(600 + IMAGE_STAGE_GRACE_SECS));
    }

    #[test]
    fn defaults_match_stage_profiles() {
        let t = StageTimeouts::default();
        assert_eq!(t.text, Duration::from_secs(120));
        assert_eq!(t.image, Duration::from_secs(600));
    }
}
