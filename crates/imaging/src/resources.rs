//! Process-scoped holder for diffusion model resources.
//!
//! The model is loaded at most once, either eagerly through
//! [`DiffusionResources::warm`] or lazily by the first
//! [`acquire`](DiffusionResources::acquire). Inference access is gated by a
//! semaphore. [`shutdown`](DiffusionResources::shutdown) closes the gate and
//! unloads the model; later acquisitions fail.

use std::ops::Deref;
use std::sync::Arc;

use storyloom_core::error::GenerationError;
use tokio::sync::{OnceCell, Semaphore, SemaphorePermit};

use crate::model::DiffusionModel;

/// Shared, load-once access to a [`DiffusionModel`].
pub struct DiffusionResources {
    model: Arc<dyn DiffusionModel>,
    loaded: OnceCell<()>,
    permits: Semaphore,
}

/// Exclusive use of the model for the lifetime of the lease.
pub struct ModelLease<'a> {
    model: &'a (dyn DiffusionModel + 'static),
    _permit: SemaphorePermit<'a>,
}

impl Deref for ModelLease<'_> {
    type Target = dyn DiffusionModel;

    fn deref(&self) -> &Self::Target {
        self.model
    }
}

impl DiffusionResources {
    /// Wrap a model, allowing `max_concurrency` simultaneous leases.
    pub fn new(model: Arc<dyn DiffusionModel>, max_concurrency: usize) -> Self {
        Self {
            model,
            loaded: OnceCell::new(),
            permits: Semaphore::new(max_concurrency.max(1)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// Load the model now rather than on first use.
    pub async fn warm(&self) -> Result<(), GenerationError> {
        self.ensure_loaded().await
    }

    /// Wait for a free inference slot, loading the model first if needed.
    pub async fn acquire(&self) -> Result<ModelLease<'_>, GenerationError> {
        self.ensure_loaded().await?;
        let permit = self.permits.acquire().await.map_err(|_| {
            GenerationError::ModelLoad("diffusion resources have been shut down".into())
        })?;
        Ok(ModelLease {
            model: self.model.as_ref(),
            _permit: permit,
        })
    }

    /// Refuse new leases and release model resources.
    ///
    /// Leases already handed out finish normally.
    pub async fn shutdown(&self) {
        self.permits.close();
        if self.is_loaded() {
            if let Err(e) = self.model.unload().await {
                tracing::warn!(model = self.model.name(), error = %e, "Diffusion unload failed");
            }
        }
        tracing::info!(model = self.model.name(), "Diffusion resources shut down");
    }

    // ---- private helpers ----

    async fn ensure_loaded(&self) -> Result<(), GenerationError> {
        if self.permits.is_closed() {
            return Err(GenerationError::ModelLoad(
                "diffusion resources have been shut down".into(),
            ));
        }
        self.loaded
            .get_or_try_init(|| async {
                let start = std::time::Instant::now();
                self.model.load().await?;
                tracing::info!(
                    model = self.model.name(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Diffusion model loaded",
                );
                Ok::<(), GenerationError>(())
            })
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::model::GenerateRequest;

    #[derive(Default)]
    struct CountingModel {
        loads: AtomicUsize,
        unloads: AtomicUsize,
        fail_load: bool,
    }

    #[async_trait]
    impl DiffusionModel for CountingModel {
        fn name(&self) -> &str {
            "counting"
        }

        async fn load(&self) -> Result<(), GenerationError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_load {
                return Err(GenerationError::ModelLoad("weights missing".into()));
            }
            Ok(())
        }

        async fn unload(&self) -> Result<(), GenerationError> {
            self.unloads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn generate(&self, _request: &GenerateRequest) -> Result<Vec<u8>, GenerationError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn loads_lazily_and_once() {
        let model = Arc::new(CountingModel::default());
        let resources = DiffusionResources::new(model.clone(), 2);
        assert!(!resources.is_loaded());

        drop(resources.acquire().await.unwrap());
        drop(resources.acquire().await.unwrap());
        resources.warm().await.unwrap();

        assert!(resources.is_loaded());
        assert_eq!(model.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_is_retried_on_next_use() {
        let model = Arc::new(CountingModel {
            fail_load: true,
            ..Default::default()
        });
        let resources = DiffusionResources::new(model.clone(), 1);

        assert_matches!(resources.warm().await, Err(GenerationError::ModelLoad(_)));
        assert!(resources.acquire().await.is_err());
        assert_eq!(model.loads.load(Ordering::SeqCst), 2);
        assert!(!resources.is_loaded());
    }

    #[tokio::test]
    async fn single_permit_serialises_leases() {
        let resources = DiffusionResources::new(Arc::new(CountingModel::default()), 1);
        let held = resources.acquire().await.unwrap();

        let second = tokio::time::timeout(Duration::from_millis(50), resources.acquire()).await;
        assert!(second.is_err(), "second lease must wait for the first");

        drop(held);
        assert!(resources.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn shutdown_unloads_and_refuses_new_leases() {
        let model = Arc::new(CountingModel::default());
        let resources = DiffusionResources::new(model.clone(), 1);
        resources.warm().await.unwrap();

        resources.shutdown().await;

        assert_eq!(model.unloads.load(Ordering::SeqCst), 1);
        assert_matches!(
            resources.acquire().await.err(),
            Some(GenerationError::ModelLoad(_))
        );
    }
}
