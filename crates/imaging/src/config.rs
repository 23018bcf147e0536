use serde::{Deserialize, Serialize};
use storyloom_core::error::CoreError;

/// Whether the prompt is tokenized and encoded before generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingMode {
    /// The raw prompt goes straight to generation.
    #[default]
    Raw,
    /// Tokenize, encode, then generate from the resulting conditioning.
    Conditioned,
}

impl EmbeddingMode {
    /// Parse from a configuration value (`"raw"` or `"conditioned"`).
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "conditioned" => Ok(Self::Conditioned),
            other => Err(CoreError::Validation(format!(
                "Unknown embedding mode '{other}'. Must be one of: raw, conditioned"
            ))),
        }
    }
}

/// Diffusion backend configuration.
#[derive(Debug, Clone)]
pub struct DiffusionConfig {
    /// ComfyUI base URL, without trailing slash.
    pub comfyui_url: String,
    /// Checkpoint used for the default model name.
    pub checkpoint: String,
    pub steps: u32,
    pub cfg: f32,
    pub embedding_mode: EmbeddingMode,
    /// Number of concurrent inference calls allowed.
    pub max_concurrency: usize,
    /// Load the model at startup instead of on first use.
    pub warm_on_start: bool,
    /// Upper bound on a single render, queue time included.
    pub timeout_secs: u64,
    /// Delay between history polls.
    pub poll_interval_ms: u64,
    /// Bound on each HTTP call to ComfyUI (submit, poll, download, cancel).
    pub request_timeout_secs: u64,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            comfyui_url: "http://127.0.0.1:8188".to_string(),
            checkpoint: "v1-5-pruned-emaonly.safetensors".to_string(),
            steps: 20,
            cfg: 7.0,
            embedding_mode: EmbeddingMode::Raw,
            max_concurrency: 1,
            warm_on_start: false,
            timeout_secs: 600,
            poll_interval_ms: 500,
            request_timeout_secs: 30,
        }
    }
}

impl DiffusionConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                          | Required | Default                           |
    /// |----------------------------------|----------|-----------------------------------|
    /// | `COMFYUI_URL`                    | no       | `http://127.0.0.1:8188`           |
    /// | `DIFFUSION_CHECKPOINT`           | no       | `v1-5-pruned-emaonly.safetensors` |
    /// | `DIFFUSION_STEPS`                | no       | `20`                              |
    /// | `DIFFUSION_CFG`                  | no       | `7.0`                             |
    /// | `DIFFUSION_EMBEDDING_MODE`       | no       | `raw`                             |
    /// | `DIFFUSION_MAX_CONCURRENCY`      | no       | `1`                               |
    /// | `DIFFUSION_WARM_ON_START`        | no       | `false`                           |
    /// | `DIFFUSION_POLL_INTERVAL_MS`     | no       | `500`                             |
    /// | `DIFFUSION_REQUEST_TIMEOUT_SECS` | no       | `30`                              |
    /// | `IMAGE_TIMEOUT_SECS`             | no       | `600`                             |
    ///
    /// # Panics
    ///
    /// Panics if a variable is set to a value that does not parse.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let comfyui_url = std::env::var("COMFYUI_URL")
            .unwrap_or(defaults.comfyui_url)
            .trim_end_matches('/')
            .to_string();

        let checkpoint = std::env::var("DIFFUSION_CHECKPOINT").unwrap_or(defaults.checkpoint);

        let steps: u32 = std::env::var("DIFFUSION_STEPS")
            .map(|v| v.parse().expect("DIFFUSION_STEPS must be a valid u32"))
            .unwrap_or(defaults.steps);

        let cfg: f32 = std::env::var("DIFFUSION_CFG")
            .map(|v| v.parse().expect("DIFFUSION_CFG must be a valid number"))
            .unwrap_or(defaults.cfg);

        let embedding_mode = std::env::var("DIFFUSION_EMBEDDING_MODE")
            .map(|v| {
                EmbeddingMode::from_name(&v)
                    .expect("DIFFUSION_EMBEDDING_MODE must be 'raw' or 'conditioned'")
            })
            .unwrap_or(defaults.embedding_mode);

        let max_concurrency: usize = std::env::var("DIFFUSION_MAX_CONCURRENCY")
            .map(|v| {
                v.parse()
                    .expect("DIFFUSION_MAX_CONCURRENCY must be a valid usize")
            })
            .unwrap_or(defaults.max_concurrency);
        assert!(
            max_concurrency > 0,
            "DIFFUSION_MAX_CONCURRENCY must be at least 1"
        );

        let warm_on_start = std::env::var("DIFFUSION_WARM_ON_START")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.warm_on_start);

        let poll_interval_ms: u64 = std::env::var("DIFFUSION_POLL_INTERVAL_MS")
            .map(|v| {
                v.parse()
                    .expect("DIFFUSION_POLL_INTERVAL_MS must be a valid u64")
            })
            .unwrap_or(defaults.poll_interval_ms);

        let request_timeout_secs: u64 = std::env::var("DIFFUSION_REQUEST_TIMEOUT_SECS")
            .map(|v| {
                v.parse()
                    .expect("DIFFUSION_REQUEST_TIMEOUT_SECS must be a valid u64")
            })
            .unwrap_or(defaults.request_timeout_secs);

        let timeout_secs: u64 = std::env::var("IMAGE_TIMEOUT_SECS")
            .map(|v| v.parse().expect("IMAGE_TIMEOUT_SECS must be a valid u64"))
            .unwrap_or(defaults.timeout_secs);

        Self {
            comfyui_url,
            checkpoint,
            steps,
            cfg,
            embedding_mode,
            max_concurrency,
            warm_on_start,
            timeout_secs,
            poll_interval_ms,
            request_timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_mode_parses_known_names() {
        assert_eq!(EmbeddingMode::from_name("raw").unwrap(), EmbeddingMode::Raw);
        assert_eq!(
            EmbeddingMode::from_name(" Conditioned ").unwrap(),
            EmbeddingMode::Conditioned
        );
        assert!(EmbeddingMode::from_name("clip").is_err());
    }

    #[test]
    fn defaults_serialise_inference() {
        let config = DiffusionConfig::default();
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.embedding_mode, EmbeddingMode::Raw);
        assert!(!config.warm_on_start);
    }
}
