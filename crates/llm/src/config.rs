/// Default completion endpoint (AI71, OpenAI-compatible).
pub const DEFAULT_BASE_URL: &str = "https://api.ai71.ai/v1";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "tiiuae/falcon-180B-chat";

/// Default bound on a single completion call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Completion client configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL up to and including the API version, without trailing slash.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Optional `max_tokens` sent with every request.
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var             | Required | Default                    |
    /// |---------------------|----------|----------------------------|
    /// | `LLM_API_KEY`       | **yes**  | --                         |
    /// | `LLM_BASE_URL`      | no       | `https://api.ai71.ai/v1`   |
    /// | `LLM_MODEL`         | no       | `tiiuae/falcon-180B-chat`  |
    /// | `LLM_MAX_TOKENS`    | no       | unset                      |
    /// | `TEXT_TIMEOUT_SECS` | no       | `120`                      |
    ///
    /// # Panics
    ///
    /// Panics if `LLM_API_KEY` is missing or a numeric variable does not parse.
    pub fn from_env() -> Self {
        let api_key = std::env::var("LLM_API_KEY").expect("LLM_API_KEY must be set");

        let base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.into())
            .trim_end_matches('/')
            .to_string();

        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());

        let max_tokens = std::env::var("LLM_MAX_TOKENS").ok().map(|v| {
            v.parse()
                .expect("LLM_MAX_TOKENS must be a valid u32")
        });

        let timeout_secs: u64 = std::env::var("TEXT_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("TEXT_TIMEOUT_SECS must be a valid u64");

        Self {
            base_url,
            api_key,
            model,
            max_tokens,
            timeout_secs,
        }
    }
}
