use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use storyloom_core::error::{CompositionError, CoreError, GenerationError, ValidationError};

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain error taxonomy and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A store or auth error from `storyloom_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Malformed request input caught before any stage ran.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A failed text or image stage.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A failed document composition.
    #[error(transparent)]
    Composition(#[from] CompositionError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::Validation(errors.to_string()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Internal(msg) => internal(msg),
            },

            AppError::Validation(err) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
            }

            AppError::Generation(err) => classify_generation_error(err),

            AppError::Composition(err) => classify_composition_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

// ---- private helpers ----

fn internal(msg: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %msg, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Classify a stage failure.
///
/// - Bad input maps to 400.
/// - Rate limits map to 429, timeouts to 504, an unreachable model to 503.
/// - Every other remote failure maps to 502.
/// - Local I/O failures map to a sanitised 500.
fn classify_generation_error(err: &GenerationError) -> (StatusCode, &'static str, String) {
    match err {
        GenerationError::Invalid(v) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", v.to_string()),
        GenerationError::RateLimited { .. } => {
            (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", err.to_string())
        }
        GenerationError::Timeout { .. } => {
            (StatusCode::GATEWAY_TIMEOUT, "GENERATION_TIMEOUT", err.to_string())
        }
        GenerationError::ModelLoad(_) => {
            tracing::error!(error = %err, "Model unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "MODEL_UNAVAILABLE",
                err.to_string(),
            )
        }
        GenerationError::Transport(_)
        | GenerationError::Auth(_)
        | GenerationError::Upstream { .. }
        | GenerationError::InvalidResponse(_)
        | GenerationError::Generation(_) => {
            tracing::warn!(error = %err, "Generation failed");
            (StatusCode::BAD_GATEWAY, "GENERATION_FAILED", err.to_string())
        }
        GenerationError::Io(e) => internal(&e.to_string()),
    }
}

/// Classify a composition failure. Problems with the referenced image are
/// the caller's to fix; rendering and write failures are ours.
fn classify_composition_error(err: &CompositionError) -> (StatusCode, &'static str, String) {
    match err {
        CompositionError::Invalid(v) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", v.to_string())
        }
        CompositionError::MissingImage { .. } | CompositionError::ImageDecode { .. } => {
            (StatusCode::BAD_REQUEST, "COMPOSITION_FAILED", err.to_string())
        }
        CompositionError::Render(_) | CompositionError::Io(_) => {
            tracing::error!(error = %err, "Document composition failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMPOSITION_FAILED",
                "Document composition failed".to_string(),
            )
        }
    }
}
