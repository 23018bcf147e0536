//! Handlers that drive the pipeline: story, image and document requests.

use std::path::{Component, Path, PathBuf};

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use storyloom_core::artifact::{ArtifactDocument, GeneratedImage};
use storyloom_core::error::ValidationError;
use storyloom_core::prompt::{excerpt_prompt, DEFAULT_EXCERPT_WORDS};
use storyloom_core::scenario::Scenario;
use storyloom_imaging::ImageOptions;
use storyloom_pipeline::StoryOutcome;

use crate::config::ServerConfig;
use crate::error::AppResult;
use crate::middleware::auth::Caller;
use crate::response::DataResponse;
use crate::state::AppState;

/// URL prefix under which the artifact directory is served.
pub const ARTIFACTS_MOUNT: &str = "/artifacts";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /stories/generate`: a scenario plus an optional
/// title to save the result under.
#[derive(Debug, Deserialize)]
pub struct GenerateStoryRequest {
    #[serde(flatten)]
    pub scenario: Scenario,
    #[serde(default)]
    pub save_as: Option<String>,
}

/// Request body for `POST /images/generate`.
///
/// `prompt` wins when both are given; otherwise the opening words of
/// `story` become the prompt.
#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub story: Option<String>,
    #[serde(flatten)]
    pub options: ImageOptions,
}

/// Request body for `POST /documents`.
#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    #[serde(default)]
    pub text: String,
    /// Path of a previously generated image, as returned by
    /// `/images/generate` (filesystem `path` or served `url`).
    #[serde(default)]
    pub image_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    #[serde(flatten)]
    pub image: GeneratedImage,
    /// Where the image is served, relative to the server root.
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    #[serde(flatten)]
    pub document: ArtifactDocument,
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/stories/generate
pub async fn generate_story(
    caller: Caller,
    State(state): State<AppState>,
    Json(input): Json<GenerateStoryRequest>,
) -> AppResult<Json<DataResponse<StoryOutcome>>> {
    let save_as = input
        .save_as
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let outcome = state
        .pipeline
        .request_story(caller.id, &input.scenario, save_as)
        .await?;

    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/images/generate
pub async fn generate_image(
    caller: Caller,
    State(state): State<AppState>,
    Json(input): Json<GenerateImageRequest>,
) -> AppResult<Json<DataResponse<ImageResponse>>> {
    let prompt = image_prompt(input.prompt.as_deref(), input.story.as_deref())?;

    let image = state
        .pipeline
        .request_image(caller.id, &prompt, &input.options)
        .await?;
    let url = artifact_url(&state.config, &image.path);

    Ok(Json(DataResponse {
        data: ImageResponse { image, url },
    }))
}

/// POST /api/v1/documents
pub async fn create_document(
    caller: Caller,
    State(state): State<AppState>,
    Json(input): Json<CreateDocumentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<DocumentResponse>>)> {
    let image_path = input
        .image_path
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| resolve_image_path(&state.config, p))
        .transpose()?;
    let image_path = image_path.as_deref().map(|p| p.to_string_lossy());

    let document = state
        .pipeline
        .request_document(caller.id, &input.title, &input.text, image_path.as_deref())
        .await?;
    let url = artifact_url(&state.config, &document.path);

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: DocumentResponse { document, url },
        }),
    ))
}

// ---- private helpers ----

fn image_prompt(prompt: Option<&str>, story: Option<&str>) -> Result<String, ValidationError> {
    if let Some(prompt) = prompt.filter(|p| !p.trim().is_empty()) {
        return Ok(prompt.to_string());
    }
    if let Some(story) = story.filter(|s| !s.trim().is_empty()) {
        return Ok(excerpt_prompt(story, DEFAULT_EXCERPT_WORDS));
    }
    Err(ValidationError::new(
        "prompt",
        "either prompt or story is required",
    ))
}

/// Map a client-supplied image reference onto the image directory.
///
/// Accepts the filesystem path returned by image generation or its served
/// URL. Anything outside the image directory is rejected.
fn resolve_image_path(config: &ServerConfig, raw: &str) -> Result<PathBuf, ValidationError> {
    let path = match raw.strip_prefix(ARTIFACTS_MOUNT).and_then(|r| r.strip_prefix('/')) {
        Some(relative) => config.artifact_dir.join(relative),
        None => PathBuf::from(raw),
    };

    let escapes = path.components().any(|c| matches!(c, Component::ParentDir));
    if escapes || !path.starts_with(config.image_dir()) {
        return Err(ValidationError::new(
            "image_path",
            "must reference a generated image",
        ));
    }
    Ok(path)
}

/// Served URL for an artifact written under the artifact directory.
fn artifact_url(config: &ServerConfig, path: &str) -> Option<String> {
    let relative = Path::new(path).strip_prefix(&config.artifact_dir).ok()?;
    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(format!("{ARTIFACTS_MOUNT}/{}", segments.join("/")))
}
