#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use storyloom_api::auth::jwt::JwtConfig;
use storyloom_api::config::ServerConfig;
use storyloom_api::router::build_app_router;
use storyloom_api::state::AppState;
use storyloom_core::error::GenerationError;
use storyloom_core::naming::DocumentNaming;
use storyloom_core::store::InMemoryStore;
use storyloom_document::Compositor;
use storyloom_imaging::{
    DiffusionModel, DiffusionResources, EmbeddingMode, GenerateRequest, ImageGenerator,
};
use storyloom_llm::{ChatCompletion, ChatMessage, CompletionError, StoryWriter};
use storyloom_pipeline::{StageTimeouts, StoryPipeline};
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Stub model backends
// ---------------------------------------------------------------------------

/// Echoes the user prompt back as the story. Prompts mentioning "dragon"
/// produce a reply the moderation gate refuses.
pub struct EchoCompletion;

#[async_trait]
impl ChatCompletion for EchoCompletion {
    fn model(&self) -> &str {
        "echo"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        let prompt = &messages[messages.len() - 1].content;
        if prompt.contains("dragon") {
            return Ok("Something Inappropriate happened.".to_string());
        }
        Ok(format!("Once upon a time. {prompt}"))
    }
}

/// Always answers 503.
pub struct UnavailableCompletion;

#[async_trait]
impl ChatCompletion for UnavailableCompletion {
    fn model(&self) -> &str {
        "unavailable"
    }

    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, CompletionError> {
        Err(CompletionError::ApiError {
            status: 503,
            body: "overloaded".to_string(),
        })
    }
}

/// Renders a solid grey PNG of the requested size.
pub struct GreyCanvas;

#[async_trait]
impl DiffusionModel for GreyCanvas {
    fn name(&self) -> &str {
        "grey"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<u8>, GenerationError> {
        let canvas = image::RgbImage::from_pixel(
            request.width,
            request.height,
            image::Rgb([128, 128, 128]),
        );
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(canvas)
            .write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| GenerationError::Generation(e.to_string()))?;
        Ok(out.into_inner())
    }
}

/// A backend that can never be reached.
pub struct OfflineDiffusion;

#[async_trait]
impl DiffusionModel for OfflineDiffusion {
    fn name(&self) -> &str {
        "offline"
    }

    async fn load(&self) -> Result<(), GenerationError> {
        Err(GenerationError::ModelLoad("connection refused".to_string()))
    }

    async fn generate(&self, _request: &GenerateRequest) -> Result<Vec<u8>, GenerationError> {
        Err(GenerationError::Generation("not loaded".to_string()))
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// A router over an in-memory store, writing artifacts to a temp dir that
/// lives as long as this value.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub artifacts: TempDir,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build a test `ServerConfig` rooted at `artifacts`.
pub fn test_config(artifacts: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        artifact_dir: artifacts.path().to_path_buf(),
        document_naming: DocumentNaming::Title,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Build the full application with working stub backends.
pub fn build_test_app() -> TestApp {
    build_test_app_with(Arc::new(EchoCompletion), Arc::new(GreyCanvas))
}

/// Build the full application over the given backends, through the same
/// router builder the binary uses.
pub fn build_test_app_with(
    completion: Arc<dyn ChatCompletion>,
    model: Arc<dyn DiffusionModel>,
) -> TestApp {
    let artifacts = TempDir::new().expect("temp dir");
    let config = test_config(&artifacts);

    let store = Arc::new(InMemoryStore::new());
    let writer = Arc::new(StoryWriter::new(completion));
    let images = Arc::new(ImageGenerator::new(
        Arc::new(DiffusionResources::new(model, 1)),
        EmbeddingMode::Raw,
        config.image_dir(),
    ));
    let compositor = Compositor::new(config.document_dir(), config.document_naming);
    let pipeline = StoryPipeline::new(writer, images, compositor, StageTimeouts::default())
        .with_store(store.clone());

    let state = AppState {
        config: Arc::new(config.clone()),
        stories: store.clone(),
        users: store,
        pipeline: Arc::new(pipeline),
        pool: None,
    };

    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
        artifacts,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
        .to_vec()
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::get(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::delete(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Register `username` through the API and return a fresh access token.
pub async fn register_and_login(app: &Router, username: &str) -> String {
    let credentials = serde_json::json!({ "username": username, "password": "password123" });

    let response = post_json(app.clone(), "/api/v1/auth/register", credentials.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(app.clone(), "/api/v1/auth/login", credentials).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["access_token"]
        .as_str()
        .expect("access_token should be a string")
        .to_string()
}
