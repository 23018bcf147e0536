use std::net::SocketAddr;
use std::sync::Arc;

use storyloom_core::store::{InMemoryStore, StoryStore, UserDirectory};
use storyloom_document::Compositor;
use storyloom_imaging::{ComfyUiDiffusion, DiffusionConfig, DiffusionResources, ImageGenerator};
use storyloom_llm::{CompletionClient, LlmConfig, StoryWriter};
use storyloom_pipeline::{StageTimeouts, StoryPipeline};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storyloom_api::config::ServerConfig;
use storyloom_api::router::build_app_router;
use storyloom_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "storyloom_api=debug,storyloom_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let llm_config = LlmConfig::from_env();
    let diffusion_config = DiffusionConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        artifact_dir = %config.artifact_dir.display(),
        llm_model = %llm_config.model,
        comfyui_url = %diffusion_config.comfyui_url,
        "Loaded configuration",
    );

    // --- Story store ---
    let (stories, users, pool) = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = storyloom_db::create_pool(&database_url)
                .await
                .expect("Failed to connect to database");
            storyloom_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            storyloom_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database ready, migrations applied");

            let store = Arc::new(storyloom_db::PgStore::new(pool.clone()));
            let stories: Arc<dyn StoryStore> = store.clone();
            let users: Arc<dyn UserDirectory> = store;
            (stories, users, Some(pool))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using in-memory story store");
            let store = Arc::new(InMemoryStore::new());
            let stories: Arc<dyn StoryStore> = store.clone();
            let users: Arc<dyn UserDirectory> = store;
            (stories, users, None)
        }
    };

    // --- Text stage ---
    let completion =
        CompletionClient::new(&llm_config).expect("Failed to build completion client");
    let writer = Arc::new(StoryWriter::new(Arc::new(completion)));

    // --- Image stage ---
    let comfyui =
        ComfyUiDiffusion::new(&diffusion_config).expect("Failed to build ComfyUI client");
    let resources = Arc::new(DiffusionResources::new(
        Arc::new(comfyui),
        diffusion_config.max_concurrency,
    ));
    if diffusion_config.warm_on_start {
        match resources.warm().await {
            Ok(()) => tracing::info!("Diffusion model loaded"),
            Err(e) => {
                tracing::warn!(error = %e, "Diffusion warm-up failed, will retry on first use")
            }
        }
    }
    let images = Arc::new(ImageGenerator::new(
        Arc::clone(&resources),
        diffusion_config.embedding_mode,
        config.image_dir(),
    ));

    // --- Pipeline ---
    let compositor = Compositor::new(config.document_dir(), config.document_naming);
    let timeouts = StageTimeouts::with_render_deadline(
        llm_config.timeout_secs,
        diffusion_config.timeout_secs,
    );
    let pipeline = StoryPipeline::new(writer, images, compositor, timeouts)
        .with_store(Arc::clone(&stories));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        stories,
        users,
        pipeline: Arc::new(pipeline),
        pool,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, releasing model resources");
    resources.shutdown().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C, starting graceful shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
