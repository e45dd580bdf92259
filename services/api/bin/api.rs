//! Main Entrypoint for the Tutor API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Loading the course catalog and prompt templates.
//! 3. Initializing the tutor, score recorder and session store.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use std::{collections::HashMap, fs, net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};
use tutor_api::{
    config::{Config, Provider},
    progress::ProgressStore,
    router::create_router,
    state::AppState,
};
use tutor_core::{
    DialogueEngine,
    catalog::ContentCatalog,
    score::JsonScoreRecorder,
    store::SessionStore,
    tutor::{ExplanationService, LLMTutorService, MockTutorService, QuizService},
};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

/// A helper function to load prompts from a directory.
fn load_prompts(prompts_path: &std::path::Path) -> anyhow::Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    let entries = std::fs::read_dir(prompts_path)
        .with_context(|| format!("Failed to read prompts from {}", prompts_path.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)?;
            prompts.insert(prompt_key, content);
        }
    }
    Ok(prompts)
}

/// Periodically drops idle sessions from the store.
fn spawn_session_sweeper(sessions: Arc<SessionStore>) {
    let Some(ttl) = sessions.ttl() else {
        return;
    };
    let period = (ttl / 4).max(std::time::Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let evicted = sessions.evict_expired().await;
            if evicted > 0 {
                debug!(evicted, "Session sweep finished");
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Load Course Catalog ---
    let catalog = Arc::new(ContentCatalog::load(&config.courses_path)?);
    info!(courses = ?catalog.courses(), "Course catalog loaded.");

    // --- 4. Initialize Shared Services ---
    let (explainer, quizzer): (Arc<dyn ExplanationService>, Arc<dyn QuizService>) =
        match (config.provider.api_base(), &config.api_key) {
            (Some(api_base), Some(api_key)) => {
                info!(provider = ?config.provider, "Using LLM tutor.");
                let prompts = load_prompts(&config.prompts_path)?;
                let openai_config = OpenAIConfig::new()
                    .with_api_key(api_key)
                    .with_api_base(api_base);
                let tutor = Arc::new(LLMTutorService::new(
                    openai_config,
                    config.chat_model.clone(),
                    prompts,
                ));
                (tutor.clone(), tutor)
            }
            _ => {
                info!("Using mock tutor.");
                let tutor = Arc::new(MockTutorService::default());
                (tutor.clone(), tutor)
            }
        };

    let sessions = Arc::new(match config.session_ttl {
        Some(ttl) => SessionStore::with_ttl(ttl),
        None => SessionStore::new(),
    });
    spawn_session_sweeper(sessions.clone());

    let engine = DialogueEngine::new(
        catalog.clone(),
        explainer,
        quizzer,
        Arc::new(JsonScoreRecorder::new(&config.scores_path)),
        sessions,
    )
    .with_call_timeout(config.llm_timeout);

    let app_state = Arc::new(AppState {
        engine: Arc::new(engine),
        catalog,
        progress: Arc::new(ProgressStore::open(&config.progress_path)),
    });

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 6. Start Server ---
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
