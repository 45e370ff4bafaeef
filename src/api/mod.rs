//! REST API.
//!
//! All resource routes live under `/api/v1` and speak JSON. Authenticated
//! routes take an [`AuthUser`] extractor that resolves the bearer token.

pub mod ai;
pub mod auth;
pub mod context;
pub mod extract;
pub mod tasks;

pub use extract::AuthUser;

use axum::{
    Json, Router,
    extract::State,
    http::HeaderValue,
    routing::{get, post},
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::ai::{GeminiClient, LanguageModel, SuggestionService};
use crate::auth::{AuthService, TokenService};
use crate::config::{Config, ServerConfig};
use crate::db::Database;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: AuthService,
    pub suggestions: SuggestionService,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire services together with an explicit (possibly absent) model.
    pub fn new(config: Config, db: Database, model: Option<Arc<dyn LanguageModel>>) -> Self {
        let tokens = TokenService::new(
            &config.auth.secret_key,
            config.auth.access_token_expire_minutes,
        );
        let auth = AuthService::new(db.clone(), tokens, config.auth.bcrypt_cost);
        let suggestions = SuggestionService::new(db.clone(), model);
        Self {
            db,
            auth,
            suggestions,
            config: Arc::new(config),
        }
    }

    /// Build state using the configured Gemini client, if any.
    pub fn from_config(config: Config, db: Database) -> anyhow::Result<Self> {
        let model = GeminiClient::from_config(&config.ai)?
            .map(|client| Arc::new(client) as Arc<dyn LanguageModel>);
        if let Some(model) = &model {
            info!(model = model.model_name(), "Language model configured");
        }
        Ok(Self::new(config, db, model))
    }
}

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
    version: &'static str,
    health: &'static str,
    api: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Welcome to Productivity Tracker API",
        version: env!("CARGO_PKG_VERSION"),
        health: "/health",
        api: "/api/v1",
    })
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    api: String,
    environment: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        api: format!("Productivity Tracker API v{}", env!("CARGO_PKG_VERSION")),
        environment: state.config.server.environment.clone(),
    })
}

/// Any origin in development, otherwise the configured list.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if server.is_development() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/logout", post(auth::logout))
        // Tasks
        .route(
            "/api/v1/tasks",
            get(tasks::list_tasks).post(tasks::create_task),
        )
        .route("/api/v1/tasks/stats/overview", get(tasks::stats_overview))
        .route(
            "/api/v1/tasks/{task_id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        // Context
        .route(
            "/api/v1/context",
            get(context::get_context)
                .put(context::update_context)
                .delete(context::clear_context),
        )
        .route("/api/v1/context/profile", get(context::profile))
        .route(
            "/api/v1/context/guidelines/best-practices",
            get(context::guidelines),
        )
        .route("/api/v1/context/validate", post(context::validate))
        // AI suggestions
        .route("/api/v1/ai/suggest", post(ai::suggest))
        .route("/api/v1/ai/suggest-and-create", post(ai::suggest_and_create))
        .route("/api/v1/ai/health", get(ai::health))
        .route("/api/v1/ai/examples", get(ai::examples))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve in the background.
///
/// Returns a oneshot sender that triggers graceful shutdown, the address
/// actually bound (port 0 picks a free one), and the serving task.
pub async fn start_server(
    state: AppState,
    addr: SocketAddr,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr, tokio::task::JoinHandle<()>)> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("API server listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            })
            .await
        {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr, handle))
}
