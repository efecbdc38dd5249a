//! TrendPanel Backend
//!
//! Admin backend for the settings and subscriptions files of a keyword-monitoring
//! webhook push service, with session login and a trigger for the push process.

mod api;
mod auth;
mod config;
mod errors;
mod models;
mod runner;
mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::{CredentialVerifier, SessionStore, StaticCredentials};
use config::Config;
use runner::PushRunner;
use store::{JsonSubscriptionStore, YamlConfigStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config_store: Arc<YamlConfigStore>,
    pub subscription_store: Arc<JsonSubscriptionStore>,
    /// Serializes saves of the settings file
    pub config_lock: Arc<Mutex<()>>,
    /// Serializes saves of the subscriptions file
    pub subscriptions_lock: Arc<Mutex<()>>,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub sessions: Arc<SessionStore>,
    pub runner: Option<Arc<PushRunner>>,
}

impl AppState {
    pub fn new(config: &Config, credentials: Arc<dyn CredentialVerifier>) -> Self {
        let runner = PushRunner::from_command_line(&config.push_command, &config.push_workdir)
            .map(Arc::new);

        Self {
            config_store: Arc::new(YamlConfigStore::new(&config.config_path)),
            subscription_store: Arc::new(JsonSubscriptionStore::new(&config.subscriptions_path)),
            config_lock: Arc::new(Mutex::new(())),
            subscriptions_lock: Arc::new(Mutex::new(())),
            credentials,
            sessions: Arc::new(SessionStore::new()),
            runner,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TrendPanel Backend");
    tracing::info!("Bind address: {}:{}", config.host, config.port);

    let credentials = StaticCredentials::from_passwords(
        config.admin_password.as_deref(),
        config.user_password.as_deref(),
    );
    if config.admin_password.is_none() {
        tracing::warn!("ADMIN_PASSWORD not set, the admin account is disabled");
    }
    if config.user_password.is_none() {
        tracing::warn!("USER_PASSWORD not set, the user account is disabled");
    }
    if credentials.is_empty() {
        tracing::warn!("No accounts configured, nobody can log in!");
    }

    let state = AppState::new(&config, Arc::new(credentials));

    tracing::info!(
        "Settings path: {:?} (backup {:?})",
        state.config_store.path(),
        state.config_store.backup_path()
    );
    tracing::info!(
        "Subscriptions path: {:?} (backup {:?})",
        state.subscription_store.path(),
        state.subscription_store.backup_path()
    );

    match &state.runner {
        Some(runner) => tracing::info!(
            "Push command: {} (in {:?})",
            runner.program(),
            runner.workdir()
        ),
        None => tracing::warn!("PUSH_COMMAND is blank, /api/execute is disabled"),
    }

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_target()).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Login state, no guard
    let session_routes = Router::new()
        .route("/login", post(api::login))
        .route("/logout", post(api::logout))
        .route("/check_login", get(api::check_login));

    // Settings are admin-only
    let admin_routes = Router::new()
        .route("/config", get(api::get_config).post(api::update_config))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    // Any logged-in user
    let user_routes = Router::new()
        .route(
            "/subscriptions",
            get(api::get_subscriptions).post(api::update_subscriptions),
        )
        .route(
            "/subscriptions/validate",
            post(api::validate_subscriptions),
        )
        .route("/execute", post(api::execute))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_login,
        ));

    let api_routes = session_routes.merge(admin_routes).merge(user_routes);

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
