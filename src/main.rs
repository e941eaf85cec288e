//! ToolHub Backend
//!
//! A REST backend for the ToolHub AI tool catalog: SQLite persistence for
//! tools, categories and roles, with identity and blob storage delegated to
//! external services.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod storage;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::{guards, IdentityProvider, SessionGateway};
use auth::provider::RestIdentityProvider;
use config::Config;
use db::{Repository, RoleStore};
use storage::{BlobStore, RestBlobStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub roles: Arc<RoleStore>,
    pub gateway: Arc<SessionGateway>,
    pub provider: Arc<dyn IdentityProvider>,
    pub blobs: Arc<dyn BlobStore>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ToolHub Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Identity provider: {}", config.auth_api_url);

    if config.auth_api_key.is_empty() {
        tracing::warn!("No identity provider API key configured (TOOLHUB_AUTH_API_KEY)");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool.clone()));
    let roles = Arc::new(RoleStore::new(pool));

    // Seed the default category set on an empty collection
    repo.bootstrap_default_categories().await?;

    // External collaborators
    let provider: Arc<dyn IdentityProvider> = Arc::new(RestIdentityProvider::new(
        config.auth_api_url.clone(),
        config.auth_api_key.clone(),
    ));
    let blobs: Arc<dyn BlobStore> = Arc::new(RestBlobStore::new(config.blob_store_url.clone()));

    // Session gateway, driven by the provider's change stream for the
    // lifetime of the process
    let gateway = Arc::new(SessionGateway::new(provider.clone(), roles.clone()));
    tokio::spawn(gateway.clone().run());

    // Create application state
    let state = AppState {
        repo,
        roles,
        gateway,
        provider,
        blobs,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

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

    // Clone collaborators for the admin guard layer
    let provider = state.provider.clone();
    let roles = state.roles.clone();

    // Admin routes: bearer token verified at the provider, admin role
    // re-checked at the store on every request
    let admin_routes = Router::new()
        .route("/tools", post(api::create_tool))
        .route("/tools/{id}", put(api::update_tool))
        .route("/tools/{id}", delete(api::delete_tool))
        .route("/tools/{id}/logo", post(api::upload_tool_logo))
        .route(
            "/tools/{id}/screenshots/{index}",
            post(api::upload_tool_screenshot),
        )
        .route("/categories", post(api::add_category))
        .route("/categories/{name}", delete(api::delete_category))
        .route("/auth/promote", post(api::promote_account))
        .layer(middleware::from_fn(move |req, next| {
            guards::admin_auth_layer(provider.clone(), roles.clone(), req, next)
        }));

    // Public routes
    let public_routes = Router::new()
        .route("/tools", get(api::list_tools))
        .route("/tools/{id}", get(api::get_tool))
        .route("/tools/slug/{slug}", get(api::get_tool_by_slug))
        .route("/categories", get(api::list_categories))
        .route("/auth/login", post(api::login))
        .route("/auth/register", post(api::register))
        .route("/auth/google", post(api::google_sign_in))
        .route("/auth/logout", post(api::logout))
        .route("/auth/session", get(api::current_session));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", public_routes.merge(admin_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
