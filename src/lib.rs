//! Chef Vibes API - recipes, categories and saved-recipe "kitchen" collections
//! over MongoDB, with cookie-based JWT auth on a subset of routes.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod types;

use std::future::Future;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::middleware::require_token;
use crate::state::AppState;

/// CORS for the single front-end origin, with cookies allowed
pub fn configure_cors(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!("Ignoring unparseable CORS origin {:?}; cross-origin requests will be refused", origin);
            layer
        }
    }
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = configure_cors(&state.config.server.cors_origin);
    let body_limit = state.config.server.max_request_size_bytes;

    Router::new()
        .route("/", get(public::health::root))
        .route("/health", get(public::health::health))
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        // One path, two tiers: lookup by category is open, edits need a token
        .route("/recipie/:id", recipe_item_routes(state.clone()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use axum::routing::delete;

    Router::new()
        .route("/jwt", post(public::token::issue))
        .route("/categories", get(public::categories::list))
        .route("/recipies/:id", get(public::recipes::show))
        .route("/recipie", post(public::recipes::create))
        .route("/cart/:id", delete(public::cart::remove))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/recipies", get(protected::recipes::list))
        .route("/cart", get(protected::kitchen::list))
        .route("/add-to-kitchen", post(protected::kitchen::add))
        .route_layer(axum::middleware::from_fn_with_state(state, require_token))
}

fn recipe_item_routes(state: AppState) -> MethodRouter<AppState> {
    get(public::recipes::by_category).merge(
        put(protected::recipes::update)
            .delete(protected::recipes::remove)
            .route_layer(axum::middleware::from_fn_with_state(state, require_token)),
    )
}

/// Serve until `shutdown` resolves, then drain requests and release the store
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let store = state.store.clone();

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server stopped, closing database connection");
    store.shutdown().await;
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
pub mod testing;
