//! HTTP API for the shop marketplace.
//!
//! Provides REST endpoints for listing, reading and managing shops, with
//! ownership-gated writes, streaming multipart image uploads, a single
//! error responder, structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod responder;
pub mod routes;
pub mod upload;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;
use domain::ShopService;
use metrics_exporter_prometheus::PrometheusHandle;
use shop_store::{ProductStore, ShopStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::Authenticator;
use config::Config;
use upload::SpoolOptions;

/// Storage the API runs against: one backend serves shops and products.
pub trait Backend: ShopStore + ProductStore + Clone + 'static {}

impl<T: ShopStore + ProductStore + Clone + 'static> Backend for T {}

/// Shared application state available to all route handlers.
pub struct AppState<S: Backend> {
    pub shop_service: ShopService<S, S>,
    pub authenticator: Arc<dyn Authenticator>,
    pub default_photo: PathBuf,
    pub spool: SpoolOptions,
}

/// Creates the application state from a storage backend and configuration.
pub fn create_state<S: Backend>(
    store: S,
    authenticator: Arc<dyn Authenticator>,
    config: &Config,
) -> Arc<AppState<S>> {
    let limits = config.limits();
    let shop_service = ShopService::new(store.clone(), store).with_limits(limits);

    Arc::new(AppState {
        shop_service,
        authenticator,
        default_photo: config.default_photo_path.clone(),
        spool: SpoolOptions {
            max_file_bytes: limits.max_file_bytes,
            upload_dir: config.upload_dir.clone(),
        },
    })
}

/// Creates the Axum application router with all routes and shared state.
///
/// `body_limit` bounds the raw request body; keep it above the per-file cap
/// so oversized files are reported by the upload parser.
pub fn create_app<S: Backend>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
    body_limit: usize,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/shops",
            get(routes::shops::list::<S>).post(routes::shops::create::<S>),
        )
        .route("/api/shops/mine", get(routes::shops::mine::<S>))
        .route(
            "/api/shops/defaultphoto",
            get(routes::shops::default_photo::<S>),
        )
        .route(
            "/api/shops/{shop_id}",
            get(routes::shops::read::<S>)
                .put(routes::shops::update::<S>)
                .delete(routes::shops::delete::<S>),
        )
        .route("/api/shops/{shop_id}/photo", get(routes::shops::photo::<S>))
        .with_state(state)
        .merge(metrics_router)
        .fallback(responder::route_not_found)
        .method_not_allowed_fallback(responder::route_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(responder::error_responder))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
