pub mod handlers;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::config::AppConfig;
use crate::layout::service::LayoutService;

pub use handlers::*;

pub struct AppState {
    pub service: LayoutService,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(service: LayoutService, config: AppConfig) -> Self {
        Self { service, config }
    }
}

pub fn configure_layout_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/apps/:app_id/render", get(handle_render_layout))
        .route("/api/apps/:app_id/export", get(handle_export_layout))
        .route("/api/apps/:app_id/layout", put(handle_save_layout))
        .route(
            "/api/apps/:app_id/components/:component_id/bind",
            post(handle_bind_query),
        )
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .merge(configure_layout_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
