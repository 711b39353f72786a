use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Html,
    Json,
};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::AppState;
use crate::core::session::Session;
use crate::layout::document::LayoutDocument;
use crate::layout::error::LayoutError;
use crate::layout::presentation::PresentationState;
use crate::layout::registry::ShapeContext;
use crate::layout::types::{
    AppMeta, BindQueryRequest, ComponentInstance, ExportQuery, LayoutPayload,
};
use crate::render::export::{export_static_html, ExportOptions};
use crate::render::live::{render_live, LiveView};

#[derive(Debug, Default, Deserialize)]
pub struct RenderQuery {
    pub selected: Option<String>,
    pub binding: Option<String>,
    #[serde(default)]
    pub read_only: bool,
}

impl RenderQuery {
    fn presentation(self) -> PresentationState {
        let mut state = PresentationState {
            read_only: self.read_only,
            ..PresentationState::default()
        };
        if let Some(id) = self.selected {
            state.select(id);
        }
        if let Some(id) = self.binding {
            state.begin_binding(id);
        }
        state
    }
}

pub async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn handle_render_layout(
    State(state): State<Arc<AppState>>,
    Path(app_id): Path<String>,
    Query(query): Query<RenderQuery>,
    headers: HeaderMap,
) -> Result<Json<LiveView>, LayoutError> {
    let session = Session::from_headers(&headers);
    let document = state.service.load_layout(&session, &app_id).await?;

    let presentation = query.presentation();
    let view = {
        let mut rng = StdRng::from_entropy();
        let mut ctx = ShapeContext::new(&mut rng, state.config.render.metric_trend_fallback);
        render_live(&document, &presentation, &mut ctx)
    };
    Ok(Json(view))
}

pub async fn handle_export_layout(
    State(state): State<Arc<AppState>>,
    Path(app_id): Path<String>,
    Query(query): Query<ExportQuery>,
    headers: HeaderMap,
) -> Result<Html<String>, LayoutError> {
    let session = Session::from_headers(&headers);
    let document = state.service.load_layout(&session, &app_id).await?;

    let app = AppMeta {
        name: query
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| state.config.export.default_title.clone()),
        description: None,
    };
    let options = ExportOptions::new(state.config.export.chart_cdn_url.clone());

    let html = {
        let mut rng = StdRng::from_entropy();
        let mut ctx = ShapeContext::new(&mut rng, state.config.render.metric_trend_fallback);
        export_static_html(&document, &app, &options, &mut ctx)
    };
    info!(
        "Exported app {app_id} ({} components, {} bytes)",
        document.len(),
        html.len()
    );
    Ok(Html(html))
}

/// Binds a query to one component of the stored layout, then saves the layout.
pub async fn handle_bind_query(
    State(state): State<Arc<AppState>>,
    Path((app_id, component_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<BindQueryRequest>,
) -> Result<Json<ComponentInstance>, LayoutError> {
    let query_id = req.query_id.trim();
    if query_id.is_empty() {
        return Err(LayoutError::Validation("queryId is required".to_string()));
    }

    let session = Session::from_headers(&headers);
    let mut document = state.service.open_layout(&session, &app_id).await?;
    let component = state
        .service
        .bind_query(&session, &app_id, &mut document, &component_id, query_id)
        .await?
        .clone();
    state.service.save_layout(&session, &app_id, &document).await?;

    Ok(Json(component))
}

pub async fn handle_save_layout(
    State(state): State<Arc<AppState>>,
    Path(app_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<LayoutPayload>,
) -> Result<StatusCode, LayoutError> {
    let session = Session::from_headers(&headers);
    let document = LayoutDocument::new(payload.layout);
    state.service.save_layout(&session, &app_id, &document).await?;
    Ok(StatusCode::NO_CONTENT)
}
