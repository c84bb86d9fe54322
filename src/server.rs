//! HTTP dispatch layer over the live model snapshot

use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use brain_common::{BrainError, ComponentCategory, ComponentRecord, ComponentType, ModelStats};
use brain_core::ModelStore;
use brain_query::{GenerationRequest, SearchQuery, ValidationReport, DEFAULT_LIMIT};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
struct AppState {
    store: ModelStore,
}

pub fn router(store: ModelStore) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/model/stats", get(stats))
        .route("/components", get(list_components))
        .route("/components/:id", get(get_component))
        .route("/generation-context", post(generation_context))
        .route("/validate", post(validate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { store })
}

pub async fn serve(store: ModelStore, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Serving design model on http://{}", addr);

    axum::serve(listener, router(store))
        .await
        .context("HTTP server failed")
}

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Brain(BrainError),
}

impl From<BrainError> for ApiError {
    fn from(err: BrainError) -> Self {
        Self::Brain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Brain(err) => {
                let status = match &err {
                    BrainError::NoExemplars { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    BrainError::MalformedTree(_) | BrainError::MalformedStylesheet(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let model = state.store.snapshot();
    Json(json!({
        "status": "ok",
        "version": model.metadata.version,
        "generatedAt": model.metadata.generated_at,
        "components": model.components.len(),
    }))
}

async fn stats(State(state): State<AppState>) -> Json<ModelStats> {
    Json(state.store.snapshot().stats())
}

#[derive(Debug, Deserialize)]
struct ComponentParams {
    q: Option<String>,
    #[serde(rename = "type")]
    component_type: Option<String>,
    category: Option<String>,
    limit: Option<usize>,
}

impl ComponentParams {
    fn into_query(self) -> Result<SearchQuery, ApiError> {
        let mut query = SearchQuery::new(self.q.unwrap_or_default())
            .with_limit(self.limit.unwrap_or(DEFAULT_LIMIT));
        if let Some(raw) = self.component_type {
            let component_type = ComponentType::parse(&raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown component type '{}'", raw)))?;
            query = query.with_type(component_type);
        }
        if let Some(raw) = self.category {
            let category = ComponentCategory::parse(&raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown category '{}'", raw)))?;
            query = query.with_category(category);
        }
        Ok(query)
    }
}

async fn list_components(
    State(state): State<AppState>,
    Query(params): Query<ComponentParams>,
) -> Result<Json<Vec<ComponentRecord>>, ApiError> {
    let query = params.into_query()?;
    let model = state.store.snapshot();
    let results = brain_query::search(&model, &query)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(results))
}

async fn get_component(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ComponentRecord>, ApiError> {
    let model = state.store.snapshot();
    let record = brain_query::retrieve(&model, &id).cloned();
    record
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No component with id '{}'", id)))
}

async fn generation_context(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<Value>, ApiError> {
    let model = state.store.snapshot();
    let context = brain_query::assemble_generation_context(&model, request)?;
    let prompt = context.render_prompt();
    Ok(Json(json!({ "context": context, "prompt": prompt })))
}

#[derive(Debug, Deserialize)]
struct ValidateBody {
    html: String,
    #[serde(default)]
    css: String,
}

async fn validate(
    State(state): State<AppState>,
    Json(body): Json<ValidateBody>,
) -> Result<Json<ValidationReport>, ApiError> {
    let model = state.store.snapshot();
    let report = brain_query::validate(&model.constraints, &body.html, &body.css)?;
    Ok(Json(report))
}
