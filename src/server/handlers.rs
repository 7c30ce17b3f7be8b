//! HTTP request handlers and router assembly.

use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::middleware::{guard, RouteGuard, Validated};
use super::state::AppState;
use crate::pipeline::{GuardPlan, ValidationOptions, ValidationStep, ValidationTarget};

/// Create the API router.
///
/// Every guarded route carries its own plan; the guard layer wraps the
/// matched handler only, after routing.
pub fn create_router(state: Arc<AppState>) -> Router {
    let create_item = RouteGuard::new(
        state.clone(),
        GuardPlan::new().step(
            ValidationStep::new(ValidationTarget::Body, state.catalog.item_create.clone())
                .with_options(ValidationOptions::new().with_strict_mode()),
        ),
    );

    let list_items = RouteGuard::new(
        state.clone(),
        GuardPlan::new().step(ValidationStep::new(
            ValidationTarget::Query,
            state.catalog.pagination.clone(),
        )),
    );

    // Two steps, run in order with fail-fast: params first, then query
    let get_item = RouteGuard::new(
        state.clone(),
        GuardPlan::new()
            .step(ValidationStep::new(
                ValidationTarget::Params,
                state.catalog.item_id.clone(),
            ))
            .step(ValidationStep::new(
                ValidationTarget::Query,
                state.catalog.pagination.clone(),
            )),
    );

    let register_user = RouteGuard::new(
        state.clone(),
        GuardPlan::new().step(
            ValidationStep::new(
                ValidationTarget::Body,
                state.catalog.user_registration.clone(),
            )
            .with_options(ValidationOptions::new().with_strict_mode()),
        ),
    );

    let mut router = Router::new()
        // Health and status
        .route("/health", get(health_check))
        .route("/status", get(status))
        .route("/stats", get(stats_handler))
        .route("/stats/reset", post(reset_stats))
        // Direct scan endpoint
        .route("/scan", post(scan_content))
        // Guarded API routes
        .route(
            "/api/items",
            get(list_items_handler)
                .route_layer(from_fn_with_state(list_items, guard))
                .merge(
                    post(create_item_handler).route_layer(from_fn_with_state(create_item, guard)),
                ),
        )
        .route(
            "/api/items/:id",
            get(get_item_handler).route_layer(from_fn_with_state(get_item, guard)),
        )
        .route(
            "/api/users",
            post(register_user_handler).route_layer(from_fn_with_state(register_user, guard)),
        )
        .with_state(state.clone());

    if state.config.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }
    if state.config.logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Status endpoint
async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.uptime().as_secs(),
        "scanning_enabled": state.config.scanning_enabled,
        "events_dropped": state.events.dropped(),
    }))
}

/// Pipeline statistics
async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.stats.summary())
}

/// Reset pipeline statistics
async fn reset_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.stats.reset();
    Json(json!({"status": "reset"}))
}

/// Scan request
#[derive(Deserialize)]
pub struct ScanRequest {
    pub content: Value,
}

/// Scan a value directly, outside any route plan
async fn scan_content(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScanRequest>,
) -> Response {
    match state.scanner.scan_value(&req.content) {
        Ok(Some(category)) => Json(json!({
            "safe": false,
            "category": category,
        }))
        .into_response(),
        Ok(None) => Json(json!({"safe": true})).into_response(),
        Err(breach) => (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({
                "success": false,
                "message": format!("Request rejected: {breach}"),
            })),
        )
            .into_response(),
    }
}

/// Create an item from its canonicalized body
async fn create_item_handler(Extension(valid): Extension<Validated>) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "item": valid.body(),
        })),
    )
}

/// List items using the canonicalized (coerced, defaulted) pagination
async fn list_items_handler(Extension(valid): Extension<Validated>) -> impl IntoResponse {
    let page = valid.query()["page"].as_i64().unwrap_or(1);
    let limit = valid.query()["limit"].as_i64().unwrap_or(20);

    Json(json!({
        "success": true,
        "page": page,
        "limit": limit,
        "items": [],
    }))
}

/// Fetch one item by its canonicalized path id
async fn get_item_handler(Extension(valid): Extension<Validated>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "id": valid.params()["id"],
    }))
}

/// Register a user; the response never echoes credential fields
async fn register_user_handler(Extension(valid): Extension<Validated>) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": {
                "username": valid.body()["username"],
                "email": valid.body()["email"],
            },
        })),
    )
}
