//! HTTP API endpoints for threads.
//!
//! Every mutation goes through `AppState`, which commits before publishing
//! to the hub. Responses share the `{ success, data, message, count }` envelope.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::AppResult;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::state::AppState;
use crate::types::*;
use crate::ws;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            count: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            count: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub timestamp: String,
    pub connections: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    #[serde(default)]
    pub question: Option<String>,
}

/// Build the application router. Rate limiting applies to `/api/*` only.
pub fn router(state: Arc<AppState>, limiter: Option<RateLimiter>) -> Router {
    let mut api = Router::new()
        .route("/api/threads", get(list_threads).post(create_thread))
        .route("/api/threads/similar", get(similar_threads))
        .route("/api/threads/{id}", get(get_thread))
        .route("/api/threads/{id}/summary", get(thread_summary))
        .route("/api/threads/{id}/reply", post(add_reply))
        .route("/api/threads/{id}/upvote", post(upvote_thread))
        .route("/api/threads/{id}/answered", patch(mark_answered));

    if let Some(limiter) = limiter {
        api = api.layer(middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ));
    }

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws::ws_handler))
        .merge(api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Discussion board API is running".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        connections: state.hub.connection_count().await,
    })
}

/// GET /api/threads?sort_by=votes|date&search=...
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ThreadQuery>,
) -> Json<ApiResponse<Vec<Thread>>> {
    let threads = state.list_threads(&query).await;
    let count = threads.len();
    Json(ApiResponse {
        count: Some(count),
        ..ApiResponse::ok(threads)
    })
}

/// GET /api/threads/similar?question=...
pub async fn similar_threads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SimilarQuery>,
) -> AppResult<Json<ApiResponse<Vec<Thread>>>> {
    let question = query.question.unwrap_or_default();
    let threads = state.similar_threads(&question).await?;
    Ok(Json(ApiResponse::ok(threads)))
}

/// GET /api/threads/{id}
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ThreadId>,
) -> AppResult<Json<ApiResponse<Thread>>> {
    let thread = state.get_thread(&id).await?;
    Ok(Json(ApiResponse::ok(thread)))
}

/// GET /api/threads/{id}/summary
pub async fn thread_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ThreadId>,
) -> AppResult<Json<ApiResponse<SummaryResponse>>> {
    let summary = state.thread_summary(&id).await?;
    Ok(Json(ApiResponse::ok(SummaryResponse { summary })))
}

/// POST /api/threads
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewThread>,
) -> AppResult<(StatusCode, Json<ApiResponse<Thread>>)> {
    let thread = state.create_thread(new).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(thread).with_message("Thread created successfully")),
    ))
}

/// POST /api/threads/{id}/reply
pub async fn add_reply(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ThreadId>,
    Json(new): Json<NewReply>,
) -> AppResult<(StatusCode, Json<ApiResponse<Reply>>)> {
    let reply = state.add_reply(&id, new).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(reply).with_message("Reply added successfully")),
    ))
}

/// POST /api/threads/{id}/upvote
pub async fn upvote_thread(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ThreadId>,
) -> AppResult<Json<ApiResponse<Thread>>> {
    let thread = state.upvote_thread(&id).await?;
    Ok(Json(
        ApiResponse::ok(thread).with_message("Thread upvoted successfully"),
    ))
}

/// PATCH /api/threads/{id}/answered
pub async fn mark_answered(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ThreadId>,
) -> AppResult<Json<ApiResponse<Thread>>> {
    let thread = state.mark_answered(&id).await?;
    Ok(Json(
        ApiResponse::ok(thread).with_message("Thread marked as answered"),
    ))
}
