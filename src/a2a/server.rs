//! A2A HTTP 服务端（axum）
//!
//! - GET  /.well-known/agent.json → AgentCard
//! - POST /                       → dispatch；请求体无效或方法未知 400，处理失败 500

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::a2a::client::AGENT_CARD_PATH;
use crate::a2a::{dispatch, AgentCard, TaskError, TaskHandler, TaskRequest};

#[derive(Clone)]
struct AppState {
    card: Arc<AgentCard>,
    handler: Arc<dyn TaskHandler>,
}

pub fn router(card: AgentCard, handler: Arc<dyn TaskHandler>) -> Router {
    let state = AppState {
        card: Arc::new(card),
        handler,
    };
    Router::new()
        .route(AGENT_CARD_PATH, get(agent_card))
        .route("/", post(handle_task))
        .with_state(state)
}

/// 绑定地址并一直服务
pub async fn serve(addr: SocketAddr, card: AgentCard, handler: Arc<dyn TaskHandler>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, agent = %card.name, "A2A server listening");
    axum::serve(listener, router(card, handler)).await
}

async fn agent_card(State(state): State<AppState>) -> Json<AgentCard> {
    Json(state.card.as_ref().clone())
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

async fn handle_task(
    State(state): State<AppState>,
    body: Result<Json<TaskRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting malformed task request");
            return error_body(StatusCode::BAD_REQUEST, "invalid request format");
        }
    };
    match dispatch(request, state.handler.as_ref()).await {
        Ok(response) => Json(response).into_response(),
        Err(TaskError::InvalidRequest) => error_body(StatusCode::BAD_REQUEST, "invalid request format"),
        Err(TaskError::UnknownMethod(_)) => error_body(StatusCode::BAD_REQUEST, "unknown method"),
        Err(TaskError::Handler(_)) => error_body(StatusCode::INTERNAL_SERVER_ERROR, "agent callback failed"),
    }
}
