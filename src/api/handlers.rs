//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ConversationListResponse, ConversationResponse, ConversationWithMessagesResponse,
    ErrorResponse, RecipeListResponse, StateResponse, SuccessResponse, TurnResponse,
    UtteranceRequest,
};
use super::AppState;
use crate::catalog::Recipe;
use crate::db::DbError;
use crate::runtime::RuntimeError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

/// Longest utterance accepted in one turn, in characters
const MAX_UTTERANCE_CHARS: usize = 2000;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/api/conversations/:id",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/api/conversations/:id/messages", post(send_utterance))
        .route("/api/conversations/:id/state", get(get_state))
        .route("/api/conversations/:id/stream", get(stream_conversation))
        .route("/api/recipes", get(list_recipes))
        .route("/api/recipes/:name", get(get_recipe))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Conversations
// ============================================================

async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<ConversationListResponse>, AppError> {
    let conversations = state.runtime.db().list_conversations()?;
    Ok(Json(ConversationListResponse { conversations }))
}

async fn create_conversation(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ConversationResponse>), AppError> {
    let conversation = state.runtime.create_conversation()?;
    Ok((
        StatusCode::CREATED,
        Json(ConversationResponse { conversation }),
    ))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationWithMessagesResponse>, AppError> {
    let db = state.runtime.db();
    let conversation = db.get_conversation(&id)?;
    let messages = db.get_messages(&id)?;
    Ok(Json(ConversationWithMessagesResponse {
        conversation,
        messages,
    }))
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.runtime.delete_conversation(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn get_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StateResponse>, AppError> {
    let conv_state = state.runtime.db().load_state(&id)?;
    Ok(Json(StateResponse { state: conv_state }))
}

// ============================================================
// Turns
// ============================================================

async fn send_utterance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UtteranceRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    if req.text.chars().count() > MAX_UTTERANCE_CHARS {
        return Err(AppError::BadRequest(format!(
            "Utterance longer than {MAX_UTTERANCE_CHARS} characters"
        )));
    }

    let reply = state.runtime.send_utterance(&id, &req.text).await?;
    Ok(Json(TurnResponse {
        replies: reply.replies,
        outcome: reply.outcome,
        state: reply.state,
    }))
}

async fn stream_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.runtime.db();
    let conversation = db.get_conversation(&id)?;
    let messages = db.get_messages(&id)?;

    let broadcast_rx = state.runtime.subscribe(&id).await?;

    let init = json!({
        "type": "init",
        "conversation": conversation,
        "messages": messages,
    });

    Ok(sse_stream(init, broadcast_rx))
}

// ============================================================
// Recipes
// ============================================================

async fn list_recipes(State(state): State<AppState>) -> Json<RecipeListResponse> {
    let recipes = state
        .runtime
        .bot()
        .catalog()
        .names()
        .into_iter()
        .map(String::from)
        .collect();
    Json(RecipeListResponse { recipes })
}

async fn get_recipe(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Recipe>, AppError> {
    state
        .runtime
        .bot()
        .catalog()
        .find_by_name(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Recipe not found: {name}")))
}

async fn get_version() -> &'static str {
    concat!("recipe-bot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<DbError> for AppError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::ConversationNotFound(_) => AppError::NotFound(e.to_string()),
            DbError::ConversationExists(_) => AppError::BadRequest(e.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::Db(db) => db.into(),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
