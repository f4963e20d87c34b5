//! Route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::store::{NewPrompt, Prompt, PromptPage};

use super::auth::AuthUser;
use super::error::ApiError;
use super::state::AppState;

const MAX_PAGE_SIZE: usize = 100;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Service is healthy",
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found")
}

/// Pagination parameters for listing prompts.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    10
}

pub async fn list_prompts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<PromptPage> {
    let page = params.page.max(1);
    let page_size = params.page_size.clamp(1, MAX_PAGE_SIZE);
    Json(state.prompts.list(page, page_size).await)
}

pub async fn get_prompt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Prompt>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::BadRequest("Invalid prompt ID".into()))?;

    state
        .prompts
        .get(id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound("Prompt not found"))
}

/// Create a prompt owned by the authenticated user.
///
/// Sits behind the authentication and write path gates.
pub async fn create_prompt(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<NewPrompt>, JsonRejection>,
) -> Result<(StatusCode, Json<Prompt>), ApiError> {
    let Json(new_prompt) = payload.map_err(|e| {
        debug!(error = %e, "Invalid prompt body");
        ApiError::BadRequest("Invalid request body".into())
    })?;

    if let Some(field) = new_prompt.missing_field() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }

    let prompt = state.prompts.create(&user.id, new_prompt).await;
    info!(prompt_id = %prompt.id, user_id = %user.id, "Prompt created");

    Ok((StatusCode::CREATED, Json(prompt)))
}
