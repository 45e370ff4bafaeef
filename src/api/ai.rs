//! AI suggestion endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use super::tasks::validate_title;
use super::{AppState, AuthUser};
use crate::ai::UNAVAILABLE_MESSAGE;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::types::{
    SuggestedTask, SuggestionRequest, SuggestionResponse, SuggestionStatus, Task,
};

fn require_query(body: &SuggestionRequest) -> ApiResult<&str> {
    let query = body.query.trim();
    if query.is_empty() {
        return Err(ApiError::invalid_value("query", "Query cannot be empty"));
    }
    Ok(query)
}

pub async fn suggest(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<SuggestionRequest>,
) -> ApiResult<Json<SuggestionResponse>> {
    let query = require_query(&body)?;
    info!(user_id = user.id, query, "Generating suggestions");

    let response = state.suggestions.generate_suggestions(user.id, query).await;
    if response.status == SuggestionStatus::Unavailable {
        return Err(ApiError::unavailable(
            response.message.unwrap_or_else(|| UNAVAILABLE_MESSAGE.to_string()),
        ));
    }

    info!(
        user_id = user.id,
        count = response.suggestions.len(),
        "Generated suggestions"
    );
    Ok(Json(response))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestAndCreateResponse {
    pub suggestions: Vec<SuggestedTask>,
    pub created_tasks: Vec<Task>,
    pub total_created: usize,
    pub message: String,
}

/// Generate suggestions and store each as a pending task in one transaction.
pub async fn suggest_and_create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<SuggestionRequest>,
) -> ApiResult<(StatusCode, Json<SuggestAndCreateResponse>)> {
    let query = require_query(&body)?;
    info!(user_id = user.id, query, "Suggest and create");

    let response = state.suggestions.generate_suggestions(user.id, query).await;
    if !response.success {
        let message = response.message.unwrap_or_default();
        return Err(match response.status {
            SuggestionStatus::Unavailable => ApiError::unavailable(message),
            SuggestionStatus::UserNotFound => ApiError::user_not_found(),
            _ => ApiError::new(ErrorCode::InvalidFieldValue, message),
        });
    }

    let titles: Vec<String> = response
        .suggestions
        .iter()
        .filter_map(|s| match validate_title(&s.title) {
            Ok(title) => Some(title),
            Err(_) => {
                warn!(user_id = user.id, title = %s.title, "Skipping suggestion with invalid title");
                None
            }
        })
        .collect();

    let created = state
        .db
        .bulk_create_tasks(user.id, &titles)
        .map_err(|e| ApiError::database("creating tasks", e))?;

    info!(
        user_id = user.id,
        created = created.len(),
        "Created tasks from suggestions"
    );
    let total_created = created.len();
    Ok((
        StatusCode::CREATED,
        Json(SuggestAndCreateResponse {
            suggestions: response.suggestions,
            created_tasks: created,
            total_created,
            message: format!("Created {} task(s) from AI suggestions", total_created),
        }),
    ))
}

/// Probe the model with a trivial prompt.
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    if !state.suggestions.validate_connection().await {
        return Err(ApiError::unavailable(
            "AI service is not available. Check API configuration.",
        ));
    }

    info!("AI service health check passed");
    Ok(Json(json!({
        "status": "healthy",
        "service": "Gemini API",
        "model": state.suggestions.model_name(),
    })))
}

pub async fn examples() -> Json<Value> {
    Json(json!({
        "examples": [
            "Suggest tasks to improve my productivity",
            "What tasks would help me achieve my goals?",
            "Generate actionable tasks for my goals",
            "Based on my interests, what should I work on?",
            "Suggest 5 tasks I should complete today",
        ],
        "tips": [
            "Make sure you've set your goals and notes first",
            "Be specific about what you want to accomplish",
            "Ask open-ended questions for better suggestions",
            "You can use follow-up queries to refine results",
        ],
    }))
}
