//! Goal and note context endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use super::{AppState, AuthUser};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::types::{ContextFeedback, ContextUpdate, UserResponse};

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[derive(Debug, Serialize)]
pub struct ContextView {
    pub goals: Option<String>,
    pub notes: Option<String>,
    pub has_context: bool,
    pub message: &'static str,
}

pub async fn get_context(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ContextView>> {
    let context = state
        .db
        .get_user_context(user.id)?
        .ok_or_else(ApiError::user_not_found)?;

    info!(user_id = user.id, "Retrieved context");
    let has_context = !context.is_empty();
    Ok(Json(ContextView {
        goals: non_empty(context.goals),
        notes: non_empty(context.notes),
        has_context,
        message: "Your context will be used to generate personalized AI suggestions",
    }))
}

#[derive(Debug, Serialize)]
pub struct ContextUpdated {
    pub success: bool,
    pub message: &'static str,
    pub goals: Option<String>,
    pub notes: Option<String>,
    pub user: UserResponse,
}

pub async fn update_context(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<ContextUpdate>,
) -> ApiResult<Json<ContextUpdated>> {
    if body.is_empty() {
        return Err(ApiError::new(
            ErrorCode::MissingRequiredField,
            "At least one field (goals or notes) must be provided",
        ));
    }

    let updated = state
        .db
        .update_user_context(user.id, &body)
        .map_err(|e| ApiError::database("updating context", e))?
        .ok_or_else(ApiError::user_not_found)?;

    info!(user_id = user.id, "Context updated");
    Ok(Json(ContextUpdated {
        success: true,
        message: "Context updated successfully",
        goals: updated.goals.clone(),
        notes: updated.notes.clone(),
        user: UserResponse::from(&updated),
    }))
}

pub async fn clear_context(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<StatusCode> {
    state
        .db
        .clear_user_context(user.id)
        .map_err(|e| ApiError::database("clearing context", e))?
        .ok_or_else(ApiError::user_not_found)?;

    info!(user_id = user.id, "Context cleared");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn profile(AuthUser(user): AuthUser) -> Json<Value> {
    info!(user_id = user.id, "Retrieved profile");
    Json(json!({
        "user": UserResponse::from(&user),
        "context": { "goals": user.goals, "notes": user.notes },
        "has_goals": user.goals.as_deref().is_some_and(|g| !g.is_empty()),
        "has_notes": user.notes.as_deref().is_some_and(|n| !n.is_empty()),
    }))
}

pub async fn guidelines() -> Json<Value> {
    Json(json!({
        "goals": {
            "description": "Define your short-term and long-term objectives",
            "examples": [
                "Learn a new backend framework and ship a small service",
                "Build a portfolio project to showcase full-stack skills",
                "Improve code quality and write comprehensive documentation",
                "Master a cross-platform mobile toolkit",
            ],
            "tips": [
                "Be specific and measurable",
                "Include both personal and professional goals",
                "Update regularly as priorities change",
                "Include learning objectives",
            ],
        },
        "notes": {
            "description": "Add context about your current situation and preferences",
            "examples": [
                "Currently focused on backend development with AI integration",
                "Prefer short tasks (30 mins) over long ones",
                "Available 2 hours per day for side projects",
                "Interested in open-source contributions",
            ],
            "tips": [
                "Mention your current focus areas",
                "Note any constraints or preferences",
                "Add relevant technologies or tools you're using",
                "Include your availability and work style",
            ],
        },
        "impact": "Well-defined goals and notes lead to more relevant and actionable AI suggestions",
    }))
}

pub async fn validate(
    AuthUser(user): AuthUser,
    Json(body): Json<ContextUpdate>,
) -> Json<ContextFeedback> {
    let feedback = body.feedback();
    info!(user_id = user.id, valid = feedback.valid, "Context validated");
    Json(feedback)
}
