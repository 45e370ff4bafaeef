//! Core types for the productivity tracker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum task title length in characters.
pub const TITLE_MAX_LEN: usize = 255;

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN_LEN: usize = 8;

/// A registered user, including the credential hash.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub hashed_password: String,
    pub goals: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user (no credential hash).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub goals: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            goals: user.goals.clone(),
            notes: user.notes.clone(),
            created_at: user.created_at,
        }
    }
}

/// A task owned by a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Which tasks to return from a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskFilter {
    /// Parse the `status_filter` query value. Anything unrecognized lists all tasks.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("pending") => TaskFilter::Pending,
            Some("completed") => TaskFilter::Completed,
            _ => TaskFilter::All,
        }
    }
}

/// Aggregate completion statistics for one user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
    /// Percentage in `[0, 100]`; zero when the user has no tasks.
    pub completion_rate: f64,
}

impl TaskStats {
    pub fn from_counts(total: i64, completed: i64) -> Self {
        let completion_rate = if total > 0 {
            completed as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total,
            completed,
            pending: total - completed,
            completion_rate,
        }
    }
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreate {
    pub title: String,
}

/// Body of `PUT /tasks/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_completed: Option<bool>,
}

/// Task listing with the owner's overall counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRegister {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLogin {
    pub email: String,
    pub password: String,
}

/// Issued after registration or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

/// A user's goals and notes with NULLs collapsed to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub goals: String,
    pub notes: String,
}

impl UserContext {
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty() && self.notes.is_empty()
    }
}

/// Body of `PUT /context` and `POST /context/validate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextUpdate {
    #[serde(default)]
    pub goals: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ContextUpdate {
    /// Update that resets both fields to empty strings.
    pub fn cleared() -> Self {
        Self {
            goals: Some(String::new()),
            notes: Some(String::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_none() && self.notes.is_none()
    }

    /// Quality feedback on a context before it is saved.
    pub fn feedback(&self) -> ContextFeedback {
        let mut feedback = ContextFeedback {
            valid: true,
            warnings: Vec::new(),
            suggestions: Vec::new(),
        };

        match self.goals.as_deref().filter(|g| !g.is_empty()) {
            Some(goals) => {
                if goals.trim().chars().count() < 10 {
                    feedback
                        .warnings
                        .push("Goals are very short, consider adding more detail".to_string());
                }
                if goals.chars().count() > 1000 {
                    feedback
                        .warnings
                        .push("Goals are very long, consider being more concise".to_string());
                }
            }
            None => feedback
                .suggestions
                .push("Consider adding goals for better AI suggestions".to_string()),
        }

        match self.notes.as_deref().filter(|n| !n.is_empty()) {
            Some(notes) => {
                if notes.trim().chars().count() < 10 {
                    feedback
                        .warnings
                        .push("Notes are very short, consider adding more context".to_string());
                }
                if notes.chars().count() > 1000 {
                    feedback
                        .warnings
                        .push("Notes are very long, consider being more concise".to_string());
                }
            }
            None => feedback
                .suggestions
                .push("Consider adding notes for better AI context".to_string()),
        }

        let has_goals = self.goals.as_deref().is_some_and(|g| !g.is_empty());
        let has_notes = self.notes.as_deref().is_some_and(|n| !n.is_empty());
        if !has_goals && !has_notes {
            feedback.valid = false;
            feedback
                .warnings
                .push("At least one field (goals or notes) is required".to_string());
        }

        feedback
    }
}

/// Result of `POST /context/validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFeedback {
    pub valid: bool,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Body of the AI suggestion endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub query: String,
}

/// A task proposed by the language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedTask {
    pub title: String,
    pub reason: Option<String>,
}

/// Why a suggestion run ended the way it did. Not part of the wire format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuggestionStatus {
    #[default]
    Generated,
    NoContext,
    UserNotFound,
    Unavailable,
    Failed,
}

/// Outcome of a suggestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub success: bool,
    #[serde(default)]
    pub suggestions: Vec<SuggestedTask>,
    pub message: Option<String>,
    pub query_context: Option<String>,
    #[serde(skip)]
    pub status: SuggestionStatus,
}

impl SuggestionResponse {
    pub fn failure(status: SuggestionStatus, message: impl Into<String>) -> Self {
        Self {
            success: false,
            suggestions: Vec::new(),
            message: Some(message.into()),
            query_context: None,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_zero_tasks() {
        let stats = TaskStats::from_counts(0, 0);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.completion_rate, 0.0);
    }

    #[test]
    fn test_stats_rate() {
        let stats = TaskStats::from_counts(4, 1);
        assert_eq!(stats.pending, 3);
        assert!((stats.completion_rate - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_filter_from_query() {
        assert_eq!(TaskFilter::from_query(Some("pending")), TaskFilter::Pending);
        assert_eq!(TaskFilter::from_query(Some("Completed")), TaskFilter::Completed);
        assert_eq!(TaskFilter::from_query(Some("all")), TaskFilter::All);
        assert_eq!(TaskFilter::from_query(Some("bogus")), TaskFilter::All);
        assert_eq!(TaskFilter::from_query(None), TaskFilter::All);
    }

    #[test]
    fn test_feedback_requires_a_field() {
        let feedback = ContextUpdate::default().feedback();
        assert!(!feedback.valid);
        assert_eq!(feedback.suggestions.len(), 2);
        assert!(feedback
            .warnings
            .iter()
            .any(|w| w.contains("At least one field")));
    }

    #[test]
    fn test_feedback_short_goals() {
        let feedback = ContextUpdate {
            goals: Some("ship it".to_string()),
            notes: None,
        }
        .feedback();
        assert!(feedback.valid);
        assert_eq!(
            feedback.warnings,
            vec!["Goals are very short, consider adding more detail".to_string()]
        );
        assert_eq!(
            feedback.suggestions,
            vec!["Consider adding notes for better AI context".to_string()]
        );
    }

    #[test]
    fn test_feedback_long_notes() {
        let feedback = ContextUpdate {
            goals: Some("Learn Rust and ship a backend service".to_string()),
            notes: Some("x".repeat(1001)),
        }
        .feedback();
        assert!(feedback.valid);
        assert_eq!(
            feedback.warnings,
            vec!["Notes are very long, consider being more concise".to_string()]
        );
        assert!(feedback.suggestions.is_empty());
    }
}
