//! LLM-backed task suggestions.

pub mod client;
pub mod parse;
pub mod prompt;

pub use client::{GeminiClient, LanguageModel};
pub use parse::parse_suggestions;
pub use prompt::build_prompt;

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::db::Database;
use crate::types::{SuggestionResponse, SuggestionStatus};

pub const UNAVAILABLE_MESSAGE: &str = "AI service is not available. Please check API configuration.";
pub const NO_CONTEXT_MESSAGE: &str =
    "Please set your goals and notes first to get personalized suggestions";

/// Generates suggestions from a user's stored context.
#[derive(Clone)]
pub struct SuggestionService {
    db: Database,
    model: Option<Arc<dyn LanguageModel>>,
}

impl SuggestionService {
    /// `model` is `None` when no provider is configured.
    pub fn new(db: Database, model: Option<Arc<dyn LanguageModel>>) -> Self {
        if model.is_none() {
            warn!("No language model configured; suggestions are disabled");
        }
        Self { db, model }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().map(|m| m.model_name())
    }

    /// Produce suggestions for a user. Failures are reported in the response,
    /// never as an error.
    pub async fn generate_suggestions(&self, user_id: i64, query: &str) -> SuggestionResponse {
        let Some(model) = self.model.as_ref() else {
            error!("Language model not initialized");
            return SuggestionResponse::failure(SuggestionStatus::Unavailable, UNAVAILABLE_MESSAGE);
        };

        let context = match self.db.get_user_context(user_id) {
            Ok(Some(context)) => context,
            Ok(None) => {
                return SuggestionResponse::failure(SuggestionStatus::UserNotFound, "User not found");
            }
            Err(e) => {
                error!(user_id, error = %e, "Failed to load user context");
                return SuggestionResponse::failure(
                    SuggestionStatus::Failed,
                    format!("Error generating suggestions: {e}"),
                );
            }
        };

        if context.is_empty() {
            return SuggestionResponse {
                success: true,
                suggestions: Vec::new(),
                message: Some(NO_CONTEXT_MESSAGE.to_string()),
                query_context: Some("No context available".to_string()),
                status: SuggestionStatus::NoContext,
            };
        }

        let prompt = build_prompt(&context.goals, &context.notes, query);
        info!(user_id, model = model.model_name(), "Generating suggestions");

        let raw = match model.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(user_id, error = %e, "Suggestion generation failed");
                return SuggestionResponse::failure(
                    SuggestionStatus::Failed,
                    format!("Error generating suggestions: {e}"),
                );
            }
        };
        debug!(user_id, response = %raw, "Model response");

        let suggestions = parse_suggestions(&raw);
        let or_none = |s: &str| if s.is_empty() { "None set".to_string() } else { s.to_string() };

        SuggestionResponse {
            success: true,
            message: Some(format!(
                "Generated {} task suggestions based on your context",
                suggestions.len()
            )),
            query_context: Some(format!(
                "Goals: {} | Notes: {}",
                or_none(&context.goals),
                or_none(&context.notes)
            )),
            suggestions,
            status: SuggestionStatus::Generated,
        }
    }

    /// Send a trivial prompt to check the provider answers.
    pub async fn validate_connection(&self) -> bool {
        let Some(model) = self.model.as_ref() else {
            return false;
        };

        match model.generate("Say 'OK' in one word.").await {
            Ok(_) => {
                info!(model = model.model_name(), "Language model connection validated");
                true
            }
            Err(e) => {
                error!(error = %e, "Language model connection validation failed");
                false
            }
        }
    }
}
