//! Suggestion service and Gemini client tests.
//!
//! The Gemini client is exercised against an `httpmock` server; the service
//! tests use a scripted model so they run offline.

use async_trait::async_trait;
use httpmock::Method::POST;
use httpmock::MockServer;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use productivity_tracker::ai::{GeminiClient, LanguageModel, SuggestionService};
use productivity_tracker::db::Database;
use productivity_tracker::types::{ContextUpdate, SuggestionStatus};

const MODEL: &str = "test-model";
const ENDPOINT: &str = "/v1beta/models/test-model:generateContent";

/// Records prompts and answers with a fixed reply.
struct RecordingModel {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingModel {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(error: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for RecordingModel {
    fn model_name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(anyhow::Error::msg)
    }
}

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new("test-key", MODEL, server.base_url(), Duration::from_secs(5)).unwrap()
}

/// Database with one user holding the given context. Returns (db, user id).
fn db_with_context(goals: &str, notes: &str) -> (Database, i64) {
    let db = Database::open_in_memory().unwrap();
    let user = db.create_user("ctx@example.com", "hash").unwrap().unwrap();
    db.update_user_context(
        user.id,
        &ContextUpdate {
            goals: Some(goals.to_string()),
            notes: Some(notes.to_string()),
        },
    )
    .unwrap();
    (db, user.id)
}

mod gemini_client_tests {
    use super::*;

    #[tokio::test]
    async fn sends_prompt_and_joins_text_parts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(ENDPOINT)
                    .header("x-goog-api-key", "test-key")
                    .body_includes("\"maxOutputTokens\":1024")
                    .body_includes("plan my day");
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": {
                            "role": "model",
                            "parts": [{ "text": "[{\"title\": " }, { "text": "\"Rest\"}]" }]
                        },
                        "finishReason": "STOP"
                    }]
                }));
            })
            .await;

        let text = client_for(&server).generate("plan my day").await.unwrap();
        assert_eq!(text, "[{\"title\": \"Rest\"}]");
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(ENDPOINT);
                then.status(500).body("backend exploded");
            })
            .await;

        let err = client_for(&server).generate("anything").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("500"), "unexpected error: {message}");
        assert!(message.contains("backend exploded"));
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn response_without_candidates_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(ENDPOINT);
                then.status(200).json_body(json!({ "candidates": [] }));
            })
            .await;

        let err = client_for(&server).generate("anything").await.unwrap_err();
        assert!(err.to_string().contains("no text"));
    }

    #[tokio::test]
    async fn non_json_body_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(ENDPOINT);
                then.status(200).body("<html>proxy error</html>");
            })
            .await;

        assert!(client_for(&server).generate("anything").await.is_err());
    }

    #[tokio::test]
    async fn service_end_to_end_through_client() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(ENDPOINT);
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": { "parts": [{
                            "text": "```json\n[{\"title\": \"Review notes\", \"reason\": \"Keeps momentum\"}]\n```"
                        }] }
                    }]
                }));
            })
            .await;

        let (db, user_id) = db_with_context("Finish the thesis", "");
        let service = SuggestionService::new(db, Some(Arc::new(client_for(&server)) as Arc<dyn LanguageModel>));

        let response = service.generate_suggestions(user_id, "What now?").await;
        assert!(response.success);
        assert_eq!(response.status, SuggestionStatus::Generated);
        assert_eq!(response.suggestions.len(), 1);
        assert_eq!(response.suggestions[0].title, "Review notes");
        assert_eq!(
            response.suggestions[0].reason.as_deref(),
            Some("Keeps momentum")
        );
        assert_eq!(service.model_name(), Some(MODEL));
    }
}

mod service_tests {
    use super::*;

    #[tokio::test]
    async fn no_model_is_unavailable() {
        let (db, user_id) = db_with_context("Goals", "Notes");
        let service = SuggestionService::new(db, None);

        assert!(!service.is_available());
        assert!(!service.validate_connection().await);

        let response = service.generate_suggestions(user_id, "query").await;
        assert!(!response.success);
        assert_eq!(response.status, SuggestionStatus::Unavailable);
    }

    #[tokio::test]
    async fn unknown_user_reported() {
        let db = Database::open_in_memory().unwrap();
        let model = RecordingModel::replying("[]");
        let service = SuggestionService::new(db, Some(model.clone() as Arc<dyn LanguageModel>));

        let response = service.generate_suggestions(99, "query").await;
        assert!(!response.success);
        assert_eq!(response.status, SuggestionStatus::UserNotFound);
        assert_eq!(response.message.as_deref(), Some("User not found"));
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn empty_context_skips_model() {
        let (db, user_id) = db_with_context("", "");
        let model = RecordingModel::replying("[]");
        let service = SuggestionService::new(db, Some(model.clone() as Arc<dyn LanguageModel>));

        let response = service.generate_suggestions(user_id, "query").await;
        assert!(response.success);
        assert_eq!(response.status, SuggestionStatus::NoContext);
        assert!(response.suggestions.is_empty());
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn prompt_carries_context_and_query() {
        let (db, user_id) = db_with_context("Run a 10k", "Knee injury last year");
        let model = RecordingModel::replying(r#"[{"title": "Stretch", "reason": "Protect the knee"}]"#);
        let service = SuggestionService::new(db, Some(model.clone() as Arc<dyn LanguageModel>));

        let response = service
            .generate_suggestions(user_id, "Build a training week")
            .await;
        assert!(response.success);
        assert_eq!(
            response.query_context.as_deref(),
            Some("Goals: Run a 10k | Notes: Knee injury last year")
        );

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Run a 10k"));
        assert!(prompts[0].contains("Knee injury last year"));
        assert!(prompts[0].contains("Build a training week"));
    }

    #[tokio::test]
    async fn unparseable_reply_yields_no_suggestions() {
        let (db, user_id) = db_with_context("Goals here", "");
        let service = SuggestionService::new(
            db,
            Some(RecordingModel::replying("I'm sorry, I can't help with that.") as Arc<dyn LanguageModel>),
        );

        let response = service.generate_suggestions(user_id, "query").await;
        assert!(response.success);
        assert!(response.suggestions.is_empty());
        assert_eq!(
            response.message.as_deref(),
            Some("Generated 0 task suggestions based on your context")
        );
    }

    #[tokio::test]
    async fn model_error_is_failed_status() {
        let (db, user_id) = db_with_context("Goals here", "Notes here");
        let service = SuggestionService::new(db, Some(RecordingModel::failing("rate limited") as Arc<dyn LanguageModel>));

        let response = service.generate_suggestions(user_id, "query").await;
        assert!(!response.success);
        assert_eq!(response.status, SuggestionStatus::Failed);
        assert_eq!(
            response.message.as_deref(),
            Some("Error generating suggestions: rate limited")
        );
        assert!(!service.validate_connection().await);
    }

    #[tokio::test]
    async fn validate_connection_sends_probe() {
        let (db, _) = db_with_context("", "");
        let model = RecordingModel::replying("OK");
        let service = SuggestionService::new(db, Some(model.clone() as Arc<dyn LanguageModel>));

        assert!(service.validate_connection().await);
        assert_eq!(model.prompts(), vec!["Say 'OK' in one word.".to_string()]);
    }
}
