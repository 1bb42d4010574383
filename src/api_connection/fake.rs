//! Canned-reply provider for tests and offline runs.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use super::endpoints::{ChatCompletionRequest, ChatCompletionResponse};
use super::{ApiConnectionError, ChatProvider};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Failure(String),
}

/// Answers requests whose prompt contains a registered substring
/// (case-insensitive, first registration wins). Every request is recorded.
#[derive(Debug, Default)]
pub struct FakeProvider {
    replies: Vec<(String, Reply)>,
    default_reply: Option<String>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, prompt_contains: &str, response: &str) -> Self {
        self.replies
            .push((prompt_contains.to_lowercase(), Reply::Text(response.to_string())));
        self
    }

    /// Requests matching `prompt_contains` fail with a 500 carrying `message`.
    pub fn with_failure(mut self, prompt_contains: &str, message: &str) -> Self {
        self.replies
            .push((prompt_contains.to_lowercase(), Reply::Failure(message.to_string())));
        self
    }

    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_reply = Some(response.to_string());
        self
    }

    /// Replies for both recipe flows, used by `--provider fake`.
    pub fn with_kitchen_responses() -> Self {
        Self::new()
            .with_response(
                "world-class chef",
                r#"{"recipes": [
                    {"name": "Chicken Fried Rice", "instructions": "Stir-fry the rice with diced chicken and broccoli.", "requiredIngredients": ["chicken", "rice", "broccoli", "soy sauce"]},
                    {"name": "Broccoli Chicken Bake", "instructions": "Bake chicken and broccoli over cooked rice.", "requiredIngredients": ["chicken", "broccoli", "rice", "cheese"]}
                ]}"#,
            )
            .with_response(
                "recipe ranking expert",
                r#"[
                    {"recipe": "Chicken Fried Rice", "rank": 9, "reason": "Uses every listed ingredient."},
                    {"recipe": "Broccoli Chicken Bake", "rank": 7, "reason": "Needs cheese."}
                ]"#,
            )
    }

    /// Snapshot of every request received so far.
    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.lock_requests().clone()
    }

    /// Number of received requests whose prompt contains `needle` (case-insensitive).
    pub fn count_matching(&self, needle: &str) -> usize {
        let needle = needle.to_lowercase();
        self.lock_requests()
            .iter()
            .filter(|r| r.prompt_text().to_lowercase().contains(&needle))
            .count()
    }

    fn lock_requests(&self) -> MutexGuard<'_, Vec<ChatCompletionRequest>> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ChatProvider for FakeProvider {
    async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        let prompt = request.prompt_text().to_lowercase();
        let model = request.model.clone();
        self.lock_requests().push(request);

        let reply = self
            .replies
            .iter()
            .find(|(pattern, _)| prompt.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
            .or_else(|| self.default_reply.clone().map(Reply::Text));

        match reply {
            Some(Reply::Text(text)) => Ok(ChatCompletionResponse::from_text(&model, text)),
            Some(Reply::Failure(message)) => Err(ApiConnectionError::ApiError {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                error_body: message,
            }),
            None => Err(ApiConnectionError::ApiError {
                status: reqwest::StatusCode::NOT_FOUND,
                error_body: format!(
                    "FakeProvider: no response configured for prompt: {}",
                    prompt.chars().take(100).collect::<String>()
                ),
            }),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_connection::endpoints::ChatMessage;

    fn request(text: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "fake-model".to_string(),
            messages: vec![ChatMessage::user(text)],
            response_format: None,
            temperature: None,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn matches_case_insensitively_and_records() {
        let provider = FakeProvider::new().with_response("HELLO", "world");
        let response = provider
            .call_chat_completion(request("hello there"))
            .await
            .unwrap();
        assert_eq!(response.first_content(), Some("world"));
        assert_eq!(provider.requests().len(), 1);
        assert_eq!(provider.count_matching("THERE"), 1);
    }

    #[tokio::test]
    async fn unmatched_prompt_without_default_fails() {
        let provider = FakeProvider::new();
        let result = provider.call_chat_completion(request("anything")).await;
        assert!(matches!(result, Err(ApiConnectionError::ApiError { .. })));
    }

    #[tokio::test]
    async fn registered_failure_is_returned() {
        let provider = FakeProvider::new()
            .with_failure("boom", "provider down")
            .with_default_response("fine");
        let result = provider.call_chat_completion(request("boom")).await;
        match result {
            Err(ApiConnectionError::ApiError { status, error_body }) => {
                assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(error_body, "provider down");
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
        let ok = provider.call_chat_completion(request("calm")).await.unwrap();
        assert_eq!(ok.first_content(), Some("fine"));
    }
}
