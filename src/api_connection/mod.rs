//! Chat-completion providers.
//!
//! `Provider` talks to an OpenAI-compatible endpoint (OpenRouter by default);
//! `FakeProvider` answers from canned replies so flows can run offline.

pub mod connection;
pub mod endpoints;
pub mod fake;

pub use connection::{ApiConnectionError, Provider};
pub use fake::FakeProvider;

use async_trait::async_trait;
use std::fmt;

use endpoints::{ChatCompletionRequest, ChatCompletionResponse};

/// Something that can answer a chat-completion request.
///
/// Implementations must be shareable across request handlers.
#[async_trait]
pub trait ChatProvider: Send + Sync + fmt::Debug {
    async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError>;

    /// Short provider name for logs ("openrouter", "fake").
    fn provider_name(&self) -> &'static str;
}
