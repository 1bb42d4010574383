use async_trait::async_trait;
use reqwest::Client;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::endpoints::{
    ChatCompletionRequest, ChatCompletionResponse, OpenRouterAvailableModel, OPENROUTER_CHAT_URL,
    OPENROUTER_MODELS,
};
use super::ChatProvider;

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
}

#[derive(Clone, Debug)]
pub enum Provider {
    OpenRouter {
        /// Name of the environment variable holding the key, read on every call.
        api_key: String,
        base_url: String,
        available_models: Vec<OpenRouterAvailableModel>,
        client: Client,
    },
}

impl Provider {
    pub fn openrouter(api_key_env_var_name: &str) -> Self {
        Self::OpenRouter {
            api_key: api_key_env_var_name.to_string(),
            base_url: OPENROUTER_CHAT_URL.to_string(),
            available_models: OPENROUTER_MODELS.to_vec(),
            client: Client::new(),
        }
    }

    /// OpenRouter-compatible provider with an explicit endpoint and optional timeout.
    pub fn openrouter_with(
        api_key_env_var_name: &str,
        base_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiConnectionError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::OpenRouter {
            api_key: api_key_env_var_name.to_string(),
            base_url: base_url.to_string(),
            available_models: OPENROUTER_MODELS.to_vec(),
            client: builder.build()?,
        })
    }

    /// Builds a provider from its CLI/config name.
    pub fn from_name(
        name: &str,
        api_key_env_var_name: &str,
        base_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiConnectionError> {
        match name {
            "openrouter" => Self::openrouter_with(api_key_env_var_name, base_url, timeout),
            other => Err(ApiConnectionError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[async_trait]
impl ChatProvider for Provider {
    async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenRouter {
                api_key: api_key_env_var_name,
                base_url,
                available_models,
                client,
            } => {
                let actual_api_key = env::var(api_key_env_var_name)
                    .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var_name.clone()))?;

                if !available_models
                    .iter()
                    .any(|m| m.model_name == request.model)
                {
                    debug!(model = %request.model, "model not in known model table, sending anyway");
                }

                let site_url =
                    env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
                let app_name = env::var("APP_NAME").unwrap_or_else(|_| "FridgeFeast".to_string());

                let response = client
                    .post(base_url)
                    .bearer_auth(actual_api_key)
                    .header("HTTP-Referer", site_url)
                    .header("X-Title", app_name)
                    .json(&request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let body = response.text().await?;
                    let chat_response = serde_json::from_str::<ChatCompletionResponse>(&body)?;
                    Ok(chat_response)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    warn!(%status, "chat completion rejected by provider");
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        match self {
            Provider::OpenRouter { .. } => "openrouter",
        }
    }
}
