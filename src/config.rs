use std::sync::Arc;
use std::time::Duration;

use crate::api_connection::endpoints::default_model;
use crate::api_connection::{ApiConnectionError, ChatProvider, FakeProvider, Provider};
use crate::cli::Cli;

/// Settings attached to every chat-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: default_model().to_string(),
            temperature: None,
            max_tokens: Some(2048),
        }
    }
}

/// Resolved runtime configuration (CLI flags over environment over defaults).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: String,
    pub api_key_env_var: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub model: ModelSettings,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            provider: cli.provider.clone(),
            api_key_env_var: cli.api_key_env_var.clone(),
            base_url: cli.base_url.clone(),
            timeout: cli.timeout_secs.map(Duration::from_secs),
            model: ModelSettings {
                model: cli.model.clone(),
                temperature: cli.temperature,
                max_tokens: cli.max_tokens.or(ModelSettings::default().max_tokens),
            },
        }
    }

    pub fn build_provider(&self) -> Result<Arc<dyn ChatProvider>, ApiConnectionError> {
        match self.provider.as_str() {
            "fake" => Ok(Arc::new(FakeProvider::with_kitchen_responses())),
            other => Ok(Arc::new(Provider::from_name(
                other,
                &self.api_key_env_var,
                &self.base_url,
                self.timeout,
            )?)),
        }
    }
}
