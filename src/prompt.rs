//! Schema-validated prompt invocation.
//!
//! A [`StructuredPrompt`] is one rendered request: instructions, user text and the
//! JSON schema the answer must follow. [`invoke`] sends it and deserializes the
//! model's text into the caller's output type, rejecting anything that does not fit.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api_connection::endpoints::{
    ChatCompletionRequest, ChatMessage, JsonSchemaDefinition, ResponseFormat,
};
use crate::api_connection::ChatProvider;
use crate::config::ModelSettings;
use crate::error::FlowError;

#[derive(Debug, Clone)]
pub struct StructuredPrompt {
    /// Flow name, used in logs and errors.
    pub name: &'static str,
    pub system: String,
    pub user: String,
    pub schema: JsonSchemaDefinition,
}

impl StructuredPrompt {
    pub fn to_request(&self, settings: &ModelSettings) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: settings.model.clone(),
            messages: vec![
                ChatMessage::system(self.system.clone()),
                ChatMessage::user(self.user.clone()),
            ],
            response_format: Some(ResponseFormat::json_schema(self.schema.clone())),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

pub async fn invoke<O: DeserializeOwned>(
    provider: &dyn ChatProvider,
    settings: &ModelSettings,
    prompt: &StructuredPrompt,
) -> Result<O, FlowError> {
    debug!(
        flow = prompt.name,
        provider = provider.provider_name(),
        model = %settings.model,
        "invoking prompt"
    );
    let response = provider
        .call_chat_completion(prompt.to_request(settings))
        .await
        .map_err(|source| FlowError::Provider {
            flow: prompt.name,
            source,
        })?;

    let Some(content) = response.first_content() else {
        warn!(flow = prompt.name, "no content in model response");
        return Err(FlowError::EmptyOutput { flow: prompt.name });
    };
    parse_output(prompt.name, content)
}

/// Deserializes raw model text into `O` after removing wrappers models like to add.
pub fn parse_output<O: DeserializeOwned>(flow: &'static str, raw: &str) -> Result<O, FlowError> {
    debug!(flow, raw = %raw, "raw model response");
    let content = strip_code_fences(strip_think_block(raw.trim()));
    if content.is_empty() {
        warn!(flow, "model response empty after stripping wrappers");
        return Err(FlowError::EmptyOutput { flow });
    }

    serde_json::from_str(content).map_err(|source| {
        warn!(flow, error = %source, "model output failed validation");
        FlowError::Validation {
            flow,
            source,
            raw: content.to_string(),
        }
    })
}

/// Removes a surrounding ```` ``` ```` or ```` ```json ```` fence.
pub fn strip_code_fences(content: &str) -> &str {
    let content = content.trim();
    if !(content.starts_with("```") && content.ends_with("```") && content.len() >= 6) {
        return content;
    }
    let inner = &content[3..content.len() - 3];
    inner
        .strip_prefix("json")
        .or_else(|| inner.strip_prefix("JSON"))
        .unwrap_or(inner)
        .trim()
}

/// Drops a leading `<think>...</think>` block emitted by reasoning models.
fn strip_think_block(content: &str) -> &str {
    if let Some(rest) = content.strip_prefix("<think>") {
        if let Some(end) = rest.find("</think>") {
            return rest[end + "</think>".len()..].trim();
        }
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Answer {
        value: u32,
    }

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```"), "```");
    }

    #[test]
    fn think_block_is_dropped_before_parsing() {
        let answer: Answer =
            parse_output("test", "<think>counting...</think>\n```json\n{\"value\": 3}\n```")
                .unwrap();
        assert_eq!(answer, Answer { value: 3 });
    }

    #[test]
    fn non_conforming_output_is_a_validation_error() {
        let err = parse_output::<Answer>("test", "{\"value\": \"three\"}").unwrap_err();
        match err {
            FlowError::Validation { flow, raw, .. } => {
                assert_eq!(flow, "test");
                assert_eq!(raw, "{\"value\": \"three\"}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn blank_output_is_empty() {
        let err = parse_output::<Answer>("test", "```json\n```").unwrap_err();
        assert!(matches!(err, FlowError::EmptyOutput { flow: "test" }));
    }
}
