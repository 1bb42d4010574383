use thiserror::Error;

use crate::api_connection::ApiConnectionError;

/// Failure of one prompt flow.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("{flow}: model output did not match the expected shape: {source}")]
    Validation {
        flow: &'static str,
        source: serde_json::Error,
        raw: String,
    },

    #[error("{flow}: model returned no output")]
    EmptyOutput { flow: &'static str },

    #[error("{flow}: provider call failed: {source}")]
    Provider {
        flow: &'static str,
        source: ApiConnectionError,
    },
}

impl FlowError {
    pub fn flow(&self) -> &'static str {
        match self {
            FlowError::Validation { flow, .. }
            | FlowError::EmptyOutput { flow }
            | FlowError::Provider { flow, .. } => flow,
        }
    }
}
