use serde_json::Value;
use thiserror::Error;

use crate::protocol::JsonRpcError;

/// Failure of a single tool call or resource read.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Caller error, answered with a JSON-RPC Invalid Params error.
    #[error("{message}")]
    InvalidParams {
        message: String,
        data: Option<Value>,
    },
    /// Lookup failure with no fallback, answered with an `isError` result.
    #[error("{0}")]
    Domain(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ToolError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
            data: None,
        }
    }

    pub fn invalid_params_with(message: impl Into<String>, data: Value) -> Self {
        Self::InvalidParams {
            message: message.into(),
            data: Some(data),
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<ToolError> for JsonRpcError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::InvalidParams { message, data } => {
                let rpc = Self::invalid_params(message);
                match data {
                    Some(data) => rpc.with_data(data),
                    None => rpc,
                }
            }
            ToolError::Domain(message) | ToolError::Internal(message) => Self::internal(message),
        }
    }
}
