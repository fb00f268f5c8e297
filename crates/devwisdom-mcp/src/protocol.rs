use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// A message carrying an `id`. A present `null` id still counts.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

/// A decoded JSON value that is not a valid JSON-RPC message.
///
/// `id` is `None` when the message had no usable id, in which case it is
/// treated like a notification and gets no response.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidMessage {
    pub id: Option<Value>,
    pub reason: String,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

impl Message {
    pub fn from_value(value: Value) -> Result<Self, InvalidMessage> {
        let Value::Object(mut object) = value else {
            return Err(InvalidMessage {
                id: Some(Value::Null),
                reason: "message must be a JSON object".to_string(),
            });
        };

        let id = match object.remove("id") {
            None => None,
            Some(id @ (Value::Null | Value::String(_) | Value::Number(_))) => Some(id),
            Some(_) => {
                return Err(InvalidMessage {
                    id: Some(Value::Null),
                    reason: "id must be a string, number or null".to_string(),
                })
            }
        };
        let Some(Value::String(method)) = object.remove("method") else {
            return Err(InvalidMessage {
                id,
                reason: "method must be a string".to_string(),
            });
        };
        let jsonrpc = match object.remove("jsonrpc") {
            Some(Value::String(v)) => v,
            _ => String::new(),
        };
        let params = object.remove("params").unwrap_or(Value::Null);

        Ok(match id {
            Some(id) => Self::Request(JsonRpcRequest {
                jsonrpc,
                id,
                method,
                params,
            }),
            None => Self::Notification(JsonRpcNotification {
                jsonrpc,
                method,
                params,
            }),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{message} ({code})")]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("method not found: {method:?}"))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Views `params` as an object; absent params read as an empty map.
pub fn params_object(params: &Value) -> Result<Map<String, Value>, JsonRpcError> {
    match params {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map.clone()),
        _ => Err(JsonRpcError::invalid_params("params must be an object")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn absent_id_is_a_notification_but_null_id_is_a_request() {
        let note = Message::from_value(json!({"jsonrpc":"2.0","method":"ping"})).expect("note");
        assert!(matches!(note, Message::Notification(_)));

        let req = Message::from_value(json!({"jsonrpc":"2.0","id":null,"method":"ping"}))
            .expect("request");
        assert!(matches!(req, Message::Request(ref r) if r.id == Value::Null));
    }

    #[test]
    fn malformed_envelopes_are_invalid() {
        let err = Message::from_value(json!([1, 2])).expect_err("array");
        assert_eq!(err.id, Some(Value::Null));

        let err = Message::from_value(json!({"jsonrpc":"2.0","id":{"a":1},"method":"x"}))
            .expect_err("object id");
        assert_eq!(err.id, Some(Value::Null));

        let err = Message::from_value(json!({"jsonrpc":"2.0","id":7})).expect_err("no method");
        assert_eq!(err.id, Some(json!(7)));

        let err = Message::from_value(json!({"jsonrpc":"2.0","method":3})).expect_err("bad method");
        assert_eq!(err.id, None);
    }

    #[test]
    fn response_serializes_result_xor_error() {
        let ok = serde_json::to_value(JsonRpcResponse::success(json!(1), json!({"a": 1})))
            .expect("serialize ok");
        assert_eq!(ok, json!({"jsonrpc":"2.0","id":1,"result":{"a":1}}));

        let err = JsonRpcResponse::failure(
            json!("x"),
            JsonRpcError::invalid_params("bad").with_data(json!({"k": 1})),
        );
        let err = serde_json::to_value(err).expect("serialize err");
        assert_eq!(
            err,
            json!({"jsonrpc":"2.0","id":"x","error":{"code":-32602,"message":"bad","data":{"k":1}}})
        );
    }
}
