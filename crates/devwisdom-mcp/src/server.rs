use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Instant;

use devwisdom_core::{SourceLoader, WisdomEngine, WisdomProvider};
use devwisdom_log::{Clock, ConsultationLog, SystemClock};
use serde_json::{json, Value};

use crate::catalog::{resources_list_result, tools_list_result};
use crate::config::ServerConfig;
use crate::error::ToolError;
use crate::handlers::{tool_error_result, tool_result, WisdomHandlers};
use crate::protocol::{
    params_object, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Message,
    JSONRPC_VERSION,
};

const DEFAULT_MCP_PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "devwisdom";

/// JSON-RPC front end: one message in, at most one response out.
pub struct WisdomServer {
    handlers: WisdomHandlers,
}

impl WisdomServer {
    /// Builds the server from `config`. A log directory that cannot be
    /// created only disables consultation logging.
    pub fn new(config: &ServerConfig) -> Self {
        let engine = WisdomEngine::new(
            SourceLoader::standard(config.source_paths.clone()),
            config.sources_cache_ttl,
        );
        let log = if config.consultation_log {
            match ConsultationLog::open(&config.log_dir) {
                Ok(log) => Some(Arc::new(log)),
                Err(err) => {
                    tracing::warn!("consultation log disabled: {err}");
                    None
                }
            }
        } else {
            None
        };
        Self::with_parts(Arc::new(engine), log, Arc::new(SystemClock), config)
    }

    pub fn from_env() -> Self {
        Self::new(&ServerConfig::from_env())
    }

    pub fn with_parts(
        provider: Arc<dyn WisdomProvider>,
        log: Option<Arc<ConsultationLog>>,
        clock: Arc<dyn Clock>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            handlers: WisdomHandlers::new(provider, log, clock, config),
        }
    }

    /// Handles one decoded JSON value. `None` means nothing is written back.
    pub fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        match Message::from_value(value) {
            Ok(message) => self.handle_message(message),
            Err(invalid) => {
                let id = invalid.id?;
                Some(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request(invalid.reason),
                ))
            }
        }
    }

    pub fn handle_message(&self, message: Message) -> Option<JsonRpcResponse> {
        match message {
            Message::Request(request) => Some(self.handle_request(request)),
            Message::Notification(notification) => {
                self.handle_notification(notification);
                None
            }
        }
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        if request.jsonrpc != JSONRPC_VERSION {
            return JsonRpcResponse::failure(
                request.id,
                JsonRpcError::invalid_request(format!(
                    "invalid jsonrpc version {:?}; expected \"{JSONRPC_VERSION}\"",
                    request.jsonrpc
                )),
            );
        }

        let start = Instant::now();
        let result = self.dispatch(&request.method, &request.params);
        tracing::debug!(
            id = %request.id,
            method = %request.method,
            ok = result.is_ok(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "handled request"
        );
        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(err) => JsonRpcResponse::failure(request.id, err),
        }
    }

    /// Runs a notification for its side effects; the outcome is only traced.
    pub fn handle_notification(&self, notification: JsonRpcNotification) {
        if notification.jsonrpc != JSONRPC_VERSION {
            tracing::debug!(method = %notification.method, "ignoring notification with bad version");
            return;
        }
        if let Err(err) = self.dispatch(&notification.method, &notification.params) {
            tracing::debug!(method = %notification.method, "notification not handled: {err}");
        }
    }

    fn dispatch(&self, method: &str, params: &Value) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => initialize_result(params),
            "tools/list" => Ok(tools_list_result()),
            "tools/call" => self.handle_tools_call(params),
            "resources/list" => Ok(resources_list_result()),
            "resources/read" => self.handle_resources_read(params),
            _ => Err(JsonRpcError::method_not_found(method)),
        }
    }

    fn handle_tools_call(&self, params: &Value) -> Result<Value, JsonRpcError> {
        let params = params_object(params)?;
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return Err(JsonRpcError::invalid_params(
                "tools/call requires a string \"name\"",
            ));
        };
        match self.handlers.call_tool(name, params.get("arguments")) {
            Ok(payload) => tool_result(payload).map_err(JsonRpcError::from),
            Err(ToolError::Domain(message)) => Ok(tool_error_result(&message)),
            Err(err) => Err(err.into()),
        }
    }

    fn handle_resources_read(&self, params: &Value) -> Result<Value, JsonRpcError> {
        let params = params_object(params)?;
        let Some(uri) = params.get("uri").and_then(Value::as_str) else {
            return Err(JsonRpcError::invalid_params(
                "resources/read requires a string \"uri\"",
            ));
        };
        self.handlers.read_resource(uri).map_err(JsonRpcError::from)
    }

    /// Reads newline-delimited messages until end of input.
    ///
    /// Undecodable JSON gets one Parse Error response with a null id and
    /// stops the loop, since the stream position can no longer be trusted.
    pub fn serve<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> io::Result<()> {
        let mut line = String::new();
        let outcome = loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break Ok(()),
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                    break reject_unparsable(&mut writer, &err);
                }
                Err(err) => break Err(err),
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let value: Value = match serde_json::from_str(trimmed) {
                Ok(v) => v,
                Err(err) => break reject_unparsable(&mut writer, &err),
            };

            if let Some(response) = self.handle_value(value) {
                if let Err(err) = write_response(&mut writer, &response) {
                    break Err(err);
                }
            }
        };
        self.shutdown();
        outcome
    }

    pub fn serve_stdio(&self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Releases the consultation log handle.
    pub fn shutdown(&self) {
        if let Some(log) = self.handlers.log() {
            log.close();
        }
    }
}

impl Default for WisdomServer {
    fn default() -> Self {
        Self::from_env()
    }
}

fn initialize_result(params: &Value) -> Result<Value, JsonRpcError> {
    let params = params_object(params)?;
    let protocol_version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_MCP_PROTOCOL_VERSION);
    Ok(json!({
        "protocolVersion": protocol_version,
        "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
        "capabilities": {
            "tools": {
                "listChanged": false
            },
            "resources": {
                "subscribe": false,
                "listChanged": false
            }
        }
    }))
}

fn reject_unparsable<W: Write>(writer: &mut W, err: &dyn std::error::Error) -> io::Result<()> {
    tracing::warn!("parse error, closing session: {err}");
    let response = JsonRpcResponse::failure(
        Value::Null,
        JsonRpcError::parse_error(format!("parse error: {err}")),
    );
    write_response(writer, &response)
}

fn write_response<W: Write>(writer: &mut W, response: &JsonRpcResponse) -> io::Result<()> {
    let serialized = serde_json::to_string(response)?;
    writeln!(writer, "{serialized}")?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};

    fn server() -> WisdomServer {
        WisdomServer::with_parts(
            Arc::new(WisdomEngine::builtin()),
            None,
            Arc::new(SystemClock),
            &ServerConfig::default(),
        )
    }

    fn run(input: &str) -> Vec<Value> {
        let mut out = Vec::new();
        server().serve(input.as_bytes(), &mut out).expect("serve");
        String::from_utf8(out)
            .expect("utf8")
            .lines()
            .map(|l| serde_json::from_str(l).expect("response json"))
            .collect()
    }

    #[test]
    fn requests_are_answered_in_order_and_notifications_are_not() {
        let responses = run(concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n",
            "\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"no/such/method\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":\"b\",\"method\":\"resources/list\"}\n",
        ));
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], "b");
        assert_eq!(responses[1]["result"]["resources"].as_array().map(Vec::len), Some(5));
    }

    #[test]
    fn parse_error_stops_the_loop() {
        let responses = run(concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n",
            "{not json\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n",
        ));
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[1]["id"], Value::Null);
        assert_eq!(responses[1]["error"]["code"], PARSE_ERROR);
    }

    #[test]
    fn wrong_version_and_bad_envelopes_are_invalid_requests() {
        let responses = run(concat!(
            "{\"jsonrpc\":\"1.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"consult_advisor\"}}\n",
            "[1,2,3]\n",
            "{\"jsonrpc\":\"2.0\",\"id\":3}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":null,\"method\":\"bogus\"}\n",
        ));
        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["error"]["code"], INVALID_REQUEST);
        assert_eq!(responses[1]["error"]["code"], INVALID_REQUEST);
        assert_eq!(responses[2]["id"], 3);
        assert_eq!(responses[2]["error"]["code"], INVALID_REQUEST);
        assert_eq!(responses[3]["id"], Value::Null);
        assert_eq!(responses[3]["error"]["code"], METHOD_NOT_FOUND);
        assert!(responses[3]["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("bogus")));
    }

    #[test]
    fn initialize_echoes_protocol_version() {
        let response = server().handle_request(JsonRpcRequest::new(
            1,
            "initialize",
            json!({"protocolVersion": "2025-03-26", "capabilities": {}, "clientInfo": {"name": "t"}}),
        ));
        let result = response.result.expect("result");
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"]["name"], "devwisdom");
        assert_eq!(result["capabilities"]["resources"]["subscribe"], false);

        let default = server().handle_request(JsonRpcRequest::new(2, "initialize", Value::Null));
        assert_eq!(
            default.result.expect("result")["protocolVersion"],
            DEFAULT_MCP_PROTOCOL_VERSION
        );
    }
}
