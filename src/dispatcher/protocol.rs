//! JSON-RPC 2.0 envelope types for the line-delimited stdio transport.

use crate::constants;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: constants::JSONRPC_VERSION, id, result: Some(result), error: None }
    }

    #[must_use]
    pub fn fault(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self { jsonrpc: constants::JSONRPC_VERSION, id, result: None, error: Some(RpcError { code, message: message.into(), data: None }) }
    }
}

/// Parses one line of input into a request, or a ready-to-send `parse
/// error` response if the line is not valid JSON-RPC.
///
/// # Errors
/// Returns the fault response (not a `Result::Err` in the usual sense —
/// it is already the wire-ready reply) when `line` does not parse.
pub fn parse_line(line: &str) -> Result<RpcRequest, RpcResponse> {
    serde_json::from_str::<RpcRequest>(line)
        .map_err(|e| RpcResponse::fault(Value::Null, constants::JSONRPC_PARSE_ERROR, format!("parse error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_request() {
        let req = parse_line(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}}"#).unwrap();
        assert_eq!(req.method, "tools/list");
    }

    #[test]
    fn malformed_json_yields_parse_error_response() {
        let err = parse_line("not json").unwrap_err();
        assert_eq!(err.error.unwrap().code, constants::JSONRPC_PARSE_ERROR);
    }

    #[test]
    fn success_response_omits_error_field() {
        let resp = RpcResponse::success(serde_json::json!(1), serde_json::json!({"ok": true}));
        let rendered = serde_json::to_string(&resp).unwrap();
        assert!(!rendered.contains("\"error\""));
    }

    #[test]
    fn fault_response_omits_result_field() {
        let resp = RpcResponse::fault(Value::Null, constants::JSONRPC_METHOD_NOT_FOUND, "no such method");
        let rendered = serde_json::to_string(&resp).unwrap();
        assert!(!rendered.contains("\"result\""));
    }
}
