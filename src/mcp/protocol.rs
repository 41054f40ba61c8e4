//! JSON-RPC 2.0 message types for the MCP server.
//!
//! Only serialization lives here; reading and writing lines is the server's
//! job.
//!
//! - JSON-RPC 2.0: <https://www.jsonrpc.org/specification>
//! - MCP: <https://modelcontextprotocol.io/specification/2024-11-05>

use crate::error::MiddlemanError;
use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP revision this server speaks.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Error code for a failed API call inside `tools/call`.
pub const TOOL_EXECUTION_ERROR: i32 = -32000;

/// A JSON-RPC 2.0 request or notification.
///
/// Notifications have no `id` and receive no response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,

    /// Number or string; absent for notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,

    pub method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// A JSON-RPC 2.0 response: exactly one of `result` / `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,

    /// Echoes the request id; `null` when the request could not be parsed.
    pub id: serde_json::Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn ok(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: serde_json::Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// A JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Parse error (-32700): Invalid JSON was received
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(-32700, message)
    }

    /// Invalid request (-32600): The JSON sent is not a valid Request object
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(-32600, message)
    }

    /// Method not found (-32601)
    pub fn method_not_found(method: &str) -> Self {
        Self::new(-32601, format!("Method not found: {method}"))
    }

    /// Invalid params (-32602)
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(-32602, message)
    }
}

impl From<&MiddlemanError> for JsonRpcError {
    /// The error kind and HTTP status travel in `data` so clients can branch
    /// on them without parsing the message.
    fn from(err: &MiddlemanError) -> Self {
        Self {
            code: TOOL_EXECUTION_ERROR,
            message: err.to_string(),
            data: Some(serde_json::json!({
                "kind": err.kind(),
                "status": err.status(),
            })),
        }
    }
}

/// Tool definition advertised by `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// `tools/call` parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Text-only `tools/call` result.
pub fn text_result(text: impl Into<String>) -> serde_json::Value {
    serde_json::json!({
        "content": [{"type": "text", "text": text.into()}],
        "isError": false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_without_id_is_notification() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(req.is_notification());
        assert!(req.params.is_none());
    }

    #[test]
    fn string_ids_are_kept() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":"abc","method":"ping"}"#).unwrap();
        assert_eq!(req.id, Some(json!("abc")));
    }

    #[test]
    fn success_response_has_no_error_field() {
        let json = serde_json::to_string(&JsonRpcResponse::ok(json!(1), json!({}))).unwrap();
        assert!(json.contains("\"result\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn error_codes() {
        assert_eq!(JsonRpcError::parse_error("x").code, -32700);
        assert_eq!(JsonRpcError::invalid_request("x").code, -32600);
        assert_eq!(JsonRpcError::method_not_found("x").code, -32601);
        assert_eq!(JsonRpcError::invalid_params("x").code, -32602);
    }

    #[test]
    fn api_error_keeps_kind_and_status() {
        let err = MiddlemanError::NotEnoughCredit { message: None };
        let rpc = JsonRpcError::from(&err);
        assert_eq!(rpc.code, TOOL_EXECUTION_ERROR);
        assert_eq!(rpc.message, "Not enough credit");
        assert_eq!(rpc.data, Some(json!({"kind": "not_enough_credit", "status": 402})));
    }

    #[test]
    fn remote_validation_keeps_its_status() {
        let err = MiddlemanError::from_status(422, Some("bad slides".into())).unwrap();
        let rpc = JsonRpcError::from(&err);
        assert_eq!(rpc.data, Some(json!({"kind": "validation", "status": 422})));

        let local = JsonRpcError::from(&MiddlemanError::validation("bad input"));
        assert_eq!(local.data, Some(json!({"kind": "validation", "status": null})));
    }

    #[test]
    fn text_result_shape() {
        assert_eq!(
            text_result("https://example.com/a.pdf"),
            json!({"content": [{"type": "text", "text": "https://example.com/a.pdf"}], "isError": false})
        );
    }
}
