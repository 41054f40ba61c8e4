//! MCP server: newline-delimited JSON-RPC over any async reader/writer.
//!
//! [`serve_stdio`] binds the server to the process's stdin/stdout. Logs must
//! go to stderr, since stdout carries protocol frames.

use crate::client::ToolsClient;
use crate::error::MiddlemanError;
use crate::mcp::protocol::{
    text_result, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCallParams, ToolDefinition,
    JSONRPC_VERSION, MCP_PROTOCOL_VERSION,
};
use crate::models::{Presentation, Slide};
use crate::tools::{format_pages, TemplateDefaults};
use crate::PageSource;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Name reported in `initialize`.
pub const SERVER_NAME: &str = "Middleman Tools";

/// Dispatches MCP requests onto a [`ToolsClient`].
#[derive(Debug, Clone)]
pub struct McpServer {
    client: ToolsClient,
    defaults: TemplateDefaults,
}

/// Why a `tools/call` failed.
enum CallError {
    InvalidParams(String),
    Api(MiddlemanError),
}

impl From<MiddlemanError> for CallError {
    fn from(e: MiddlemanError) -> Self {
        Self::Api(e)
    }
}

impl From<CallError> for JsonRpcError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::InvalidParams(msg) => JsonRpcError::invalid_params(msg),
            CallError::Api(err) => JsonRpcError::from(&err),
        }
    }
}

// ── Tool arguments ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct MdToPdfArgs {
    markdown_text: String,
    #[serde(default)]
    pdf_template_id: Option<String>,
}

#[derive(Deserialize)]
struct MdToDocxArgs {
    markdown_text: String,
    #[serde(default)]
    docx_template_id: Option<String>,
}

#[derive(Deserialize)]
struct MdToPptxArgs {
    markdown_text: String,
}

#[derive(Deserialize)]
struct AnalyzeArgs {
    #[serde(default)]
    pptx_template_id: Option<String>,
}

#[derive(Deserialize)]
struct ExecuteArgs {
    #[serde(default)]
    pptx_template_id: Option<String>,
    slides: Vec<Slide>,
}

impl McpServer {
    pub fn new(client: ToolsClient, defaults: TemplateDefaults) -> Self {
        Self { client, defaults }
    }

    /// Tool catalogue returned by `tools/list`.
    pub fn tool_definitions() -> Vec<ToolDefinition> {
        fn def(name: &str, description: &str, input_schema: Value) -> ToolDefinition {
            ToolDefinition {
                name: name.to_string(),
                description: description.to_string(),
                input_schema,
            }
        }
        let markdown_schema = |template_field: Option<&str>| {
            let mut properties = json!({
                "markdown_text": {"type": "string", "description": "The Markdown text to convert"}
            });
            if let Some(field) = template_field {
                properties[field] = json!({
                    "type": "string",
                    "description": "Optional template ID (UUID); the default template is used when omitted"
                });
            }
            json!({"type": "object", "properties": properties, "required": ["markdown_text"]})
        };
        let file_schema = |field: &str, kind: &str| {
            json!({
                "type": "object",
                "properties": {field: {"type": "string", "description": format!("Path to the local {kind} file")}},
                "required": [field]
            })
        };

        vec![
            def(
                "md_to_pdf",
                "Convert Markdown text to PDF and return the download URL.",
                markdown_schema(Some("pdf_template_id")),
            ),
            def(
                "md_to_docx",
                "Convert Markdown text to DOCX and return the download URL.",
                markdown_schema(Some("docx_template_id")),
            ),
            def(
                "md_to_pptx",
                "Convert Markdown text to PPTX and return the download URL.",
                markdown_schema(None),
            ),
            def(
                "pdf_to_page_images",
                "Convert a PDF file to page images and return the image URLs.",
                file_schema("pdf_file_path", "PDF"),
            ),
            def(
                "pptx_to_page_images",
                "Convert a PPTX file to page images and return the image URLs.",
                file_schema("pptx_file_path", "PPTX"),
            ),
            def(
                "docx_to_page_images",
                "Convert a DOCX file to page images and return the image URLs.",
                file_schema("docx_file_path", "DOCX"),
            ),
            def(
                "json_to_pptx_analyze",
                "Analyze a PPTX template structure: slide types and their placeholders.",
                json!({
                    "type": "object",
                    "properties": {"pptx_template_id": {"type": "string", "description": "The template ID (UUID)"}},
                    "required": []
                }),
            ),
            def(
                "json_to_pptx_execute",
                "Generate a PPTX from JSON slide data using a template and return the download URL.",
                json!({
                    "type": "object",
                    "properties": {
                        "pptx_template_id": {"type": "string", "description": "The template ID (UUID)"},
                        "slides": {
                            "type": "array",
                            "description": "Slides with type and placeholders",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "type": {"type": "string"},
                                    "placeholders": {
                                        "type": "array",
                                        "items": {
                                            "type": "object",
                                            "properties": {
                                                "name": {"type": "string"},
                                                "content": {"type": "string"}
                                            },
                                            "required": ["name", "content"]
                                        }
                                    }
                                },
                                "required": ["type"]
                            }
                        }
                    },
                    "required": ["slides"]
                }),
            ),
        ]
    }

    /// Handle one raw line. Returns `None` for notifications and blank lines.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                warn!("Unparseable MCP message: {}", e);
                return Some(JsonRpcResponse::err(
                    Value::Null,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };
        self.handle_request(request).await
    }

    /// Handle one parsed request. Returns `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "notification");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::err(
                id,
                JsonRpcError::invalid_request(format!(
                    "Unsupported jsonrpc version '{}'",
                    request.jsonrpc
                )),
            ));
        }

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({"tools": Self::tool_definitions()})),
            "tools/call" => self.tools_call(request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::ok(id, result),
            Err(error) => JsonRpcResponse::err(id, error),
        })
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
        })
    }

    async fn tools_call(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: ToolCallParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("tools/call requires params"))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| JsonRpcError::invalid_params(e.to_string()))
            })?;

        info!(tool = %params.name, "tools/call");
        let text = self
            .call_tool(&params.name, params.arguments)
            .await
            .map_err(|e| {
                if let CallError::Api(err) = &e {
                    warn!(tool = %params.name, kind = %err.kind(), "tool call failed: {}", err);
                }
                JsonRpcError::from(e)
            })?;
        Ok(text_result(text))
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, CallError> {
        match name {
            "md_to_pdf" => {
                let a: MdToPdfArgs = args(arguments)?;
                let template = a.pdf_template_id.or_else(|| self.defaults.pdf.clone());
                Ok(self
                    .client
                    .md_to_pdf(&a.markdown_text, template.as_deref())
                    .await?)
            }
            "md_to_docx" => {
                let a: MdToDocxArgs = args(arguments)?;
                let template = a.docx_template_id.or_else(|| self.defaults.docx.clone());
                Ok(self
                    .client
                    .md_to_docx(&a.markdown_text, template.as_deref())
                    .await?)
            }
            "md_to_pptx" => {
                let a: MdToPptxArgs = args(arguments)?;
                Ok(self.client.md_to_pptx(&a.markdown_text).await?)
            }
            "pdf_to_page_images" => {
                self.page_images(arguments, "pdf_file_path", PageSource::Pdf)
                    .await
            }
            "pptx_to_page_images" => {
                self.page_images(arguments, "pptx_file_path", PageSource::Pptx)
                    .await
            }
            "docx_to_page_images" => {
                self.page_images(arguments, "docx_file_path", PageSource::Docx)
                    .await
            }
            "json_to_pptx_analyze" => {
                let a: AnalyzeArgs = args(arguments)?;
                let template = self.template_id(a.pptx_template_id)?;
                let slides = self.client.json_to_pptx_analyze(&template).await?;
                pretty_json(&slides)
            }
            "json_to_pptx_execute" => {
                let a: ExecuteArgs = args(arguments)?;
                let template = self.template_id(a.pptx_template_id)?;
                let presentation = Presentation::new(a.slides);
                Ok(self
                    .client
                    .json_to_pptx_execute(&template, &presentation)
                    .await?)
            }
            other => Err(CallError::InvalidParams(format!("Unknown tool: {other}"))),
        }
    }

    async fn page_images(
        &self,
        arguments: Value,
        field: &str,
        source: PageSource,
    ) -> Result<String, CallError> {
        let path = arguments
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| CallError::InvalidParams(format!("missing string argument '{field}'")))?;
        let pages = self.client.file_to_page_images(path, source, None).await?;
        // JSON keeps page_no/image_url pairs machine-readable; the text form is
        // appended for models that only skim.
        let mut text = pretty_json(&pages)?;
        text.push_str("\n\n");
        text.push_str(&format_pages(&pages));
        Ok(text)
    }

    fn template_id(&self, given: Option<String>) -> Result<String, CallError> {
        given
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.defaults.pptx.clone())
            .ok_or_else(|| CallError::InvalidParams("pptx_template_id is required".into()))
    }

    /// Serve requests from `reader` until EOF, writing one response per line.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(response) = self.handle_line(&line).await {
                let mut frame = serde_json::to_vec(&response)?;
                frame.push(b'\n');
                writer.write_all(&frame).await?;
                writer.flush().await?;
            }
        }
        info!("stdin closed; MCP server stopping");
        Ok(())
    }
}

/// Run `server` on the process's stdin/stdout.
pub async fn serve_stdio(server: &McpServer) -> std::io::Result<()> {
    info!("{} MCP server listening on stdio", SERVER_NAME);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    server.serve(stdin, tokio::io::stdout()).await
}

fn args<T: DeserializeOwned>(arguments: Value) -> Result<T, CallError> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments).map_err(|e| CallError::InvalidParams(e.to_string()))
}

fn pretty_json<T: serde::Serialize>(value: &T) -> Result<String, CallError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CallError::Api(MiddlemanError::validation(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientConfig;

    fn server() -> McpServer {
        // Nothing listens on port 9; tests here never reach the network.
        let config = ClientConfig::builder()
            .api_key("k")
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        McpServer::new(ToolsClient::new(config).unwrap(), TemplateDefaults::default())
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let resp = server()
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "Middleman Tools");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn tools_list_names() {
        let resp = server()
            .handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
            .await
            .unwrap();
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec![
                "md_to_pdf",
                "md_to_docx",
                "md_to_pptx",
                "pdf_to_page_images",
                "pptx_to_page_images",
                "docx_to_page_images",
                "json_to_pptx_analyze",
                "json_to_pptx_execute",
            ]
        );
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let s = server();
        assert!(s
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .is_none());
        assert!(s.handle_line("   ").await.is_none());
    }

    #[tokio::test]
    async fn parse_error_has_null_id() {
        let resp = server().handle_line("{not json").await.unwrap();
        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn unknown_method_and_tool() {
        let s = server();
        let resp = s
            .handle_line(r#"{"jsonrpc":"2.0","id":"a","method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(resp.id, json!("a"));
        assert_eq!(resp.error.unwrap().code, -32601);

        let resp = s
            .handle_line(
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#,
            )
            .await
            .unwrap();
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32602);
        assert!(err.message.contains("nope"));
    }

    #[tokio::test]
    async fn missing_arguments_are_invalid_params() {
        let s = server();
        let resp = s
            .handle_line(
                r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"md_to_pdf","arguments":{}}}"#,
            )
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, -32602);

        let resp = s
            .handle_line(
                r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"json_to_pptx_analyze","arguments":{}}}"#,
            )
            .await
            .unwrap();
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32602);
        assert!(err.message.contains("pptx_template_id"));
    }

    #[tokio::test]
    async fn unreadable_file_surfaces_validation_kind() {
        let resp = server()
            .handle_line(
                r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"pdf_to_page_images","arguments":{"pdf_file_path":"/no/such/file.pdf"}}}"#,
            )
            .await
            .unwrap();
        let err = resp.error.unwrap();
        assert_eq!(err.code, crate::mcp::protocol::TOOL_EXECUTION_ERROR);
        assert_eq!(err.data.unwrap()["kind"], "validation");
    }

    #[tokio::test]
    async fn execute_accepts_slides_without_placeholders() {
        let resp = server()
            .handle_line(
                r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"json_to_pptx_execute","arguments":{"pptx_template_id":"tpl","slides":[{"type":"title_slide","title":"Test"}]}}}"#,
            )
            .await
            .unwrap();
        // Arguments are accepted; the call only fails at the (absent) server.
        let err = resp.error.unwrap();
        assert_eq!(err.code, crate::mcp::protocol::TOOL_EXECUTION_ERROR);
        assert_eq!(err.data.unwrap()["kind"], "connection");
    }

    #[tokio::test]
    async fn serve_writes_one_line_per_response() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );
        let mut out = Vec::new();
        server().serve(input.as_bytes(), &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: JsonRpcResponse = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.id, json!(2));
    }
}
