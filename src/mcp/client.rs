// Copyright © 2025 Nipun Kumar

use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use dioxus::logger::tracing::{debug, info};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::OnceCell;

use super::jsonrpc::{self, RpcMessage};
use super::{ListToolsResult, McpError, McpTool, ResourceContents, ToolCallResult};

const SESSION_HEADER: &str = "mcp-session-id";
const PROTOCOL_VERSION: &str = "2025-06-18";

/// The three MCP operations the chat client consumes.
#[async_trait(?Send)]
pub trait McpClient {
    async fn list_tools(&self) -> Result<Vec<McpTool>, McpError>;

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult, McpError>;

    async fn read_resource(&self, uri: &str) -> Result<ResourceContents, McpError>;
}

/// JSON-RPC over HTTP POST, as spoken by streamable-HTTP MCP servers (and
/// by the proxy's `/mcp` route). Responses may be plain JSON or a
/// `text/event-stream` body.
pub struct HttpMcpClient {
    http: reqwest::Client,
    endpoint: String,
    next_id: Cell<u64>,
    session: RefCell<Option<String>>,
    initialized: OnceCell<Value>,
}

impl HttpMcpClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            next_id: Cell::new(1),
            session: RefCell::new(None),
            initialized: OnceCell::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Runs the `initialize` handshake once per client.
    async fn ensure_initialized(&self) -> Result<(), McpError> {
        self.initialized
            .get_or_try_init(|| async {
                let server_info = self
                    .request(
                        "initialize",
                        Some(json!({
                            "protocolVersion": PROTOCOL_VERSION,
                            "capabilities": {},
                            "clientInfo": {
                                "name": env!("CARGO_PKG_NAME"),
                                "version": env!("CARGO_PKG_VERSION"),
                            },
                        })),
                    )
                    .await?;
                self.post(&jsonrpc::notification("notifications/initialized"))
                    .await?;
                info!(endpoint = %self.endpoint, "MCP session initialised");
                Ok::<_, McpError>(server_info)
            })
            .await?;
        Ok(())
    }

    pub async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, McpError> {
        self.ensure_initialized().await?;
        self.request(method, (!params.is_null()).then_some(params))
            .await
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let id = json!(id);

        let resp = self.post(&jsonrpc::req(method, id.clone(), params)).await?;
        let is_stream = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));
        let body = resp.text().await?;

        let msg = if is_stream {
            jsonrpc::parse_event_stream(&body)
                .into_iter()
                .find(|m| m.response_id() == Some(&id))
        } else if body.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str::<RpcMessage>(&body)?)
        };
        debug!(%method, "rpc response received");
        msg.ok_or_else(|| McpError::MissingResponse(method.to_string()))?
            .into_result(method)
    }

    async fn post(&self, body: &impl Serialize) -> Result<reqwest::Response, McpError> {
        let mut builder = self
            .http
            .post(&self.endpoint)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(body);
        let session = self.session.borrow().clone();
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session);
        }

        let resp = builder.send().await?;
        if let Some(session) = resp
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            *self.session.borrow_mut() = Some(session.to_string());
        }

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(McpError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

#[async_trait(?Send)]
impl McpClient for HttpMcpClient {
    async fn list_tools(&self) -> Result<Vec<McpTool>, McpError> {
        let mut tools = vec![];
        let mut cursor: Option<String> = None;
        loop {
            let params = match &cursor {
                Some(c) => json!({ "cursor": c }),
                None => Value::Null,
            };
            let page: ListToolsResult =
                serde_json::from_value(self.rpc_call("tools/list", params).await?)?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() && cursor.as_ref() != Some(&next) => {
                    cursor = Some(next)
                }
                _ => break,
            }
        }
        Ok(tools)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult, McpError> {
        let params = json!({
            "name": name,
            "arguments": arguments,
        });
        let result = self.rpc_call("tools/call", params).await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn read_resource(&self, uri: &str) -> Result<ResourceContents, McpError> {
        let result = self
            .rpc_call("resources/read", json!({ "uri": uri }))
            .await?;
        Ok(serde_json::from_value(result)?)
    }
}
