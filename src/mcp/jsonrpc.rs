use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::McpError;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RpcRequest {
    pub jsonrpc: String,
    // notifications carry no id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RpcSuccess {
    pub jsonrpc: String,
    pub id: Value,
    pub result: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RpcErrorObj {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RpcError {
    pub jsonrpc: String,
    pub id: Value,
    pub error: RpcErrorObj,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum RpcMessage {
    Ok(RpcSuccess),
    Err(RpcError),
    Req(RpcRequest),
}

impl RpcMessage {
    /// Id of a response, `None` for server-initiated requests and notifications.
    pub fn response_id(&self) -> Option<&Value> {
        match self {
            RpcMessage::Ok(ok) => Some(&ok.id),
            RpcMessage::Err(err) => Some(&err.id),
            RpcMessage::Req(_) => None,
        }
    }

    pub fn into_result(self, method: &str) -> Result<Value, McpError> {
        match self {
            RpcMessage::Ok(ok) => Ok(ok.result),
            RpcMessage::Err(e) => Err(McpError::Rpc {
                method: method.to_string(),
                code: e.error.code,
                message: e.error.message,
            }),
            RpcMessage::Req(r) => Err(McpError::UnexpectedRequest(r.method)),
        }
    }
}

pub fn req(method: &str, id: Value, params: Option<Value>) -> RpcRequest {
    RpcRequest {
        jsonrpc: "2.0".into(),
        id: Some(id),
        method: method.into(),
        params,
    }
}

pub fn notification(method: &str) -> RpcRequest {
    RpcRequest {
        jsonrpc: "2.0".into(),
        id: None,
        method: method.into(),
        params: None,
    }
}

/// Splits a `text/event-stream` body into the JSON-RPC messages carried by
/// its `data:` fields. Multi-line data fields are joined with `\n`; events
/// whose data is not a JSON-RPC message are skipped.
pub fn parse_event_stream(body: &str) -> Vec<RpcMessage> {
    let mut messages = vec![];
    let mut data: Vec<&str> = vec![];
    let mut flush = |data: &mut Vec<&str>| {
        if data.is_empty() {
            return;
        }
        let joined = data.join("\n");
        data.clear();
        match serde_json::from_str::<RpcMessage>(&joined) {
            Ok(msg) => messages.push(msg),
            Err(e) => dioxus::logger::tracing::debug!("skipping non-rpc event: {e}"),
        }
    };
    for line in body.lines() {
        if line.is_empty() {
            flush(&mut data);
        } else if let Some(rest) = line.strip_prefix("data:") {
            data.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    flush(&mut data);
    messages
}
