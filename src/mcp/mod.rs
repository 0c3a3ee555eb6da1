// Copyright © 2025 Nipun Kumar

mod client;
mod error;
mod jsonrpc;

pub use client::{HttpMcpClient, McpClient};
pub use error::McpError;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::widget::ToolPayload;

/// A tool as advertised by `tools/list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpTool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Value,
    #[serde(default, rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListToolsResult {
    #[serde(default)]
    tools: Vec<McpTool>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// One entry of a tool result's `content` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultContent {
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
}

/// Result of `tools/call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    #[serde(default)]
    pub content: Vec<ToolResultContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(default, alias = "_meta", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolCallResult {
    /// Text parts joined by newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|c| c.r#type == "text")
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn payload(&self) -> ToolPayload {
        ToolPayload::new(
            self.structured_content.clone(),
            self.metadata.clone().unwrap_or_default(),
        )
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

/// Result of `resources/read`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceContents {
    #[serde(default)]
    pub contents: Vec<ResourceContent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn tool_result_accepts_meta_alias() {
        let result: ToolCallResult = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "first"},
                {"type": "image", "data": "AAAA", "mimeType": "image/png"},
                {"type": "text", "text": "second"}
            ],
            "structuredContent": {"cards": 3},
            "_meta": {"openai/outputTemplate": "ui://widget/board.html"}
        }))
        .unwrap();

        assert_eq!(result.text(), "first\nsecond");
        let payload = result.payload();
        assert_eq!(payload.structured_content, Some(json!({"cards": 3})));
        assert_eq!(
            payload.metadata.get("openai/outputTemplate"),
            Some(&json!("ui://widget/board.html"))
        );
        assert!(!result.is_error());
    }

    #[test]
    fn tool_without_schema_still_parses() {
        let tool: McpTool = serde_json::from_value(json!({"name": "ping"})).unwrap();
        assert_eq!(tool.name, "ping");
        assert_eq!(tool.input_schema, Value::Null);
        assert!(tool.meta.is_none());
    }
}
