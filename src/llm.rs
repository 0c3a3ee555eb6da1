//! Client for the proxy's language-model endpoints.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use dioxus::logger::tracing::debug;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::mcp::McpTool;
use crate::widget::{SummaryRequest, SummaryResponse, Summarizer};

/// Body of `POST /api/infer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferRequest {
    pub tool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Value,
    pub text: String,
}

impl InferRequest {
    pub fn for_tool(tool: &McpTool, text: &str) -> Self {
        Self {
            tool: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: tool.input_schema.clone(),
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferResponse {
    pub arguments: Value,
}

pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Turns free text into arguments for `tool`.
    pub async fn infer_arguments(&self, tool: &McpTool, text: &str) -> anyhow::Result<Value> {
        let resp: InferResponse = self
            .post("/api/infer", &InferRequest::for_tool(tool, text))
            .await?;
        debug!(tool = %tool.name, "arguments inferred");
        Ok(resp.arguments)
    }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> anyhow::Result<R> {
        let url = format!("{}{path}", self.base);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!(error_text(status, &text)));
        }
        serde_json::from_str(&text).with_context(|| format!("unexpected response from {path}"))
    }
}

#[async_trait(?Send)]
impl Summarizer for ApiClient {
    async fn summarize(&self, request: &SummaryRequest) -> anyhow::Result<String> {
        let resp: SummaryResponse = self.post("/api/summarize", request).await?;
        Ok(resp.summary)
    }
}

/// The `error` field of a JSON error body, else the body itself, else the
/// status line.
pub fn error_text(status: reqwest::StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match from_json {
        Some(message) if !message.trim().is_empty() => message,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => format!("HTTP {status}"),
    }
}
