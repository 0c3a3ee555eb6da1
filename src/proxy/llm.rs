//! Non-streaming chat completions against an OpenAI-compatible endpoint.

use dioxus::logger::tracing::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::llm::InferRequest;
use crate::proxy::config::ProviderSettings;
use crate::proxy::error::{ProxyError, ProxyResult};
use crate::widget::SummaryRequest;

const INFER_PROMPT: &str = "You turn a user's request into arguments for an MCP tool. \
Reply with one JSON object that matches the tool's input schema and nothing else.";

const SUMMARIZE_PROMPT: &str = "You describe tool results to a chat user. \
Answer in a few sentences of plain text. If the user asked a question, answer it from the data.";

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
}

#[derive(Debug, Deserialize)]
pub struct Completion {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
pub struct ReplyMessage {
    pub content: Option<String>,
}

pub struct LanguageModel {
    http: reqwest::Client,
    provider: ProviderSettings,
}

impl LanguageModel {
    pub fn new(http: reqwest::Client, provider: ProviderSettings) -> Self {
        Self { http, provider }
    }

    pub async fn infer(&self, req: &InferRequest) -> ProxyResult<Value> {
        let mut prompt = format!("Tool: {}\n", req.tool);
        if let Some(description) = &req.description {
            prompt.push_str(&format!("Description: {description}\n"));
        }
        prompt.push_str(&format!(
            "Input schema:\n{}\n\nRequest: {}",
            pretty(&req.input_schema),
            req.text
        ));
        let reply = self.complete(INFER_PROMPT, prompt).await?;
        let arguments = parse_arguments(&reply)
            .ok_or_else(|| ProxyError::BadUpstreamReply("model did not return JSON arguments".into()))?;
        Ok(Value::Object(arguments))
    }

    pub async fn summarize(&self, req: &SummaryRequest) -> ProxyResult<String> {
        let mut prompt = String::new();
        if let Some(tool) = &req.tool_name {
            prompt.push_str(&format!("Tool: {tool}\n"));
        }
        prompt.push_str(&format!("Result:\n{}\n", pretty(&req.structured_content)));
        if !req.metadata.is_empty() {
            let metadata = Value::Object(req.metadata.clone());
            prompt.push_str(&format!("Metadata:\n{}\n", pretty(&metadata)));
        }
        if let Some(question) = &req.question {
            prompt.push_str(&format!("\nQuestion: {question}"));
        }
        let reply = self.complete(SUMMARIZE_PROMPT, prompt).await?;
        Ok(reply.trim().to_string())
    }

    async fn complete(&self, system: &str, user: String) -> ProxyResult<String> {
        let url = format!("{}/chat/completions", self.provider.get_api_url());
        let messages = vec![
            Message::System {
                content: system.to_string(),
            },
            Message::User { content: user },
        ];
        let mut req = self.http.post(&url).json(&json!({
            "model": self.provider.get_model(),
            "stream": false,
            "messages": messages,
        }));
        if let Some(key) = self.provider.get_api_key() {
            req = req.bearer_auth(key);
        }

        let res = req.send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ProxyError::BadUpstreamReply(format!(
                "language model replied {status}: {}",
                body.trim()
            )));
        }
        let completion: Completion = res.json().await?;
        debug!(choices = completion.choices.len(), "completion received");
        completion
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| ProxyError::BadUpstreamReply("language model sent no content".into()))
    }
}

fn pretty(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

/// Pulls a JSON object out of a model reply, with or without a code fence.
pub fn parse_arguments(reply: &str) -> Option<Map<String, Value>> {
    let text = strip_fence(reply.trim());
    if let Ok(Value::Object(map)) = serde_json::from_str(text) {
        return Some(map);
    }
    // prose around the object
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn strip_fence(text: &str) -> &str {
    let Some(start) = text.find("```") else {
        return text;
    };
    let rest = &text[start + 3..];
    // skip the info string, e.g. `json`
    let rest = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    match rest.find("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_object() {
        let map = parse_arguments(r#" {"city": "Oslo"} "#).unwrap();
        assert_eq!(Value::Object(map), json!({"city": "Oslo"}));
    }

    #[test]
    fn fenced_object() {
        let reply = "Sure:\n```json\n{\"city\": \"Oslo\", \"days\": 3}\n```\nAnything else?";
        let map = parse_arguments(reply).unwrap();
        assert_eq!(Value::Object(map), json!({"city": "Oslo", "days": 3}));
    }

    #[test]
    fn object_inside_prose() {
        let map = parse_arguments("Use {\"q\": \"rust\"} for this.").unwrap();
        assert_eq!(Value::Object(map), json!({"q": "rust"}));
    }

    #[test]
    fn non_objects_are_rejected() {
        assert_eq!(parse_arguments("[1, 2]"), None);
        assert_eq!(parse_arguments("no idea"), None);
        assert_eq!(parse_arguments("} backwards {"), None);
    }

    #[test]
    fn messages_serialize_with_roles() {
        let m = Message::User {
            content: "hi".into(),
        };
        assert_eq!(
            serde_json::to_value(m).unwrap(),
            json!({"role": "user", "content": "hi"})
        );
    }

    #[test]
    fn completion_reply_shape() {
        let c: Completion = serde_json::from_value(json!({
            "id": "x",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "done"}}]
        }))
        .unwrap();
        assert_eq!(c.choices[0].message.content.as_deref(), Some("done"));
    }
}
