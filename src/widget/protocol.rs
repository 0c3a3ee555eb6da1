//! Message shapes exchanged with a hosted widget document.
//!
//! Field and type names are a compatibility contract with widget authors;
//! they are spelled out here once and nowhere else.

use dioxus::logger::tracing::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const TOOL_OUTPUT: &str = "toolOutput";
pub const HEIGHT_REPORT: &str = "heightReport";
pub const TOOL_CALL_REQUEST: &str = "toolCallRequest";
pub const TOOL_CALL_SUCCEEDED: &str = "toolCallSucceeded";
pub const TOOL_CALL_FAILED: &str = "toolCallFailed";

/// Global object assigned inside the hosted document.
pub const GLOBAL_NAMESPACE: &str = "openai";
/// Event dispatched on the hosted document's window after a global sync.
pub const GLOBALS_EVENT: &str = "openai:set_globals";

/// Older widgets read metadata from this field instead of `metadata`.
pub const LEGACY_METADATA_ALIAS: &str = "legacyMetadataAlias";

/// Accepted spellings of the tool name in a tool-call request, canonical first.
pub const TOOL_NAME_FIELDS: [&str; 2] = ["tool", "name"];
/// Accepted spellings of the arguments in a tool-call request, canonical first.
pub const ARGUMENT_FIELDS: [&str; 2] = ["arguments", "args"];

/// Structured content and metadata of one tool result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ToolPayload {
    pub fn new(structured_content: Option<Value>, metadata: Map<String, Value>) -> Self {
        Self {
            structured_content,
            metadata,
        }
    }

    pub fn has_structured_content(&self) -> bool {
        self.structured_content
            .as_ref()
            .is_some_and(|v| !v.is_null())
    }

    /// The `data` object of a `toolOutput` message, also used as the value
    /// of the `toolOutput` global.
    pub fn tool_output(&self) -> Value {
        let metadata = Value::Object(self.metadata.clone());
        json!({
            "structuredContent": self.structured_content.clone().unwrap_or(Value::Null),
            "metadata": metadata.clone(),
            LEGACY_METADATA_ALIAS: metadata,
        })
    }
}

/// Correlates a widget's tool-call request with its reply. Echoed back
/// exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvocationId {
    Number(serde_json::Number),
    Text(String),
}

impl InvocationId {
    pub fn now() -> Self {
        InvocationId::Number(chrono::Utc::now().timestamp_millis().into())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(InvocationId::Number(n.clone())),
            Value::String(s) => Some(InvocationId::Text(s.clone())),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            InvocationId::Number(n) => Value::Number(n.clone()),
            InvocationId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<i64> for InvocationId {
    fn from(n: i64) -> Self {
        InvocationId::Number(n.into())
    }
}

impl From<&str> for InvocationId {
    fn from(s: &str) -> Self {
        InvocationId::Text(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub tool: String,
    pub arguments: Map<String, Value>,
    pub invocation_id: InvocationId,
}

/// Messages a hosted widget may send to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundCommand {
    HeightReport { height: u32 },
    ToolCallRequest(ToolCallRequest),
}

impl InboundCommand {
    /// Recognizes a widget message. Anything that is not a well-formed
    /// command yields `None`.
    pub fn parse(message: &Value) -> Option<Self> {
        let obj = message.as_object()?;
        match obj.get("type").and_then(Value::as_str)? {
            HEIGHT_REPORT => {
                let height = obj.get("height").and_then(Value::as_f64)?;
                Some(InboundCommand::HeightReport {
                    height: clamp_height(height),
                })
            }
            TOOL_CALL_REQUEST => parse_tool_call(obj).map(InboundCommand::ToolCallRequest),
            _ => None,
        }
    }
}

fn clamp_height(height: f64) -> u32 {
    if !height.is_finite() || height <= 0.0 {
        0
    } else {
        height.round().min(u32::MAX as f64) as u32
    }
}

fn parse_tool_call(obj: &Map<String, Value>) -> Option<ToolCallRequest> {
    let tool = TOOL_NAME_FIELDS
        .iter()
        .filter_map(|field| obj.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .find(|name| !name.is_empty());
    let Some(tool) = tool else {
        warn!("ignoring widget tool call without a tool name");
        return None;
    };

    let arguments = ARGUMENT_FIELDS
        .iter()
        .find_map(|field| obj.get(*field).and_then(Value::as_object))
        .cloned()
        .unwrap_or_default();
    let invocation_id = obj
        .get("invocationId")
        .and_then(InvocationId::from_value)
        .unwrap_or_else(InvocationId::now);

    Some(ToolCallRequest {
        tool: tool.to_string(),
        arguments,
        invocation_id,
    })
}

/// Messages the host sends into a widget.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundNotification {
    ToolOutputDelivered(ToolPayload),
    ToolCallSucceeded {
        result: Value,
        invocation_id: InvocationId,
    },
    ToolCallFailed {
        message: String,
        invocation_id: InvocationId,
    },
}

impl OutboundNotification {
    pub fn to_message(&self) -> Value {
        match self {
            OutboundNotification::ToolOutputDelivered(payload) => json!({
                "type": TOOL_OUTPUT,
                "data": payload.tool_output(),
            }),
            OutboundNotification::ToolCallSucceeded {
                result,
                invocation_id,
            } => {
                let mut data = match result {
                    Value::Object(map) => map.clone(),
                    other => {
                        let mut map = Map::new();
                        map.insert("result".into(), other.clone());
                        map
                    }
                };
                data.insert("invocationId".into(), invocation_id.to_value());
                json!({ "type": TOOL_CALL_SUCCEEDED, "data": data })
            }
            OutboundNotification::ToolCallFailed {
                message,
                invocation_id,
            } => json!({
                "type": TOOL_CALL_FAILED,
                "data": {
                    "message": message,
                    "invocationId": invocation_id.to_value(),
                },
            }),
        }
    }
}

/// Direct write into the hosted document's global scope, for widgets that
/// read state before (or instead of) listening for messages.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSync {
    pub namespace: &'static str,
    pub property: &'static str,
    pub value: Value,
    pub event: &'static str,
    pub detail: Value,
}

impl GlobalSync {
    pub fn tool_output(payload: &ToolPayload) -> Self {
        let value = payload.tool_output();
        Self {
            namespace: GLOBAL_NAMESPACE,
            property: TOOL_OUTPUT,
            detail: json!({ "globals": { TOOL_OUTPUT: value.clone() } }),
            value,
            event: GLOBALS_EVENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn payload() -> ToolPayload {
        let mut metadata = Map::new();
        metadata.insert("question".into(), json!("what's on the board?"));
        ToolPayload::new(Some(json!({"columns": ["todo", "done"]})), metadata)
    }

    #[test]
    fn tool_output_message_carries_metadata_twice() {
        let msg = OutboundNotification::ToolOutputDelivered(payload()).to_message();
        assert_eq!(
            msg,
            json!({
                "type": "toolOutput",
                "data": {
                    "structuredContent": {"columns": ["todo", "done"]},
                    "metadata": {"question": "what's on the board?"},
                    "legacyMetadataAlias": {"question": "what's on the board?"},
                }
            })
        );
    }

    #[test]
    fn global_sync_detail_wraps_tool_output() {
        let sync = GlobalSync::tool_output(&payload());
        assert_eq!(sync.namespace, "openai");
        assert_eq!(sync.property, "toolOutput");
        assert_eq!(sync.event, "openai:set_globals");
        assert_eq!(sync.detail, json!({ "globals": { "toolOutput": sync.value.clone() } }));
    }

    #[test]
    fn height_report_is_clamped() {
        let parse = |h: Value| InboundCommand::parse(&json!({"type": "heightReport", "height": h}));
        assert_eq!(parse(json!(240.4)), Some(InboundCommand::HeightReport { height: 240 }));
        assert_eq!(parse(json!(-12)), Some(InboundCommand::HeightReport { height: 0 }));
        assert_eq!(parse(json!("240")), None);
    }

    #[test]
    fn tool_call_accepts_legacy_field_names() {
        let cmd = InboundCommand::parse(&json!({
            "type": "toolCallRequest",
            "name": "move_card",
            "args": {"card": 3},
            "invocationId": "abc",
        }));
        assert_eq!(
            cmd,
            Some(InboundCommand::ToolCallRequest(ToolCallRequest {
                tool: "move_card".into(),
                arguments: json!({"card": 3}).as_object().cloned().unwrap(),
                invocation_id: "abc".into(),
            }))
        );
    }

    #[test]
    fn canonical_fields_win_over_aliases() {
        let Some(InboundCommand::ToolCallRequest(req)) = InboundCommand::parse(&json!({
            "type": "toolCallRequest",
            "tool": "canonical",
            "name": "legacy",
            "arguments": {"a": 1},
            "args": {"b": 2},
            "invocationId": 9,
        })) else {
            panic!("expected a tool call");
        };
        assert_eq!(req.tool, "canonical");
        assert_eq!(req.arguments.get("a"), Some(&json!(1)));
        assert_eq!(req.invocation_id, InvocationId::from(9));
    }

    #[test]
    fn missing_invocation_id_defaults_to_timestamp() {
        let before = chrono::Utc::now().timestamp_millis();
        let Some(InboundCommand::ToolCallRequest(req)) =
            InboundCommand::parse(&json!({"type": "toolCallRequest", "tool": "t"}))
        else {
            panic!("expected a tool call");
        };
        match req.invocation_id {
            InvocationId::Number(n) => assert!(n.as_i64().unwrap() >= before),
            other => panic!("unexpected id {other:?}"),
        }
        assert!(req.arguments.is_empty());
    }

    #[test]
    fn unrecognized_messages_are_ignored() {
        for msg in [
            json!("hello"),
            json!({"type": "somethingElse"}),
            json!({"height": 100}),
            json!({"type": "toolCallRequest", "tool": "  "}),
            json!({"type": "toolCallRequest", "arguments": {}}),
        ] {
            assert_eq!(InboundCommand::parse(&msg), None, "{msg}");
        }
    }

    #[test]
    fn success_merges_invocation_id_into_result() {
        let msg = OutboundNotification::ToolCallSucceeded {
            result: json!({"structuredContent": {"ok": true}}),
            invocation_id: 7.into(),
        }
        .to_message();
        assert_eq!(
            msg,
            json!({
                "type": "toolCallSucceeded",
                "data": {"structuredContent": {"ok": true}, "invocationId": 7}
            })
        );

        let wrapped = OutboundNotification::ToolCallSucceeded {
            result: json!("done"),
            invocation_id: "x".into(),
        }
        .to_message();
        assert_eq!(wrapped["data"], json!({"result": "done", "invocationId": "x"}));
    }

    #[test]
    fn failure_carries_message_and_id() {
        let msg = OutboundNotification::ToolCallFailed {
            message: "unknown tool".into(),
            invocation_id: "req-1".into(),
        }
        .to_message();
        assert_eq!(
            msg,
            json!({
                "type": "toolCallFailed",
                "data": {"message": "unknown tool", "invocationId": "req-1"}
            })
        );
    }
}
