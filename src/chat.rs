//! Chat transcript and tool execution.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, bail};
use async_trait::async_trait;
use dioxus::logger::tracing::{info, warn};
use serde_json::{Map, Value};

use crate::mcp::{McpClient, McpTool};
use crate::widget::{InvocationRequest, ToolInvoker, ToolPayload, WidgetReference};

/// Metadata keys that name the widget rendering a tool result, in order of
/// preference.
pub const WIDGET_REFERENCE_KEYS: [&str; 3] = ["openai/outputTemplate", "widgetUri", "widget"];

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOrigin {
    User,
    Widget(Option<WidgetReference>),
}

/// One executed tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolTurn {
    pub tool: String,
    pub arguments: Value,
    pub text: String,
    pub payload: ToolPayload,
    pub widget: Option<WidgetReference>,
    pub is_error: bool,
    pub origin: TurnOrigin,
    /// The result as returned by the server.
    pub result: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEntry {
    User { text: String },
    Tool(ToolTurn),
    Notice { text: String },
}

/// Append-only list of chat entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    entries: Vec<ChatEntry>,
}

impl Transcript {
    pub fn push(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Widget named by the result metadata, else by the tool's own `_meta`.
pub fn widget_reference(
    result_meta: &Map<String, Value>,
    tool: Option<&McpTool>,
) -> Option<WidgetReference> {
    let lookup = |meta: &Map<String, Value>| {
        WIDGET_REFERENCE_KEYS
            .iter()
            .filter_map(|k| meta.get(*k).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(WidgetReference::from)
    };
    lookup(result_meta).or_else(|| tool.and_then(|t| t.meta.as_ref()).and_then(lookup))
}

/// What the composer text means for the selected tool.
#[derive(Debug, Clone, PartialEq)]
pub enum Composed {
    /// A JSON object, used as the arguments verbatim.
    Arguments(Value),
    /// Free text for argument inference.
    Prompt(String),
}

impl Composed {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(text) {
            Ok(value @ Value::Object(_)) => Some(Composed::Arguments(value)),
            _ => Some(Composed::Prompt(text.to_string())),
        }
    }
}

/// Runs tools against the MCP server and records every call in the
/// transcript through `sink`.
pub struct ChatSession {
    client: Rc<dyn McpClient>,
    tools: RefCell<Vec<McpTool>>,
    sink: Rc<dyn Fn(ChatEntry)>,
}

impl ChatSession {
    pub fn new(client: Rc<dyn McpClient>, sink: Rc<dyn Fn(ChatEntry)>) -> Self {
        Self {
            client,
            tools: RefCell::new(vec![]),
            sink,
        }
    }

    pub async fn refresh_tools(&self) -> anyhow::Result<Vec<McpTool>> {
        let tools = self
            .client
            .list_tools()
            .await
            .context("listing tools")?;
        info!(count = tools.len(), "tools listed");
        *self.tools.borrow_mut() = tools.clone();
        Ok(tools)
    }

    pub fn tool(&self, name: &str) -> Option<McpTool> {
        self.tools.borrow().iter().find(|t| t.name == name).cloned()
    }

    pub fn say(&self, text: impl Into<String>) {
        (self.sink)(ChatEntry::User { text: text.into() });
    }

    pub fn notice(&self, text: impl Into<String>) {
        (self.sink)(ChatEntry::Notice { text: text.into() });
    }

    /// Calls `name` and appends the turn. Transport and protocol failures
    /// become a notice and an error; a result flagged as an error is still
    /// a turn.
    pub async fn run_tool(
        &self,
        name: &str,
        arguments: Value,
        origin: TurnOrigin,
    ) -> anyhow::Result<ToolTurn> {
        let result = match self.client.call_tool(name, arguments.clone()).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %name, "tool call failed: {e}");
                self.notice(format!("{name} failed: {e}"));
                return Err(e.into());
            }
        };

        let payload = result.payload();
        let widget = widget_reference(&payload.metadata, self.tool(name).as_ref());
        let turn = ToolTurn {
            tool: name.to_string(),
            arguments,
            text: result.text(),
            is_error: result.is_error(),
            result: serde_json::to_value(&result)?,
            payload,
            widget,
            origin,
        };
        (self.sink)(ChatEntry::Tool(turn.clone()));
        Ok(turn)
    }
}

#[async_trait(?Send)]
impl ToolInvoker for ChatSession {
    async fn invoke(&self, request: InvocationRequest) -> anyhow::Result<Value> {
        let turn = self
            .run_tool(
                &request.tool,
                Value::Object(request.arguments),
                TurnOrigin::Widget(request.source_widget),
            )
            .await?;
        if turn.is_error {
            if turn.text.is_empty() {
                bail!("{} reported an error", turn.tool);
            }
            bail!("{}", turn.text);
        }
        Ok(turn.result)
    }
}
