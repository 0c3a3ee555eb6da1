//! Hand-written fakes for the widget host's collaborators.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use anyhow::bail;
use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::{Value, json};

use crate::mcp::{McpClient, McpError, McpTool, ResourceContents, ToolCallResult};

use super::{GlobalSync, InvocationRequest, SummaryRequest, Summarizer, ToolInvoker, WidgetSurface};

type Gate = RefCell<Option<oneshot::Receiver<()>>>;

/// The first call waits on the gate, later calls pass straight through.
async fn pass(gate: &Gate) {
    let waiting = gate.borrow_mut().take();
    if let Some(waiting) = waiting {
        let _ = waiting.await;
    }
}

#[derive(Default)]
pub struct FakeClient {
    tools: Vec<McpTool>,
    results: HashMap<String, ToolCallResult>,
    resource: Option<ResourceContents>,
    reads: RefCell<Vec<String>>,
    calls: RefCell<Vec<(String, Value)>>,
    gate: Gate,
}

impl FakeClient {
    /// Every read fails and no tools exist.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn serving(resource: ResourceContents) -> Self {
        Self {
            resource: Some(resource),
            ..Self::default()
        }
    }

    pub fn with_tool(mut self, tool: McpTool, result: ToolCallResult) -> Self {
        self.results.insert(tool.name.clone(), result);
        self.tools.push(tool);
        self
    }

    pub fn gated(self, gate: oneshot::Receiver<()>) -> Self {
        *self.gate.borrow_mut() = Some(gate);
        self
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.borrow().clone()
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl McpClient for FakeClient {
    async fn list_tools(&self) -> Result<Vec<McpTool>, McpError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult, McpError> {
        self.calls.borrow_mut().push((name.to_string(), arguments));
        self.results.get(name).cloned().ok_or_else(|| McpError::Rpc {
            method: "tools/call".into(),
            code: -32602,
            message: format!("unknown tool: {name}"),
        })
    }

    async fn read_resource(&self, uri: &str) -> Result<ResourceContents, McpError> {
        self.reads.borrow_mut().push(uri.to_string());
        pass(&self.gate).await;
        self.resource
            .clone()
            .ok_or_else(|| McpError::MissingResponse("resources/read".into()))
    }
}

/// Records everything delivered to it and replays queued heights.
#[derive(Default)]
pub struct RecordingSurface {
    messages: RefCell<Vec<Value>>,
    globals: RefCell<Vec<GlobalSync>>,
    heights: RefCell<VecDeque<f64>>,
    unmeasurable: bool,
    refuse_globals: Cell<bool>,
    detached: Cell<bool>,
}

impl RecordingSurface {
    pub fn with_heights(heights: impl IntoIterator<Item = f64>) -> Self {
        Self {
            heights: RefCell::new(heights.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn unmeasurable() -> Self {
        Self {
            unmeasurable: true,
            ..Self::default()
        }
    }

    pub fn refuse_globals(&self) {
        self.refuse_globals.set(true);
    }

    /// Behaves like a frame that was removed from the page.
    pub fn detach(&self) {
        self.detached.set(true);
    }

    pub fn messages(&self) -> Vec<Value> {
        self.messages.borrow().clone()
    }

    pub fn globals(&self) -> Vec<GlobalSync> {
        self.globals.borrow().clone()
    }
}

impl WidgetSurface for RecordingSurface {
    fn post_message(&self, message: &Value) -> anyhow::Result<()> {
        if self.detached.get() {
            bail!("frame has no content window");
        }
        self.messages.borrow_mut().push(message.clone());
        Ok(())
    }

    fn sync_globals(&self, sync: &GlobalSync) -> anyhow::Result<()> {
        if self.detached.get() || self.refuse_globals.get() {
            bail!("cross-origin document");
        }
        self.globals.borrow_mut().push(sync.clone());
        Ok(())
    }

    fn content_height(&self) -> Option<f64> {
        if self.unmeasurable || self.detached.get() {
            return None;
        }
        let mut heights = self.heights.borrow_mut();
        if heights.len() > 1 {
            heights.pop_front()
        } else {
            heights.front().copied()
        }
    }
}

enum Script {
    Reply(Value),
    Echo,
    Fail(String),
}

/// Answers widget tool calls from a script and records them.
pub struct ScriptedInvoker {
    script: Script,
    calls: RefCell<Vec<InvocationRequest>>,
    gate: Gate,
}

impl Default for ScriptedInvoker {
    fn default() -> Self {
        Self::replying(json!({}))
    }
}

impl ScriptedInvoker {
    fn new(script: Script) -> Self {
        Self {
            script,
            calls: RefCell::new(vec![]),
            gate: RefCell::new(None),
        }
    }

    pub fn replying(result: Value) -> Self {
        Self::new(Script::Reply(result))
    }

    /// Replies with the tool name and arguments it was called with.
    pub fn echoing() -> Self {
        Self::new(Script::Echo)
    }

    pub fn failing(message: &str) -> Self {
        Self::new(Script::Fail(message.to_string()))
    }

    pub fn gated(self, gate: oneshot::Receiver<()>) -> Self {
        *self.gate.borrow_mut() = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<InvocationRequest> {
        self.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl ToolInvoker for ScriptedInvoker {
    async fn invoke(&self, request: InvocationRequest) -> anyhow::Result<Value> {
        self.calls.borrow_mut().push(request.clone());
        pass(&self.gate).await;
        match &self.script {
            Script::Reply(value) => Ok(value.clone()),
            Script::Echo => Ok(json!({
                "tool": request.tool,
                "arguments": request.arguments,
            })),
            Script::Fail(message) => bail!("{message}"),
        }
    }
}

pub struct FakeSummarizer {
    reply: Result<String, String>,
    requests: RefCell<Vec<SummaryRequest>>,
    gate: Gate,
}

impl FakeSummarizer {
    pub fn replying(summary: &str) -> Self {
        Self {
            reply: Ok(summary.to_string()),
            requests: RefCell::new(vec![]),
            gate: RefCell::new(None),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            ..Self::replying("")
        }
    }

    pub fn gated(self, gate: oneshot::Receiver<()>) -> Self {
        *self.gate.borrow_mut() = Some(gate);
        self
    }

    pub fn requests(&self) -> Vec<SummaryRequest> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> anyhow::Result<String> {
        self.requests.borrow_mut().push(request.clone());
        pass(&self.gate).await;
        match &self.reply {
            Ok(summary) => Ok(summary.clone()),
            Err(message) => bail!("{message}"),
        }
    }
}
