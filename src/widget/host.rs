use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use dioxus::logger::tracing::{debug, info, warn};
use serde_json::{Map, Value};

use super::{
    DocumentSource, Generation, GlobalSync, HeightTracker, InboundCommand, OutboundNotification,
    ResolvedResource, ResourceResolver, ToolCallRequest, ToolPayload, WidgetReference,
    WidgetSurface,
};

/// A tool call requested by a hosted widget.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub tool: String,
    pub arguments: Map<String, Value>,
    pub source_widget: Option<WidgetReference>,
}

/// Runs tool calls on behalf of widgets.
#[async_trait(?Send)]
pub trait ToolInvoker {
    async fn invoke(&self, request: InvocationRequest) -> anyhow::Result<Value>;
}

/// Snapshot of what a [`WidgetHost`] is showing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostSession {
    pub reference: Option<WidgetReference>,
    pub resolved: Option<ResolvedResource>,
    pub ready: bool,
    pub height: HeightTracker,
    pub auto_resize: bool,
    /// Last local failure, kept for diagnostics only.
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Ignored,
    Resized,
    ToolCallAnswered,
}

/// Owns one widget frame: which document it shows, whether that document
/// is ready, its height, and the payload delivered into it.
pub struct WidgetHost {
    resolver: ResourceResolver,
    generation: Generation,
    session: RefCell<HostSession>,
    surface: RefCell<Option<Rc<dyn WidgetSurface>>>,
    payload: RefCell<Option<ToolPayload>>,
}

impl WidgetHost {
    pub fn new(resolver: ResourceResolver) -> Self {
        Self {
            resolver,
            generation: Generation::default(),
            session: RefCell::new(HostSession::default()),
            surface: RefCell::new(None),
            payload: RefCell::new(None),
        }
    }

    pub fn session(&self) -> HostSession {
        self.session.borrow().clone()
    }

    /// Resolves `reference` and mounts the result. Returns `false` when a
    /// newer load superseded this one while it was resolving.
    pub async fn load(&self, reference: WidgetReference) -> bool {
        let ticket = self.generation.advance();
        self.teardown();
        self.session.borrow_mut().reference = Some(reference.clone());

        let resolved = self.resolver.resolve(&reference).await;
        if !self.generation.is_current(ticket) {
            debug!(%reference, "discarding stale widget resolution");
            return false;
        }
        info!(%reference, unavailable = resolved.is_unavailable(), "widget resolved");
        self.mount(resolved);
        true
    }

    pub fn mount(&self, resolved: ResolvedResource) {
        self.teardown();
        self.session.borrow_mut().resolved = Some(resolved);
    }

    /// What the frame should load, if anything.
    pub fn document(&self) -> Option<DocumentSource> {
        self.session
            .borrow()
            .resolved
            .as_ref()
            .and_then(DocumentSource::from_resolved)
    }

    pub fn attach(&self, surface: Rc<dyn WidgetSurface>) {
        *self.surface.borrow_mut() = Some(surface);
    }

    /// The hosted document finished loading.
    pub fn on_ready(&self) {
        {
            let mut session = self.session.borrow_mut();
            session.ready = true;
            session.auto_resize = true;
        }
        self.measure();
        self.deliver();
    }

    /// Replaces the payload, delivering it when it differs from the
    /// current one and the document is ready. Returns whether it changed.
    pub fn set_payload(&self, payload: ToolPayload) -> bool {
        if self.payload.borrow().as_ref() == Some(&payload) {
            return false;
        }
        *self.payload.borrow_mut() = Some(payload);
        if self.session.borrow().ready {
            self.deliver();
        }
        true
    }

    /// Sends the current payload into the document by message and by
    /// global sync. Failures stay local to the session.
    pub fn deliver(&self) {
        if !self.session.borrow().ready {
            return;
        }
        let Some(surface) = self.surface.borrow().clone() else {
            return;
        };
        let Some(payload) = self.payload.borrow().clone() else {
            return;
        };

        let message = OutboundNotification::ToolOutputDelivered(payload.clone()).to_message();
        if let Err(e) = surface.post_message(&message) {
            self.record_error("posting tool output", e);
        }
        if let Err(e) = surface.sync_globals(&GlobalSync::tool_output(&payload)) {
            self.record_error("syncing widget globals", e);
        }
    }

    /// Measures the hosted content. Returns whether the stored height
    /// changed. A document that cannot be measured turns auto-resize off
    /// for the rest of the session.
    pub fn measure(&self) -> bool {
        {
            let session = self.session.borrow();
            if !session.ready || !session.auto_resize {
                return false;
            }
        }
        let Some(surface) = self.surface.borrow().clone() else {
            return false;
        };
        match surface.content_height() {
            Some(height) => self.session.borrow_mut().height.observe(height),
            None => {
                debug!("widget content is not measurable, auto-resize disabled");
                self.session.borrow_mut().auto_resize = false;
                false
            }
        }
    }

    /// Handles a message that came from the hosted document.
    pub async fn handle_message(&self, message: &Value, invoker: &dyn ToolInvoker) -> MessageOutcome {
        match InboundCommand::parse(message) {
            Some(InboundCommand::HeightReport { height }) => {
                self.session.borrow_mut().height.report(height);
                MessageOutcome::Resized
            }
            Some(InboundCommand::ToolCallRequest(request)) => {
                self.answer_tool_call(request, invoker).await;
                MessageOutcome::ToolCallAnswered
            }
            None => MessageOutcome::Ignored,
        }
    }

    async fn answer_tool_call(&self, request: ToolCallRequest, invoker: &dyn ToolInvoker) {
        let surface = self.surface.borrow().clone();
        let source_widget = self.session.borrow().reference.clone();
        let ToolCallRequest {
            tool,
            arguments,
            invocation_id,
        } = request;
        info!(%tool, "widget requested tool call");

        let reply = match invoker
            .invoke(InvocationRequest {
                tool: tool.clone(),
                arguments,
                source_widget,
            })
            .await
        {
            Ok(result) => OutboundNotification::ToolCallSucceeded {
                result,
                invocation_id,
            },
            Err(e) => {
                warn!(%tool, "widget tool call failed: {e}");
                OutboundNotification::ToolCallFailed {
                    message: e.to_string(),
                    invocation_id,
                }
            }
        };

        let Some(surface) = surface else {
            debug!(%tool, "no surface to answer widget tool call");
            return;
        };
        if let Err(e) = surface.post_message(&reply.to_message()) {
            debug!(%tool, "widget went away before tool call reply: {e}");
        }
    }

    /// Drops the surface and everything measured from it. The reference
    /// and payload survive.
    pub fn teardown(&self) {
        self.surface.borrow_mut().take();
        let mut session = self.session.borrow_mut();
        session.resolved = None;
        session.ready = false;
        session.auto_resize = false;
        session.height.clear();
        session.last_error = None;
    }

    fn record_error(&self, what: &str, e: anyhow::Error) {
        debug!("{what} failed: {e:#}");
        self.session.borrow_mut().last_error = Some(format!("{what}: {e:#}"));
    }
}
