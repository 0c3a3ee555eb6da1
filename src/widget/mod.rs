//! Embedding of tool-result widgets: resolving a widget reference into a
//! document, hosting it in a sandboxed frame, and the message bridge
//! between the frame and the chat.

mod document;
mod fallback;
mod generation;
mod host;
mod protocol;
mod reference;
mod resize;
mod resolver;
mod surface;

#[cfg(test)]
pub(crate) mod testing;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use document::{DocumentSource, inject_base_href};
pub use fallback::{
    FallbackSummarizer, FallbackView, SummaryRequest, SummaryResponse, Summarizer,
};
pub use generation::{Generation, Ticket};
pub use host::{HostSession, InvocationRequest, MessageOutcome, ToolInvoker, WidgetHost};
pub use protocol::{
    GlobalSync, InboundCommand, InvocationId, OutboundNotification, ToolCallRequest, ToolPayload,
};
pub use reference::{ReferenceKind, WidgetReference};
pub use resize::HeightTracker;
pub use resolver::{ResolvedResource, ResourceResolver, UnavailableReason};
pub use surface::WidgetSurface;

/// Sandbox applied to every widget frame.
pub const SANDBOX: &str = "allow-scripts allow-forms allow-popups";

/// Sandbox tokens for a frame, widened to the widget's own origin only when
/// the user trusts widget origins.
pub fn sandbox(trust_widget_origin: bool) -> String {
    if trust_widget_origin {
        format!("{SANDBOX} allow-same-origin")
    } else {
        SANDBOX.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_origin_only_when_trusted() {
        assert!(!sandbox(false).contains("allow-same-origin"));
        assert_eq!(
            sandbox(true),
            "allow-scripts allow-forms allow-popups allow-same-origin"
        );
    }
}
