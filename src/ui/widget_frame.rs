use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use dioxus::{logger::tracing::warn, prelude::*};

use crate::AppSettings;
use crate::ui::{Services, fallback_panel::FallbackPanel};
use crate::widget::{
    DocumentSource, HeightTracker, HostSession, ResolvedResource, ResourceResolver, ToolInvoker,
    ToolPayload, WidgetHost, WidgetReference, sandbox,
};

static NEXT_FRAME: AtomicU64 = AtomicU64::new(1);

#[cfg(target_arch = "wasm32")]
type Bridge = crate::widget::web::FrameBridge;

#[cfg(not(target_arch = "wasm32"))]
struct Bridge;

#[cfg(target_arch = "wasm32")]
fn connect(
    frame_id: &str,
    host: Rc<WidgetHost>,
    invoker: Rc<dyn ToolInvoker>,
    on_change: Rc<dyn Fn()>,
) -> anyhow::Result<Bridge> {
    Bridge::attach(frame_id, host, invoker, on_change)
}

// Only the web renderer can reach into the frame.
#[cfg(not(target_arch = "wasm32"))]
fn connect(
    _frame_id: &str,
    _host: Rc<WidgetHost>,
    _invoker: Rc<dyn ToolInvoker>,
    _on_change: Rc<dyn Fn()>,
) -> anyhow::Result<Bridge> {
    Ok(Bridge)
}

/// Attribute values of a widget iframe.
#[derive(Debug, Clone, PartialEq)]
struct FrameAttributes {
    src: Option<String>,
    srcdoc: Option<String>,
    sandbox: String,
    style: String,
}

impl FrameAttributes {
    /// `None` when there is nothing to load.
    fn new(
        resolved: &ResolvedResource,
        height: &HeightTracker,
        trust_widget_origin: bool,
    ) -> Option<Self> {
        let (src, srcdoc) = match DocumentSource::from_resolved(resolved)? {
            DocumentSource::Url(url) => (Some(url), None),
            DocumentSource::Html(html) => (None, Some(html)),
        };
        Some(Self {
            src,
            srcdoc,
            sandbox: sandbox(trust_widget_origin),
            style: height
                .css_height()
                .map(|h| format!("height: {h}px;"))
                .unwrap_or_default(),
        })
    }
}

/// Renders the widget for one tool result, or its textual fallback when
/// the widget cannot be resolved.
#[component]
pub fn WidgetFrame(
    services: Services,
    reference: WidgetReference,
    payload: ToolPayload,
    tool: String,
) -> Element {
    let settings = use_context::<Signal<AppSettings>>();
    let frame_id = use_hook(|| format!("widget-{}", NEXT_FRAME.fetch_add(1, Ordering::Relaxed)));
    let host = use_hook({
        let client = services.client.clone();
        let base = services.widget_base.clone();
        move || Rc::new(WidgetHost::new(ResourceResolver::new(client, base)))
    });
    let bridge = use_hook(|| Rc::new(RefCell::new(None::<Bridge>)));
    let mut session = use_signal(HostSession::default);

    let _ = use_resource({
        let host = host.clone();
        let bridge = bridge.clone();
        use_reactive!(|reference| {
            let host = host.clone();
            let bridge = bridge.clone();
            async move {
                bridge.borrow_mut().take();
                session.set(HostSession::default());
                if host.load(reference).await {
                    session.set(host.session());
                }
            }
        })
    });

    use_effect({
        let host = host.clone();
        use_reactive!(|payload| {
            host.set_payload(payload);
        })
    });

    use_drop({
        let host = host.clone();
        let bridge = bridge.clone();
        move || {
            bridge.borrow_mut().take();
            host.teardown();
        }
    });

    let onload = {
        let host = host.clone();
        let bridge = bridge.clone();
        let frame_id = frame_id.clone();
        let invoker: Rc<dyn ToolInvoker> = services.chat.clone();
        move |_: Event<ImageData>| {
            let on_change: Rc<dyn Fn()> = {
                let host = host.clone();
                Rc::new(move || {
                    let mut session = session;
                    session.set(host.session());
                })
            };
            match connect(&frame_id, host.clone(), invoker.clone(), on_change) {
                Ok(connected) => *bridge.borrow_mut() = Some(connected),
                Err(e) => warn!(%frame_id, "widget bridge unavailable: {e:#}"),
            }
            host.on_ready();
            session.set(host.session());
        }
    };

    let current = session();
    let Some(resolved) = current.resolved.as_ref() else {
        return rsx! {
            div { class: "widget-loading", "Loading widget…" }
        };
    };
    if matches!(resolved, ResolvedResource::Unavailable { .. }) {
        return rsx! {
            FallbackPanel { services, payload, tool, reference }
        };
    }

    let Some(attrs) =
        FrameAttributes::new(resolved, &current.height, settings.read().trust_widget_origin)
    else {
        return rsx! {};
    };

    rsx! {
        iframe {
            id: "{frame_id}",
            class: "widget-frame",
            title: "{reference}",
            "sandbox": attrs.sandbox,
            style: attrs.style,
            src: attrs.src,
            "srcdoc": attrs.srcdoc,
            onload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{SANDBOX, UnavailableReason};
    use pretty_assertions::assert_eq;

    #[test]
    fn direct_widget_loads_through_src_in_the_sandbox() {
        let attrs = FrameAttributes::new(
            &ResolvedResource::Direct {
                url: "/widgets/board.html".into(),
            },
            &HeightTracker::default(),
            false,
        );
        assert_eq!(
            attrs,
            Some(FrameAttributes {
                src: Some("/widgets/board.html".into()),
                srcdoc: None,
                sandbox: SANDBOX.to_string(),
                style: String::new(),
            })
        );
    }

    #[test]
    fn trusted_inline_widget_gets_same_origin_and_height() {
        let mut height = HeightTracker::default();
        height.report(320);
        let attrs = FrameAttributes::new(
            &ResolvedResource::Inline {
                html: "<p>hi</p>".into(),
                base_url: None,
            },
            &height,
            true,
        )
        .unwrap();
        assert_eq!(attrs.src, None);
        assert_eq!(attrs.srcdoc.as_deref(), Some("<p>hi</p>"));
        assert!(attrs.sandbox.ends_with(" allow-same-origin"));
        assert_eq!(attrs.style, "height: 320px;");
    }

    #[test]
    fn unavailable_widget_has_no_frame() {
        let attrs = FrameAttributes::new(
            &ResolvedResource::Unavailable {
                reason: UnavailableReason::NoStrategyMatched,
            },
            &HeightTracker::default(),
            false,
        );
        assert_eq!(attrs, None);
    }
}
