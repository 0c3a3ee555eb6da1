//! Browser side of the widget bridge: the iframe as a [`WidgetSurface`],
//! the window `message` listener and the resize observer.

use std::rc::Rc;

use anyhow::{Context, anyhow};
use dioxus::logger::tracing::debug;
use js_sys::{Object, Reflect};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use web_sys::{
    CustomEvent, CustomEventInit, HtmlElement, HtmlIFrameElement, MessageEvent, ResizeObserver,
    Window,
};

use super::{GlobalSync, MessageOutcome, ToolInvoker, WidgetHost, WidgetSurface};

pub(crate) fn js_err(e: JsValue) -> anyhow::Error {
    anyhow!("{}", e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

pub(crate) fn to_js(value: &impl Serialize) -> anyhow::Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| anyhow!("serializing for the browser: {e}"))
}

pub struct IframeSurface {
    frame: HtmlIFrameElement,
}

impl IframeSurface {
    pub fn find(frame_id: &str) -> anyhow::Result<Self> {
        let frame = web_sys::window()
            .context("no window")?
            .document()
            .context("no document")?
            .get_element_by_id(frame_id)
            .with_context(|| format!("no element #{frame_id}"))?
            .dyn_into::<HtmlIFrameElement>()
            .map_err(|_| anyhow!("#{frame_id} is not an iframe"))?;
        Ok(Self { frame })
    }

    fn window(&self) -> anyhow::Result<Window> {
        self.frame
            .content_window()
            .context("frame has no content window")
    }
}

impl WidgetSurface for IframeSurface {
    fn post_message(&self, message: &Value) -> anyhow::Result<()> {
        self.window()?
            .post_message(&to_js(message)?, "*")
            .map_err(js_err)
    }

    fn sync_globals(&self, sync: &GlobalSync) -> anyhow::Result<()> {
        let window = self.window()?;
        let key = JsValue::from_str(sync.namespace);
        // throws for cross-origin documents
        let mut namespace = Reflect::get(&window, &key).map_err(js_err)?;
        if !namespace.is_object() {
            namespace = Object::new().into();
            Reflect::set(&window, &key, &namespace).map_err(js_err)?;
        }
        Reflect::set(
            &namespace,
            &JsValue::from_str(sync.property),
            &to_js(&sync.value)?,
        )
        .map_err(js_err)?;

        let init = CustomEventInit::new();
        init.set_detail(&to_js(&sync.detail)?);
        let event = CustomEvent::new_with_event_init_dict(sync.event, &init).map_err(js_err)?;
        window.dispatch_event(&event).map_err(js_err)?;
        Ok(())
    }

    fn content_height(&self) -> Option<f64> {
        let document = self.frame.content_document()?;
        let root = document.document_element()?;
        let mut height = root.scroll_height();
        if let Some(root) = root.dyn_ref::<HtmlElement>() {
            height = height.max(root.offset_height());
        }
        if let Some(body) = document.body() {
            height = height.max(body.scroll_height()).max(body.offset_height());
        }
        Some(f64::from(height))
    }
}

/// Wires one mounted frame to its [`WidgetHost`]. Dropping the bridge
/// removes the listener and stops observing.
pub struct FrameBridge {
    window: Window,
    listener: Closure<dyn FnMut(MessageEvent)>,
    observer: Option<(ResizeObserver, Closure<dyn FnMut()>)>,
}

impl FrameBridge {
    /// Attaches the frame `frame_id` to `host`. `on_change` runs whenever
    /// the host's session changed in a way the page should re-render.
    pub fn attach(
        frame_id: &str,
        host: Rc<WidgetHost>,
        invoker: Rc<dyn ToolInvoker>,
        on_change: Rc<dyn Fn()>,
    ) -> anyhow::Result<Self> {
        let window = web_sys::window().context("no window")?;
        let surface = Rc::new(IframeSurface::find(frame_id)?);
        let source = surface.window().ok();
        let document = surface.frame.content_document();
        host.attach(surface);

        let listener = {
            let host = host.clone();
            let on_change = on_change.clone();
            Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
                let from_frame = match (event.source(), &source) {
                    (Some(sender), Some(frame)) => Object::is(&sender, frame),
                    _ => false,
                };
                if !from_frame {
                    return;
                }
                let Ok(message) = serde_wasm_bindgen::from_value::<Value>(event.data()) else {
                    debug!("ignoring non-JSON widget message");
                    return;
                };
                let host = host.clone();
                let invoker = invoker.clone();
                let on_change = on_change.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if host.handle_message(&message, invoker.as_ref()).await
                        != MessageOutcome::Ignored
                    {
                        on_change();
                    }
                });
            })
        };
        window
            .add_event_listener_with_callback("message", listener.as_ref().unchecked_ref())
            .map_err(js_err)?;

        let observer = match document {
            Some(document) => {
                let on_resize = Closure::<dyn FnMut()>::new(move || {
                    if host.measure() {
                        on_change();
                    }
                });
                let observer =
                    ResizeObserver::new(on_resize.as_ref().unchecked_ref()).map_err(js_err)?;
                if let Some(root) = document.document_element() {
                    observer.observe(&root);
                }
                if let Some(body) = document.body() {
                    observer.observe(&body);
                }
                Some((observer, on_resize))
            }
            None => {
                debug!(%frame_id, "cross-origin widget, not observing size");
                None
            }
        };

        Ok(Self {
            window,
            listener,
            observer,
        })
    }
}

impl Drop for FrameBridge {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("message", self.listener.as_ref().unchecked_ref());
        if let Some((observer, _)) = &self.observer {
            observer.disconnect();
        }
    }
}
