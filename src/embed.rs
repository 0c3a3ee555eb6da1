//! Messages from a page that embeds the chat in a frame.

use serde_json::Value;

pub const SET_INPUT: &str = "setInput";

/// Replace the composer draft, optionally focusing it.
#[derive(Debug, Clone, PartialEq)]
pub struct SetInput {
    pub text: String,
    pub focus: bool,
}

impl SetInput {
    /// Accepts a bare string or `{ type: "setInput", text, focus? }`.
    pub fn parse(message: &Value) -> Option<Self> {
        match message {
            Value::String(text) => Some(Self {
                text: text.clone(),
                focus: false,
            }),
            Value::Object(obj) if obj.get("type").and_then(Value::as_str) == Some(SET_INPUT) => {
                Some(Self {
                    text: obj.get("text")?.as_str()?.to_string(),
                    focus: obj.get("focus").and_then(Value::as_bool).unwrap_or(false),
                })
            }
            _ => None,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::EmbedListener;

#[cfg(target_arch = "wasm32")]
mod web {
    use anyhow::Context;
    use dioxus::logger::tracing::debug;
    use js_sys::Object;
    use serde_json::Value;
    use wasm_bindgen::{JsCast, closure::Closure};
    use web_sys::{MessageEvent, Window};

    use super::SetInput;
    use crate::widget::web::js_err;

    /// Listens for [`SetInput`] messages from `window.parent`. Removed on drop.
    pub struct EmbedListener {
        window: Window,
        listener: Closure<dyn FnMut(MessageEvent)>,
    }

    impl EmbedListener {
        pub fn attach(on_input: impl Fn(SetInput) + 'static) -> anyhow::Result<Self> {
            let window = web_sys::window().context("no window")?;
            let parent = window.parent().map_err(js_err)?;
            let listener = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
                let from_parent = match (event.source(), &parent) {
                    (Some(sender), Some(parent)) => Object::is(&sender, parent),
                    _ => false,
                };
                if !from_parent {
                    return;
                }
                let Ok(message) = serde_wasm_bindgen::from_value::<Value>(event.data()) else {
                    return;
                };
                match SetInput::parse(&message) {
                    Some(input) => on_input(input),
                    None => debug!("ignoring message from embedding page"),
                }
            });
            window
                .add_event_listener_with_callback("message", listener.as_ref().unchecked_ref())
                .map_err(js_err)?;
            Ok(Self { window, listener })
        }
    }

    impl Drop for EmbedListener {
        fn drop(&mut self) {
            let _ = self.window.remove_event_listener_with_callback(
                "message",
                self.listener.as_ref().unchecked_ref(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_string_sets_input() {
        assert_eq!(
            SetInput::parse(&json!("list my boards")),
            Some(SetInput {
                text: "list my boards".into(),
                focus: false
            })
        );
    }

    #[test]
    fn typed_message_can_focus() {
        assert_eq!(
            SetInput::parse(&json!({"type": "setInput", "text": "hi", "focus": true})),
            Some(SetInput {
                text: "hi".into(),
                focus: true
            })
        );
    }

    #[test]
    fn other_messages_are_ignored() {
        for msg in [
            json!({"type": "toolOutput", "text": "x"}),
            json!({"type": "setInput"}),
            json!({"type": "setInput", "text": 3}),
            json!(42),
        ] {
            assert_eq!(SetInput::parse(&msg), None, "{msg}");
        }
    }
}
