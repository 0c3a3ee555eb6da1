// Copyright © 2025 Nipun Kumar

use dioxus::prelude::*;

const SEND_ICON: Asset = asset!("/assets/send.svg");

/// Element id of the composer, focused on request of an embedding page.
pub const COMPOSER_ID: &str = "composer";

/// Composer for the selected tool. The draft lives with the caller so an
/// embedding page can prefill it.
#[component]
pub fn ChatInput(
    disabled: bool,
    placeholder: String,
    draft: Signal<String>,
    on_send: Callback<String, ()>,
) -> Element {
    let mut draft = draft;
    let mut submit = move || {
        let text = draft.peek().trim().to_string();
        if disabled || text.is_empty() {
            return;
        }
        draft.set(String::new());
        on_send(text);
    };
    let can_send = !disabled && !draft.read().trim().is_empty();

    rsx! {
        div { class: "composer",
            textarea {
                id: COMPOSER_ID,
                placeholder,
                disabled,
                value: draft,
                oninput: move |e: Event<FormData>| draft.set(e.value()),
                // Enter sends, Shift+Enter keeps typing
                onkeydown: move |e: Event<KeyboardData>| {
                    if e.code() == Code::Enter && !e.modifiers().shift() {
                        e.prevent_default();
                        submit();
                    }
                },
            }
            button {
                title: "Send (Enter)",
                disabled: !can_send,
                onclick: move |_| submit(),
                img { src: SEND_ICON }
            }
        }
    }
}
