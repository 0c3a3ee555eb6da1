// Copyright © 2025 Nipun Kumar

use dioxus::{logger::tracing::warn, prelude::*};

use crate::{
    AppSettings,
    storage::{Storage, get_storage},
};

#[allow(non_snake_case)]
#[component]
pub fn Settings() -> Element {
    let mut settings_ctx = use_context::<Signal<AppSettings>>();
    let mut draft = use_signal(|| settings_ctx.peek().clone());
    let mut status: Signal<Option<String>> = use_signal(|| None);

    let save_settings = move |s: AppSettings| async move {
        let saved: anyhow::Result<()> =
            async { get_storage().await?.save_settings(&s).await }.await;
        match saved {
            Ok(()) => status.set(Some("Saved.".to_string())),
            Err(e) => {
                warn!("Could not save settings: {e:?}");
                status.set(Some(format!("Could not save settings: {e}")));
            }
        }
        settings_ctx.set(s);
    };

    let current = draft();

    rsx! {
        div { class: "settings",
            h3 { "Settings" }
            hr {}

            label { r#for: "server-url", "Proxy URL" }
            input {
                id: "server-url",
                r#type: "url",
                value: "{current.server_url}",
                oninput: move |e: Event<FormData>| draft.write().server_url = e.value(),
            }
            p { class: "hint", "MCP calls go to {current.mcp_endpoint()}." }

            label { r#for: "widget-base", "Widget base" }
            input {
                id: "widget-base",
                value: "{current.widget_base}",
                oninput: move |e: Event<FormData>| draft.write().widget_base = e.value(),
            }
            p { class: "hint",
                "Packaged widgets load from {current.widget_base_url()}."
            }

            label { class: "checkbox",
                input {
                    r#type: "checkbox",
                    checked: current.trust_widget_origin,
                    oninput: move |e: Event<FormData>| draft.write().trust_widget_origin = e.checked(),
                }
                "Trust widget origin (allow-same-origin)"
            }
            p { class: "hint",
                "Widgets can then reach their own origin's storage and cookies. Only enable this for widgets you trust."
            }

            div { class: "settings-actions",
                button {
                    onclick: move |_| async move {
                        save_settings(draft()).await;
                    },
                    "Save"
                }
                button {
                    onclick: move |_| {
                        draft.set(AppSettings::default());
                        status.set(None);
                    },
                    "Reset to defaults"
                }
            }
            if let Some(status) = status() {
                p { class: "status", "{status}" }
            }
        }
    }
}
