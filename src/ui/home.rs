//! Chat page: tool list, transcript and composer.
//!
//! Every user turn targets the selected tool. A JSON object typed into the
//! composer is sent as the arguments; anything else goes through argument
//! inference first.

use dioxus::{
    logger::tracing::{info, warn},
    prelude::*,
};

use crate::{
    AppSettings,
    chat::{Composed, Transcript, TurnOrigin},
    mcp::McpTool,
    ui::{Services, chat_input::ChatInput, mcp_tools::McpTools, message::MessageEl},
};

#[cfg(target_arch = "wasm32")]
fn listen_for_embedder(draft: Signal<String>) -> Option<std::rc::Rc<crate::embed::EmbedListener>> {
    use crate::ui::chat_input::COMPOSER_ID;
    use wasm_bindgen::JsCast;

    let listener = crate::embed::EmbedListener::attach(move |input| {
        let mut draft = draft;
        draft.set(input.text);
        if input.focus
            && let Some(composer) = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.get_element_by_id(COMPOSER_ID))
                .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
        {
            let _ = composer.focus();
        }
    });
    match listener {
        Ok(listener) => Some(std::rc::Rc::new(listener)),
        Err(e) => {
            warn!("not listening to the embedding page: {e:#}");
            None
        }
    }
}

/// Main chat interface component.
#[component]
pub fn Home() -> Element {
    let settings = use_context::<Signal<AppSettings>>();
    let transcript = use_signal(Transcript::default);
    let services = use_memo(move || Services::new(&settings.read(), transcript));

    let mut selected: Signal<Option<String>> = use_signal(|| None);
    let mut busy = use_signal(|| false);
    let draft = use_signal(String::new);

    #[cfg(target_arch = "wasm32")]
    let _embedder = use_hook(move || listen_for_embedder(draft));

    let mut tools = use_resource(move || async move {
        let services = services();
        match services.chat.refresh_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                warn!("could not list tools: {e:#}");
                services.chat.notice(format!("Could not list tools: {e:#}"));
                vec![]
            }
        }
    });
    let tool_list: Vec<McpTool> = tools().unwrap_or_default();

    let send_msg = move |text: String| async move {
        let services = services();
        let Some(tool) = selected() else {
            services.chat.notice("Select a tool first.");
            return;
        };
        let Some(composed) = Composed::parse(&text) else {
            return;
        };
        services.chat.say(text.trim());

        let arguments = match composed {
            Composed::Arguments(arguments) => Ok(arguments),
            Composed::Prompt(prompt) => match services.chat.tool(&tool) {
                Some(descriptor) => services.api.infer_arguments(&descriptor, &prompt).await,
                None => Err(anyhow::anyhow!("{tool} is no longer available")),
            },
        };
        match arguments {
            Ok(arguments) => {
                info!(%tool, "running tool");
                // failures are already in the transcript
                let _ = services
                    .chat
                    .run_tool(&tool, arguments, TurnOrigin::User)
                    .await;
            }
            Err(e) => services
                .chat
                .notice(format!("Could not infer arguments: {e:#}")),
        }
    };

    let placeholder = match selected() {
        Some(tool) => format!("Describe what {tool} should do, or type its JSON arguments"),
        None => "Select a tool to start".to_string(),
    };
    let current = services();

    rsx! {
        div { class: "content",
            aside { class: "sidebar",
                McpTools {
                    tools: tool_list,
                    selected: selected(),
                    on_select: move |name: String| selected.set(Some(name)),
                    on_refresh: move |_| tools.restart(),
                }
            }
            div { class: "chat",
                div { class: "transcript",
                    // append-only, so positions are stable keys
                    for (i, entry) in transcript.read().entries().iter().enumerate() {
                        MessageEl { key: "{i}", entry: entry.clone(), services: current.clone() }
                    }
                    if busy() {
                        div { class: "message notice", "Working…" }
                    }
                }
                div { class: "composer-area",
                    ChatInput {
                        disabled: busy() || selected().is_none(),
                        placeholder,
                        draft,
                        on_send: Callback::new(move |s: String| async move {
                            if busy() {
                                return;
                            }
                            busy.set(true);
                            send_msg(s).await;
                            busy.set(false);
                        }),
                    }
                }
            }
        }
    }
}
