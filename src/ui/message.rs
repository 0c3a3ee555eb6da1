use dioxus::prelude::*;

use crate::chat::{ChatEntry, ToolTurn, TurnOrigin};
use crate::ui::{Services, collapsible::Collapsible, widget_frame::WidgetFrame};

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "Invalid JSON".to_string())
}

#[component]
pub fn MessageEl(entry: ChatEntry, services: Services) -> Element {
    match entry {
        ChatEntry::User { text } => rsx! {
            div { class: "message human-message", "{text}" }
        },
        ChatEntry::Notice { text } => rsx! {
            div { class: "message notice", "{text}" }
        },
        ChatEntry::Tool(turn) => rsx! {
            ToolMessage { turn, services }
        },
    }
}

#[component]
fn ToolMessage(turn: ToolTurn, services: Services) -> Element {
    let origin = match &turn.origin {
        TurnOrigin::User => String::new(),
        TurnOrigin::Widget(Some(widget)) => format!("requested by {widget}"),
        TurnOrigin::Widget(None) => "requested by a widget".to_string(),
    };
    let class = if turn.is_error {
        "message tool-message error"
    } else {
        "message tool-message"
    };
    let arguments = pretty(&turn.arguments);
    let result = pretty(&turn.result);

    rsx! {
        div { class,
            div { class: "tool-header",
                strong { "{turn.tool}" }
                if !origin.is_empty() {
                    span { class: "origin", "{origin}" }
                }
            }
            Collapsible { c: true, label: "Arguments",
                pre { "{arguments}" }
            }
            if !turn.text.is_empty() {
                div { class: "tool-text", "{turn.text}" }
            }
            if let Some(reference) = turn.widget.clone() {
                WidgetFrame {
                    services: services.clone(),
                    reference,
                    payload: turn.payload.clone(),
                    tool: turn.tool.clone(),
                }
            }
            Collapsible { c: true, label: "Raw result",
                pre { "{result}" }
            }
        }
    }
}
