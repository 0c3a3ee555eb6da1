// Copyright © 2025 Nipun Kumar

use dioxus::prelude::*;

use crate::mcp::McpTool;

#[derive(Props, Clone, PartialEq)]
pub struct McpToolsProps {
    pub tools: Vec<McpTool>,
    pub selected: Option<String>,
    pub on_select: EventHandler<String>,
    pub on_refresh: EventHandler<()>,
}

/// Tools advertised by the server; one of them is the composer's target.
#[component]
pub fn McpTools(props: McpToolsProps) -> Element {
    let is_empty = props.tools.is_empty();

    rsx! {
        div { class: "tool-list",
            div { class: "tool-list-header",
                h2 { "Tools" }
                button {
                    title: "Reload tools",
                    onclick: move |_| props.on_refresh.call(()),
                    "↻"
                }
            }

            if is_empty {
                div { class: "tool-list-empty", "No MCP tools available" }
            } else {
                {
                    props
                        .tools
                        .into_iter()
                        .map(|tool| {
                            let selected = props.selected.as_deref() == Some(tool.name.as_str());
                            rsx! {
                                ToolCard {
                                    key: "{tool.name}",
                                    tool,
                                    selected,
                                    on_select: props.on_select,
                                }
                            }
                        })
                }
            }
        }
    }
}

#[derive(Props, Clone, PartialEq)]
struct ToolCardProps {
    tool: McpTool,
    selected: bool,
    on_select: EventHandler<String>,
}

#[component]
fn ToolCard(props: ToolCardProps) -> Element {
    let mut expanded = use_signal(|| false);
    let name = props.tool.name.clone();
    let class = if props.selected {
        "tool-card selected"
    } else {
        "tool-card"
    };

    rsx! {
        div { class,
            div {
                class: "tool-card-header",
                onclick: move |_| props.on_select.call(name.clone()),

                div { style: "flex: 1;",
                    h3 { "{props.tool.name}" }
                    if let Some(description) = &props.tool.description {
                        div { class: "tool-description", "{description}" }
                    }
                }

                button {
                    class: "tool-expand",
                    onclick: move |e| {
                        e.stop_propagation();
                        expanded.toggle();
                    },
                    if expanded() {
                        "−"
                    } else {
                        "+"
                    }
                }
            }

            if expanded() {
                div { class: "tool-schema",
                    h4 { "Input Schema:" }
                    pre {
                        "{serde_json::to_string_pretty(&props.tool.input_schema).unwrap_or_else(|_| \"Invalid JSON\".to_string())}"
                    }
                }
            }
        }
    }
}
