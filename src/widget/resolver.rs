use std::rc::Rc;

use dioxus::logger::tracing::{debug, warn};
use serde::Serialize;

use crate::mcp::{McpClient, ResourceContents};

use super::WidgetReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    NoStrategyMatched,
}

impl UnavailableReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnavailableReason::NoStrategyMatched => "no_strategy_matched",
        }
    }
}

/// Outcome of resolving a widget reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResolvedResource {
    Direct {
        url: String,
    },
    Inline {
        html: String,
        #[serde(rename = "baseUrl", skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    Unavailable {
        #[serde(rename = "reasonCode")]
        reason: UnavailableReason,
    },
}

impl ResolvedResource {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ResolvedResource::Unavailable { .. })
    }
}

/// Turns widget references into renderable documents: direct URLs as-is,
/// then HTML served by the MCP backend, then the static widget namespace.
pub struct ResourceResolver {
    client: Rc<dyn McpClient>,
    static_base: String,
}

impl ResourceResolver {
    pub fn new(client: Rc<dyn McpClient>, static_base: impl Into<String>) -> Self {
        Self {
            client,
            static_base: static_base.into(),
        }
    }

    /// Single attempt, never fails: remote errors only move resolution on
    /// to the next strategy.
    pub async fn resolve(&self, reference: &WidgetReference) -> ResolvedResource {
        if reference.is_direct() {
            return ResolvedResource::Direct {
                url: reference.as_str().to_string(),
            };
        }

        match self.client.read_resource(reference.as_str()).await {
            Ok(contents) => match inline_html(contents) {
                Some(inline) => return inline,
                None => debug!(%reference, "resource has no html content"),
            },
            Err(e) => warn!(%reference, "reading widget resource failed: {e}"),
        }

        if let Some(url) = reference.static_asset_path(&self.static_base) {
            debug!(%reference, %url, "using packaged widget");
            return ResolvedResource::Direct { url };
        }

        ResolvedResource::Unavailable {
            reason: UnavailableReason::NoStrategyMatched,
        }
    }
}

fn inline_html(contents: ResourceContents) -> Option<ResolvedResource> {
    contents
        .contents
        .into_iter()
        .find(|part| {
            part.mime_type
                .as_deref()
                .is_some_and(|m| m.to_ascii_lowercase().contains("html"))
                && part.text.as_deref().is_some_and(|t| !t.trim().is_empty())
        })
        .and_then(|part| {
            Some(ResolvedResource::Inline {
                html: part.text?,
                base_url: part.uri.filter(|u| !u.is_empty()),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::ResourceContent;
    use crate::widget::testing::FakeClient;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn resolver(client: &Rc<FakeClient>) -> ResourceResolver {
        ResourceResolver::new(client.clone(), "/widgets")
    }

    #[tokio::test]
    async fn direct_references_skip_the_network() {
        let client = Rc::new(FakeClient::failing());
        for reference in ["https://x.test/w.html", "/static/w.html"] {
            let resolved = resolver(&client).resolve(&reference.into()).await;
            assert_eq!(
                resolved,
                ResolvedResource::Direct {
                    url: reference.to_string()
                }
            );
        }
        assert!(client.reads().is_empty());
    }

    #[tokio::test]
    async fn backend_html_is_inlined() {
        let client = Rc::new(FakeClient::serving(ResourceContents {
            contents: vec![
                ResourceContent {
                    uri: Some("ui://widget/board.html".into()),
                    mime_type: Some("text/plain".into()),
                    text: Some("not this".into()),
                    blob: None,
                },
                ResourceContent {
                    uri: Some("ui://widget/board.html".into()),
                    mime_type: Some("text/html+skybridge".into()),
                    text: Some("<div id=board></div>".into()),
                    blob: None,
                },
            ],
        }));
        let resolved = resolver(&client)
            .resolve(&"ui://widget/board.html".into())
            .await;
        assert_eq!(
            resolved,
            ResolvedResource::Inline {
                html: "<div id=board></div>".into(),
                base_url: Some("ui://widget/board.html".into()),
            }
        );
        assert_eq!(client.reads(), vec!["ui://widget/board.html".to_string()]);
    }

    #[tokio::test]
    async fn failed_read_falls_back_to_static_widget() {
        let client = Rc::new(FakeClient::failing());
        let resolved = resolver(&client)
            .resolve(&"ui://widget/Board.HTML".into())
            .await;
        assert_eq!(
            resolved,
            ResolvedResource::Direct {
                url: "/widgets/board.html".into()
            }
        );
        assert_eq!(client.reads().len(), 1);
    }

    #[tokio::test]
    async fn blank_html_is_not_renderable() {
        let client = Rc::new(FakeClient::serving(ResourceContents {
            contents: vec![ResourceContent {
                mime_type: Some("text/html".into()),
                text: Some("  \n ".into()),
                ..Default::default()
            }],
        }));
        let resolved = resolver(&client).resolve(&"ui://widget/x".into()).await;
        assert_eq!(
            resolved,
            ResolvedResource::Direct {
                url: "/widgets/x.html".into()
            }
        );
    }

    #[tokio::test]
    async fn opaque_reference_without_html_is_unavailable() {
        let client = Rc::new(FakeClient::failing());
        let resolved = resolver(&client).resolve(&"board".into()).await;
        assert!(resolved.is_unavailable());
        assert_eq!(
            serde_json::to_value(&resolved).unwrap(),
            json!({"kind": "unavailable", "reasonCode": "no_strategy_matched"})
        );
    }
}
