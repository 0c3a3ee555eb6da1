use std::rc::Rc;

use dioxus::prelude::*;

use crate::ui::Services;
use crate::widget::{FallbackSummarizer, FallbackView, ToolPayload, WidgetReference};

/// Textual stand-in for a widget that could not be resolved.
#[component]
pub fn FallbackPanel(
    services: Services,
    payload: ToolPayload,
    tool: String,
    reference: WidgetReference,
) -> Element {
    let summarizer = use_hook({
        let api = services.api.clone();
        move || Rc::new(FallbackSummarizer::new(api))
    });
    let mut view = use_signal(|| FallbackView::Loading);

    let _ = use_resource({
        let summarizer = summarizer.clone();
        use_reactive!(|payload, tool, reference| {
            let summarizer = summarizer.clone();
            async move {
                view.set(FallbackView::Loading);
                if let Some(next) = summarizer
                    .summarize(&payload, Some(&tool), Some(&reference))
                    .await
                {
                    view.set(next);
                }
            }
        })
    });

    use_drop(move || summarizer.cancel());

    let view = view();
    let class = match &view {
        FallbackView::Loading => "widget-fallback loading",
        FallbackView::Summary(_) => "widget-fallback",
        FallbackView::Failed(_) => "widget-fallback error",
        FallbackView::NoData => "widget-fallback empty",
    };
    rsx! {
        div { class,
            div { class: "fallback-note", "Widget {reference} is unavailable." }
            p { "{view.text()}" }
        }
    }
}
