use dioxus::prelude::*;

const EXPAND_ICON: Asset = asset!("/assets/expand.svg");
const COLLAPSE_ICON: Asset = asset!("/assets/collapse.svg");

/// Labelled section of a transcript entry; `c` is the initial collapsed state.
#[component]
pub fn Collapsible(c: bool, label: String, children: Element) -> Element {
    let mut open = use_signal(|| !c);
    let icon = if open() { COLLAPSE_ICON } else { EXPAND_ICON };

    rsx! {
        div { class: "collapsible",
            button {
                class: "collapsible-toggle",
                aria_expanded: open(),
                onclick: move |_| open.toggle(),
                img { src: icon }
                span { "{label}" }
            }
            if open() {
                {children}
            }
        }
    }
}
