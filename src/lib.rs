use dioxus::prelude::*;

pub mod app_settings;
pub mod chat;
pub mod embed;
pub mod llm;
pub mod mcp;
pub mod storage;
mod ui;
pub mod widget;

#[cfg(feature = "proxy")]
pub mod proxy;

pub use app_settings::AppSettings;

use ui::home::Home;
use ui::settings::Settings;

const FAVICON: Asset = asset!("/assets/favicon.svg");
const MAIN_CSS: Asset = asset!("/assets/main.css");

#[component]
pub fn App() -> Element {
    let mut settings = use_context_provider(|| Signal::new(AppSettings::default()));
    let init = use_resource(move || async move {
        settings.set(storage::load_or_default().await);
    });
    rsx! {
        document::Link { rel: "icon", href: FAVICON }
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        if init.read().is_none() {
            "Loading..."
        } else {
            Router::<Route> {}
        }
    }
}

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(Layout)]
    #[route("/")]
    Home {},
    #[route("/settings")]
    Settings { },
    #[route("/:..segments")]
    PageNotFound { segments: Vec<String> },
}

/// Shared layout component.
#[component]
fn Layout() -> Element {
    rsx! {
        nav { class: "topbar",
            Link { to: Route::Home {}, "Chat" }
            Link { to: Route::Settings {}, "Settings" }
        }
        Outlet::<Route> {}
    }
}

#[component]
fn PageNotFound(segments: Vec<String>) -> Element {
    rsx! {
        "Could not find the page you are looking for."
        Link { to: Route::Home {}, "Go To Home" }
    }
}
