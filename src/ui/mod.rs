//! User interface components.

mod chat_input;
mod collapsible;
mod fallback_panel;
pub mod home;
mod mcp_tools;
mod message;
pub mod settings;
mod widget_frame;

use std::rc::Rc;

use dioxus::prelude::*;

use crate::AppSettings;
use crate::chat::{ChatEntry, ChatSession, Transcript};
use crate::llm::ApiClient;
use crate::mcp::HttpMcpClient;

/// Clients shared by the chat page, rebuilt whenever the settings change.
#[derive(Clone)]
pub struct Services {
    pub client: Rc<HttpMcpClient>,
    pub chat: Rc<ChatSession>,
    pub api: Rc<ApiClient>,
    pub widget_base: String,
}

impl Services {
    pub fn new(settings: &AppSettings, transcript: Signal<Transcript>) -> Self {
        let client = Rc::new(HttpMcpClient::new(settings.mcp_endpoint()));
        let sink: Rc<dyn Fn(ChatEntry)> = Rc::new(move |entry| {
            let mut transcript = transcript;
            transcript.write().push(entry);
        });
        Self {
            chat: Rc::new(ChatSession::new(client.clone(), sink)),
            client,
            api: Rc::new(ApiClient::new(settings.api_base())),
            widget_base: settings.widget_base_url(),
        }
    }
}

impl PartialEq for Services {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.chat, &other.chat)
    }
}
