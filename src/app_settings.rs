use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8787";
pub const DEFAULT_WIDGET_BASE: &str = "/widgets";

/// Client configuration, persisted through [`crate::storage::Storage`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub id: Option<u32>,
    /// Base URL of the proxy.
    pub server_url: String,
    /// Where packaged widgets are served from.
    pub widget_base: String,
    /// Lets widgets run with their own origin (`allow-same-origin`).
    pub trust_widget_origin: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            id: Some(1),
            server_url: DEFAULT_SERVER_URL.to_string(),
            widget_base: DEFAULT_WIDGET_BASE.to_string(),
            trust_widget_origin: false,
        }
    }
}

impl AppSettings {
    fn server(&self) -> &str {
        self.server_url.trim().trim_end_matches('/')
    }

    pub fn mcp_endpoint(&self) -> String {
        format!("{}/mcp", self.server())
    }

    pub fn api_base(&self) -> String {
        self.server().to_string()
    }

    /// Static widget base, relative to the proxy unless it is a URL.
    pub fn widget_base_url(&self) -> String {
        let base = self.widget_base.trim();
        if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else if base.starts_with('/') {
            format!("{}{base}", self.server())
        } else {
            format!("{}/{base}", self.server())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"id": 1, "trust_widget_origin": true}"#).unwrap();
        assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
        assert!(settings.trust_widget_origin);
    }

    #[test]
    fn endpoints_follow_server_url() {
        let settings = AppSettings {
            server_url: "https://chat.test/".into(),
            ..Default::default()
        };
        assert_eq!(settings.mcp_endpoint(), "https://chat.test/mcp");
        assert_eq!(settings.widget_base_url(), "https://chat.test/widgets");

        let cdn = AppSettings {
            widget_base: "https://cdn.test/w".into(),
            ..settings
        };
        assert_eq!(cdn.widget_base_url(), "https://cdn.test/w");
    }
}
