//! Proxy configuration, read from the environment.

use std::path::PathBuf;

use dioxus::logger::tracing::warn;

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/v1";

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderSettings {
    OpenRouter { api_key: String, model: Option<String> },
    Ollama { api_url: String, model: Option<String> },
}

impl ProviderSettings {
    pub fn is_configured(&self) -> bool {
        match &self {
            ProviderSettings::OpenRouter { api_key, model } => {
                !api_key.is_empty() && model.is_some()
            }
            ProviderSettings::Ollama { api_url, model } => !api_url.is_empty() && model.is_some(),
        }
    }

    pub fn get_api_url(&self) -> String {
        match &self {
            ProviderSettings::OpenRouter { .. } => "https://openrouter.ai/api/v1".to_string(),
            ProviderSettings::Ollama { api_url, .. } => api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn get_api_key(&self) -> Option<String> {
        match &self {
            ProviderSettings::OpenRouter { api_key, .. } => Some(api_key.clone()),
            ProviderSettings::Ollama { .. } => None,
        }
    }

    pub fn get_model(&self) -> Option<String> {
        match &self {
            ProviderSettings::OpenRouter { model, .. } => model.clone(),
            ProviderSettings::Ollama { model, .. } => model.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    pub bind_address: String,
    /// JSON-RPC endpoint of the MCP server `POST /mcp` forwards to.
    pub mcp_url: Option<String>,
    pub mcp_ws_url: Option<String>,
    pub widget_dir: Option<PathBuf>,
    pub provider: Option<ProviderSettings>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND.to_string(),
            mcp_url: None,
            mcp_ws_url: None,
            widget_dir: None,
            provider: None,
        }
    }
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let model = get("MCPCHAT_LLM_MODEL");

        let provider = match get("MCPCHAT_LLM_PROVIDER").map(|p| p.to_lowercase()).as_deref() {
            None => None,
            Some("openrouter") => Some(ProviderSettings::OpenRouter {
                api_key: get("OPENROUTER_API_KEY").unwrap_or_default(),
                model,
            }),
            Some("ollama") => Some(ProviderSettings::Ollama {
                api_url: get("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
                model,
            }),
            Some(other) => {
                warn!(provider = other, "unknown language model provider, ignoring it");
                None
            }
        };
        let provider = provider.filter(|p| {
            let ok = p.is_configured();
            if !ok {
                warn!("language model provider is missing its key or model, ignoring it");
            }
            ok
        });

        Self {
            bind_address: get("MCPCHAT_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            mcp_url: get("MCPCHAT_MCP_URL"),
            mcp_ws_url: get("MCPCHAT_MCP_WS_URL"),
            widget_dir: get("MCPCHAT_WIDGET_DIR").map(PathBuf::from),
            provider,
        }
    }
}
