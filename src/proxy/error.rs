//! Proxy error type and its HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub type ProxyResult<T> = Result<T, ProxyError>;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("{0}")]
    BadRequest(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("{0}")]
    BadUpstreamReply(String),

    #[error("no language model is configured")]
    NoModel,

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("invalid address: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) | ProxyError::BadUpstreamReply(_) => StatusCode::BAD_GATEWAY,
            ProxyError::NoModel => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::NotConfigured(_) => StatusCode::NOT_IMPLEMENTED,
            ProxyError::AddrParse(_) | ProxyError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    #[tokio::test]
    async fn errors_render_as_json() {
        let resp = ProxyError::NotConfigured("MCPCHAT_MCP_WS_URL").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "MCPCHAT_MCP_WS_URL is not configured" }));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(ProxyError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::BadUpstreamReply("x".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ProxyError::NoModel.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
