//! Companion HTTP server for the chat client.
//!
//! Browsers cannot talk to most MCP servers directly (CORS), so the client
//! points at this proxy instead. It forwards JSON-RPC over `POST /mcp`,
//! bridges `GET /mcp/ws` to a WebSocket backend, serves packaged widgets and
//! fronts the language model used for argument inference and summaries.

pub mod config;
pub mod error;
pub mod llm;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::{HeaderMap, HeaderName, header},
    response::Response,
    routing::{get, post},
};
use dioxus::logger::tracing::{debug, info, warn};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message as UpstreamMessage;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use config::{ProviderSettings, ProxyConfig};
pub use error::{ProxyError, ProxyResult};
pub use llm::LanguageModel;

use crate::{
    llm::{InferRequest, InferResponse},
    widget::{SummaryRequest, SummaryResponse},
};

const MCP_SESSION_ID: HeaderName = HeaderName::from_static("mcp-session-id");

/// Request headers copied to the backend, and response headers copied back.
const FORWARDED: [HeaderName; 3] = [header::CONTENT_TYPE, header::ACCEPT, MCP_SESSION_ID];

#[derive(Clone)]
pub struct ProxyState {
    pub http: reqwest::Client,
    pub config: Arc<ProxyConfig>,
    pub model: Option<Arc<LanguageModel>>,
}

impl ProxyState {
    pub fn new(config: ProxyConfig) -> Self {
        let http = reqwest::Client::new();
        let model = config
            .provider
            .clone()
            .map(|p| Arc::new(LanguageModel::new(http.clone(), p)));
        Self {
            http,
            config: Arc::new(config),
            model,
        }
    }

    fn model(&self) -> ProxyResult<&LanguageModel> {
        self.model.as_deref().ok_or(ProxyError::NoModel)
    }
}

pub fn router(state: ProxyState) -> Router {
    let mut app = Router::new()
        .route("/healthz", get(healthz))
        .route("/mcp", post(forward_mcp))
        .route("/mcp/ws", get(bridge_ws))
        .route("/api/infer", post(infer))
        .route("/api/summarize", post(summarize));

    if let Some(dir) = &state.config.widget_dir {
        app = app.nest_service("/widgets", ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `config.bind_address` and serves until the process stops.
pub async fn serve(config: ProxyConfig) -> ProxyResult<()> {
    let addr: SocketAddr = config.bind_address.parse()?;
    match &config.mcp_url {
        Some(url) => info!(%url, "forwarding MCP requests"),
        None => warn!("MCPCHAT_MCP_URL is not set, /mcp will fail"),
    }
    if config.provider.is_none() {
        warn!("no language model configured, /api/infer and /api/summarize will fail");
    }

    let app = router(ProxyState::new(config));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "mcpchat proxy listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn forward_mcp(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Bytes,
) -> ProxyResult<Response> {
    let url = state
        .config
        .mcp_url
        .as_deref()
        .ok_or(ProxyError::NotConfigured("MCPCHAT_MCP_URL"))?;

    let mut req = state.http.post(url).body(body);
    for name in FORWARDED {
        if let Some(value) = headers.get(&name) {
            req = req.header(name, value);
        }
    }
    let upstream = req.send().await?;
    debug!(status = %upstream.status(), "MCP backend replied");

    let mut resp = Response::builder().status(upstream.status());
    for name in FORWARDED {
        if let Some(value) = upstream.headers().get(&name) {
            resp = resp.header(name, value);
        }
    }
    resp.body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| ProxyError::BadUpstreamReply(e.to_string()))
}

async fn bridge_ws(
    State(state): State<ProxyState>,
    ws: WebSocketUpgrade,
) -> ProxyResult<Response> {
    let url = state
        .config
        .mcp_ws_url
        .clone()
        .ok_or(ProxyError::NotConfigured("MCPCHAT_MCP_WS_URL"))?;
    Ok(ws.on_upgrade(move |socket| pump(socket, url)))
}

/// Relays frames between the browser and the backend until either side closes.
async fn pump(client: WebSocket, url: String) {
    let upstream = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            warn!(%url, "could not reach MCP WebSocket backend: {e}");
            let mut client = client;
            let _ = client.send(Message::Close(None)).await;
            return;
        }
    };
    info!(%url, "WebSocket bridge open");

    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();

    let to_upstream = async {
        while let Some(Ok(msg)) = client_rx.next().await {
            let msg = match msg {
                Message::Text(t) => UpstreamMessage::text(t.as_str().to_owned()),
                Message::Binary(b) => UpstreamMessage::Binary(b),
                Message::Ping(b) => UpstreamMessage::Ping(b),
                Message::Pong(b) => UpstreamMessage::Pong(b),
                Message::Close(_) => break,
            };
            if upstream_tx.send(msg).await.is_err() {
                break;
            }
        }
        let _ = upstream_tx.send(UpstreamMessage::Close(None)).await;
    };
    let to_client = async {
        while let Some(Ok(msg)) = upstream_rx.next().await {
            let msg = match msg {
                UpstreamMessage::Text(t) => Message::Text(t.as_str().to_owned().into()),
                UpstreamMessage::Binary(b) => Message::Binary(b),
                UpstreamMessage::Ping(b) => Message::Ping(b),
                UpstreamMessage::Pong(b) => Message::Pong(b),
                UpstreamMessage::Close(_) => break,
                UpstreamMessage::Frame(_) => continue,
            };
            if client_tx.send(msg).await.is_err() {
                break;
            }
        }
        let _ = client_tx.send(Message::Close(None)).await;
    };

    tokio::select! {
        _ = to_upstream => {}
        _ = to_client => {}
    }
    info!(%url, "WebSocket bridge closed");
}

async fn infer(
    State(state): State<ProxyState>,
    Json(req): Json<InferRequest>,
) -> ProxyResult<Json<InferResponse>> {
    if req.text.trim().is_empty() {
        return Err(ProxyError::BadRequest("text must not be empty".into()));
    }
    let arguments = state.model()?.infer(&req).await?;
    Ok(Json(InferResponse { arguments }))
}

async fn summarize(
    State(state): State<ProxyState>,
    Json(req): Json<SummaryRequest>,
) -> ProxyResult<Json<SummaryResponse>> {
    if req.structured_content.is_null() {
        return Err(ProxyError::BadRequest("structuredContent is required".into()));
    }
    let summary = state.model()?.summarize(&req).await?;
    Ok(Json(SummaryResponse { summary }))
}
