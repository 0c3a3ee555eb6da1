use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("request to MCP server failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("MCP server returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("{method} failed ({code}): {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no response to {0}")]
    MissingResponse(String),

    #[error("unexpected server request {0} while waiting for a response")]
    UnexpectedRequest(String),
}
