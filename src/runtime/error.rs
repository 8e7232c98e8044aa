use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to socket `{path}`: {source}")]
    SocketConnect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP handshake with the runtime failed: {0}")]
    Handshake(#[source] hyper::Error),
    #[error("failed to build request for `{path}`: {source}")]
    Request {
        path: String,
        #[source]
        source: http::Error,
    },
    #[error("request to `{path}` failed: {source}")]
    Send {
        path: String,
        #[source]
        source: hyper::Error,
    },
    #[error("failed to read response body: {0}")]
    Body(#[source] hyper::Error),
    #[error("runtime answered `{path}` with status {status}: {message}")]
    Status {
        path: String,
        status: u16,
        message: String,
    },
    #[error("failed to decode response of `{path}`: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
