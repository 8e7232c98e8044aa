//! Minimal Docker Engine API client speaking HTTP/1.1 over the daemon's unix socket.
//!
//! Every request opens its own connection. For the long-lived stats stream this
//! means the session owns its socket outright: dropping the returned
//! [`BodyStream`] tears the connection down, which is also what unblocks a read
//! that is waiting on the daemon.

use std::path::PathBuf;
use std::pin::Pin;

use bytes::Bytes;
use hyper::body::{Body, Incoming};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::container::{ContainerID, ContainerRef};
use crate::error::ResultOkLogExt;

use super::{ByteStream, Error, ProcessList, Result, Runtime};

/// Location of the daemon socket on a default installation.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/docker.sock";

#[derive(Debug, Clone)]
pub struct DockerClient {
    socket_path: PathBuf,
}

impl DockerClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// Lists all containers known to the daemon, running or not.
    ///
    /// Entries with an unusable id are skipped and logged.
    pub async fn list_containers(&self) -> Result<Vec<ContainerRef>> {
        let summaries: Vec<ContainerSummary> = self.get_json("/containers/json?all=true").await?;
        log::debug!("Daemon reported {} containers", summaries.len());

        Ok(summaries
            .into_iter()
            .filter_map(ContainerSummary::into_container_ref)
            .collect())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.get(path).await?.read_to_end().await?;
        serde_json::from_slice(&body).map_err(|source| Error::Decode {
            path: path.to_owned(),
            source,
        })
    }

    /// Sends a `GET` request on a fresh connection and returns the response body
    /// of a successful response.
    async fn get(&self, path: &str) -> Result<BodyStream> {
        log::trace!("GET {} via {}", path, self.socket_path.display());
        let stream = tokio::net::UnixStream::connect(&self.socket_path)
            .await
            .map_err(|source| Error::SocketConnect {
                path: self.socket_path.clone(),
                source,
            })?;
        let (mut sender, connection) = http1::handshake(TokioIo::new(stream))
            .await
            .map_err(Error::Handshake)?;
        let connection = ConnectionGuard(tokio::spawn(async move {
            if let Err(err) = connection.await {
                log::debug!("runtime connection closed: {}", err);
            }
        }));

        let request = http::Request::get(path)
            .header(http::header::HOST, "docker")
            .body(String::new())
            .map_err(|source| Error::Request {
                path: path.to_owned(),
                source,
            })?;
        let response = sender
            .send_request(request)
            .await
            .map_err(|source| Error::Send {
                path: path.to_owned(),
                source,
            })?;

        let status = response.status();
        let mut body = BodyStream {
            body: response.into_body(),
            _connection: connection,
        };
        if !status.is_success() {
            let raw = body.read_to_end().await?;
            return Err(Error::Status {
                path: path.to_owned(),
                status: status.as_u16(),
                message: error_message(&raw),
            });
        }

        Ok(body)
    }
}

impl Runtime for DockerClient {
    type Stream = BodyStream;

    async fn stats_stream(&self, container_id: &ContainerID) -> Result<BodyStream> {
        self.get(&format!("/containers/{container_id}/stats?stream=true"))
            .await
    }

    async fn top(&self, container_id: &ContainerID) -> Result<ProcessList> {
        self.get_json(&format!("/containers/{container_id}/top"))
            .await
    }
}

/// Aborts the task driving a connection when dropped.
#[derive(Debug)]
struct ConnectionGuard(tokio::task::JoinHandle<()>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Body of a response, together with the connection it arrives on.
#[derive(Debug)]
pub struct BodyStream {
    body: Incoming,
    _connection: ConnectionGuard,
}

impl BodyStream {
    async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next_chunk().await? {
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }
}

impl ByteStream for BodyStream {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        loop {
            let frame = std::future::poll_fn(|cx| Pin::new(&mut self.body).poll_frame(cx)).await;
            match frame {
                None => return Ok(None),
                Some(Err(err)) => return Err(Error::Body(err)),
                // trailers carry no payload
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        return Ok(Some(data));
                    }
                }
            }
        }
    }
}

/// Extracts `message` from a daemon error body, falling back to the raw text.
fn error_message(raw: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    match serde_json::from_slice::<ErrorBody>(raw) {
        Ok(body) => body.message,
        Err(_) => String::from_utf8_lossy(raw).trim().to_owned(),
    }
}

/// One entry of `GET /containers/json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerSummary {
    id: String,
    #[serde(default)]
    names: Option<Vec<String>>,
    #[serde(default)]
    command: String,
    #[serde(default)]
    state: String,
}

impl ContainerSummary {
    fn into_container_ref(self) -> Option<ContainerRef> {
        let id = ContainerID::new(&self.id).ok_log(log::Level::Warn)?;
        Some(ContainerRef::new(
            id,
            self.names.unwrap_or_default(),
            self.command,
            self.state.eq_ignore_ascii_case("running"),
        ))
    }
}
