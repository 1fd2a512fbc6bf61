//! Reachability probes.
//!
//! A probe performs one best-effort network check and must return within
//! the timeout it is given. The default [`HttpProbe`] issues `GET` on the
//! ping URL and expects a 2xx answer whose body is the expected token.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Limited};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tracing::debug;

/// Largest ping response body read before giving up.
pub const MAX_BODY_BYTES: usize = 1024;

/// Boxed future returned by [`ReachabilityProbe::probe`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Why a probe did not confirm reachability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("invalid probe url: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("unexpected status: {0}")]
    Status(u16),

    #[error("unexpected response body: {0:?}")]
    UnexpectedBody(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Result of a single probe.
///
/// `reachable` is authoritative. `error` carries transport detail for
/// diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub reachable: bool,
    pub error: Option<ProbeError>,
}

impl ProbeOutcome {
    pub fn reachable() -> Self {
        Self {
            reachable: true,
            error: None,
        }
    }

    pub fn unreachable(error: ProbeError) -> Self {
        Self {
            reachable: false,
            error: Some(error),
        }
    }
}

/// A network reachability check.
pub trait ReachabilityProbe: Send + Sync {
    /// Check `url`, expecting `expected_body` back within `timeout`.
    fn probe<'a>(
        &'a self,
        url: &'a str,
        expected_body: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, ProbeOutcome>;
}

/// HTTP/1 ping probe built on hyper.
#[derive(Debug, Clone, Default)]
pub struct HttpProbe;

impl HttpProbe {
    pub fn new() -> Self {
        Self
    }
}

impl ReachabilityProbe for HttpProbe {
    fn probe<'a>(
        &'a self,
        url: &'a str,
        expected_body: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, ProbeOutcome> {
        Box::pin(async move {
            match tokio::time::timeout(timeout, http_ping(url, expected_body)).await {
                Ok(Ok(())) => ProbeOutcome::reachable(),
                Ok(Err(e)) => {
                    debug!(error = %e, %url, "ping failed");
                    ProbeOutcome::unreachable(e)
                }
                Err(_) => {
                    debug!(%url, "ping timed out");
                    ProbeOutcome::unreachable(ProbeError::Timeout(timeout))
                }
            }
        })
    }
}

async fn http_ping(url: &str, expected_body: &str) -> Result<(), ProbeError> {
    let uri: http::Uri = url
        .parse()
        .map_err(|_| ProbeError::InvalidUrl(url.to_string()))?;
    let authority = uri
        .authority()
        .ok_or_else(|| ProbeError::InvalidUrl(url.to_string()))?
        .clone();
    let host = authority.host().trim_start_matches('[').trim_end_matches(']');
    let port = authority.port_u16().unwrap_or(80);

    let stream = tokio::net::TcpStream::connect((host, port))
        .await
        .map_err(|e| ProbeError::Connect(e.to_string()))?;

    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| ProbeError::Handshake(e.to_string()))?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let req = http::Request::builder()
        .method(http::Method::GET)
        .uri(path)
        .header(http::header::HOST, authority.as_str())
        .header(http::header::USER_AGENT, "conncheck/0.1")
        .body(Empty::<Bytes>::new())
        .map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| ProbeError::Request(e.to_string()))?;

    let status = resp.status();
    let body = Limited::new(resp.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| ProbeError::Body(e.to_string()))?
        .to_bytes();

    if !status.is_success() {
        return Err(ProbeError::Status(status.as_u16()));
    }

    let text = String::from_utf8_lossy(&body);
    let text = text.trim();
    if text != expected_body {
        return Err(ProbeError::UnexpectedBody(text.chars().take(64).collect()));
    }

    Ok(())
}
