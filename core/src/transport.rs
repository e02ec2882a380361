//! The transport capability and its production implementation.
//!
//! # Design
//! `Client` never touches the network itself. It hands a fully built
//! `HttpRequest` to a `Transport` together with the caller's cancellation
//! token and gets back an `HttpResponse`. Connection pooling, TLS and
//! timeouts belong to the transport and are configured by whoever builds it.
//! A transport is injected per client; wrap it in an `Arc` (or lend it by
//! reference) to share one transport across many clients.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse, ResponseBody};

/// Performs one HTTP exchange.
///
/// Implementations should stop work once `cancel` fires if they can. The
/// client races the returned future against the token anyway, so a
/// transport that ignores it is abandoned rather than waited on.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        (**self).send(request, cancel).await
    }
}

#[async_trait]
impl<'a, T: Transport + ?Sized> Transport for &'a T {
    async fn send(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        (**self).send(request, cancel).await
    }
}

/// Upper bound on an exchange when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for [`UreqTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Upper bound on a whole exchange, including reading the payload.
    /// `None` waits indefinitely, and an exchange abandoned by cancellation
    /// then holds its blocking thread and socket until the peer answers.
    pub timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

/// Blocking `ureq` agent driven from the tokio blocking pool.
///
/// Status codes are returned as data (`http_status_as_error(false)`), the
/// client decides what counts as failure. The payload is read into memory
/// on the blocking thread, so the socket is back in the agent's pool before
/// the response reaches the client. Payloads are not size-limited, and any
/// method token is sent as given.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_config(&TransportConfig::default())
    }

    pub fn with_config(config: &TransportConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .allow_non_standard_methods(true)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a caller-built agent as is.
    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        let agent = self.agent.clone();
        let task = tokio::task::spawn_blocking(move || exchange(&agent, request));

        // A fired token abandons the blocking task; it finishes on its own
        // and its response is dropped with it.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            joined = task => joined.map_err(|e| TransportError::Other(Box::new(e)))?,
        }
    }
}

fn exchange(
    agent: &ureq::Agent,
    request: HttpRequest,
) -> Result<HttpResponse, TransportError> {
    let method = ureq::http::Method::from_bytes(request.method.as_bytes())
        .map_err(|_| TransportError::InvalidMethod(request.method.clone()))?;

    let mut builder = ureq::http::Request::builder()
        .method(method)
        .uri(request.url.as_str());
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let sent = match request.body {
        Some(body) => agent.run(builder.body(body).map_err(build_error)?),
        None => agent.run(builder.body(()).map_err(build_error)?),
    };
    let mut response = sent.map_err(TransportError::from)?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .with_config()
        .limit(u64::MAX)
        .read_to_vec()
        .map_err(TransportError::from)?;

    Ok(HttpResponse {
        status,
        headers,
        body: ResponseBody::from_bytes(body),
    })
}

fn build_error(err: ureq::http::Error) -> TransportError {
    TransportError::Other(Box::new(err))
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => TransportError::TimedOut,
            ureq::Error::Io(io) => TransportError::Io(io),
            other => TransportError::Other(Box::new(other)),
        }
    }
}
