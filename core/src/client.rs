//! JSON request executor bound to a base URL.
//!
//! # Design
//! `Client` holds an immutable base `Url` and an injected `Transport`; no
//! call writes to either, so one client can serve concurrent callers
//! without locking. Each call runs a fixed sequence of fallible steps:
//! encode the body, resolve the path, send, check the status, decode the
//! payload. The first failing step aborts the rest. The response is owned by
//! the call, so its payload source is released on every exit path.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{Error, Result, TransportError};
use crate::http::HttpRequest;
use crate::transport::Transport;

/// Issues JSON requests against paths relative to a base URL.
#[derive(Debug, Clone)]
pub struct Client<T> {
    base_url: Url,
    transport: T,
}

impl<T: Transport> Client<T> {
    /// Parse `base_url` and bind it to `transport`.
    ///
    /// Fails with [`Error::InvalidAddress`] when `base_url` is not an
    /// absolute URL; no client exists in that case.
    pub fn new(base_url: &str, transport: T) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(Error::InvalidAddress)?;
        Ok(Self {
            base_url,
            transport,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolve `path` against the base URL.
    ///
    /// An absolute URL replaces the base. Network-path references (`//host`)
    /// and references starting with `?` or `#` follow RFC 3986. Any other
    /// path, with or without a leading `/`, lands beneath the base path as
    /// if it ended in `/`.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        match Url::parse(path) {
            Ok(url) => return Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {}
            Err(e) => return Err(Error::InvalidPath(e)),
        }

        if path.is_empty() {
            return Ok(self.base_url.clone());
        }
        if path.starts_with("//") || path.starts_with('?') || path.starts_with('#') {
            return self.base_url.join(path).map_err(Error::InvalidPath);
        }
        if self.base_url.cannot_be_a_base() {
            return Err(Error::InvalidPath(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        let mut dir = self.base_url.clone();
        dir.set_query(None);
        dir.set_fragment(None);
        if !dir.path().ends_with('/') {
            let with_slash = format!("{}/", dir.path());
            dir.set_path(&with_slash);
        }
        dir.join(path.trim_start_matches('/'))
            .map_err(Error::InvalidPath)
    }

    /// Send one request and optionally decode the response into `dest`.
    ///
    /// `body`, when present, is encoded as JSON before anything is sent.
    /// Statuses of 300 and above fail with [`Error::UnexpectedStatus`]
    /// without reading the payload. On success the decoded payload replaces
    /// `*dest`; without a destination it is discarded unread.
    pub async fn execute<B, D>(
        &self,
        cancel: &CancellationToken,
        method: &str,
        path: &str,
        body: Option<&B>,
        dest: Option<&mut D>,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
        D: DeserializeOwned,
    {
        let read_payload = dest.is_some();
        let Some(payload) = self.exchange(cancel, method, path, body, read_payload).await? else {
            return Ok(());
        };
        if let Some(dest) = dest {
            *dest = serde_json::from_slice(&payload).map_err(Error::Decoding)?;
        }
        Ok(())
    }

    pub async fn get<R>(&self, cancel: &CancellationToken, path: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        self.fetch(cancel, "GET", path, None::<&()>).await
    }

    pub async fn post<B, R>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        body: &B,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.fetch(cancel, "POST", path, Some(body)).await
    }

    pub async fn put<B, R>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        body: &B,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.fetch(cancel, "PUT", path, Some(body)).await
    }

    pub async fn patch<B, R>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        body: &B,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.fetch(cancel, "PATCH", path, Some(body)).await
    }

    /// `DELETE` whose response payload, if any, is discarded.
    pub async fn delete(&self, cancel: &CancellationToken, path: &str) -> Result<()> {
        self.execute(cancel, "DELETE", path, None::<&()>, None::<&mut ()>)
            .await
    }

    async fn fetch<B, R>(
        &self,
        cancel: &CancellationToken,
        method: &str,
        path: &str,
        body: Option<&B>,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = self
            .exchange(cancel, method, path, body, true)
            .await?
            .unwrap_or_default();
        serde_json::from_slice(&payload).map_err(Error::Decoding)
    }

    /// Steps shared by every call: encode, resolve, send, check status and,
    /// when `read_payload` is set, drain the payload.
    async fn exchange<B>(
        &self,
        cancel: &CancellationToken,
        method: &str,
        path: &str,
        body: Option<&B>,
        read_payload: bool,
    ) -> Result<Option<Vec<u8>>>
    where
        B: Serialize + ?Sized,
    {
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(Error::Encoding)?;
        let url = self.resolve(path)?;
        let request = HttpRequest::json(method, url, payload);
        log::debug!("{} {}", request.method, request.url);

        let mut response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled.into()),
            sent = self.transport.send(request, cancel) => sent?,
        };
        log::trace!("response status {}", response.status);

        if response.status >= 300 {
            return Err(Error::UnexpectedStatus(response.status));
        }
        if !read_payload {
            return Ok(None);
        }

        let payload = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled.into()),
            read = response.body.read_to_end() => read.map_err(TransportError::Io)?,
        };
        Ok(Some(payload))
    }
}
