//! Request and response descriptors exchanged with a [`Transport`](crate::Transport).
//!
//! # Design
//! `HttpRequest` is plain data built fresh for every call. `HttpResponse`
//! carries its payload as a boxed async reader; dropping the response
//! releases whatever resource sits behind that reader (a socket, a pooled
//! connection, a test double). The client owns the response for the whole
//! call, so it is released on every exit path without explicit cleanup code.

use std::fmt;
use std::io::Cursor;

use tokio::io::{AsyncRead, AsyncReadExt};
use url::Url;

/// Media type used for every request and response payload.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP verb, passed through uninterpreted.
    pub method: String,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Build a request that always advertises a JSON payload, body or not.
    pub fn json(method: &str, url: Url, body: Option<Vec<u8>>) -> Self {
        Self {
            method: method.to_string(),
            url,
            headers: vec![("content-type".to_string(), CONTENT_TYPE_JSON.to_string())],
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response as returned by a transport.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

/// Payload source of a response. Released when dropped.
pub struct ResponseBody(Box<dyn AsyncRead + Send + Unpin>);

impl ResponseBody {
    pub fn new<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self(Box::new(reader))
    }

    pub fn empty() -> Self {
        Self::from_bytes(Vec::new())
    }

    /// Wrap a payload that has already been read into memory.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(Cursor::new(bytes.into()))
    }

    /// Drain the payload source.
    pub async fn read_to_end(&mut self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.0.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseBody(..)")
    }
}
