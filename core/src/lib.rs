//! Minimal JSON-over-HTTP request executor.
//!
//! # Overview
//! A [`Client`] binds a parsed base URL to an injected [`Transport`]. Each
//! call resolves a relative path against the base, optionally encodes a body
//! as JSON, performs one exchange, treats any status of 300 or above as a
//! failure, and optionally decodes the JSON response into a destination.
//!
//! # Design
//! - The base URL is parsed once in [`Client::new`]; an unusable base never
//!   produces a client.
//! - The client holds no mutable state, so concurrent calls need no locking.
//! - Failures are classified by the step that failed ([`Error`]) and keep
//!   their cause. Nothing is retried or logged as an error here.
//! - Every call takes a [`CancellationToken`]; a fired token abandons the
//!   exchange or payload read and yields a cancelled [`TransportError`].

pub mod client;
pub mod error;
pub mod http;
pub mod transport;

pub use client::Client;
pub use error::{Error, Result, TransportError};
pub use http::{HttpRequest, HttpResponse, ResponseBody, CONTENT_TYPE_JSON};
pub use tokio_util::sync::CancellationToken;
pub use transport::{Transport, TransportConfig, UreqTransport, DEFAULT_TIMEOUT};
