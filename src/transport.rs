//! Pluggable HTTP transport.
//!
//! The pipeline only needs "send a request, get status/headers/body
//! stream back". [`ReqwestTransport`] is used whenever no transport has
//! been injected.

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};

use crate::context::Context;
use crate::error::TransportError;

/// A fully assembled request, ready to go on the wire.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// A response whose body has not been read yet.
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Box<dyn Read + Send>,
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

pub trait Transport: Send + Sync {
    /// Send `request`, honouring the cancellation state and deadline of `ctx`.
    fn send(&self, request: HttpRequest, ctx: &Context) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a shared [`reqwest::blocking::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self {
            http: Client::builder().build()?,
        })
    }

    pub fn from_client(http: Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest, ctx: &Context) -> Result<HttpResponse, TransportError> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(left) = ctx.remaining() {
            builder = builder.timeout(left);
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() && ctx.deadline().is_some() {
                TransportError::DeadlineExceeded
            } else {
                TransportError::Http(e)
            }
        })?;

        // Cancelled while the request was in flight.
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        Ok(HttpResponse {
            status: response.status(),
            headers: response.headers().clone(),
            body: Box::new(response),
        })
    }
}

/// Transport shared by every request that did not get one injected.
pub(crate) fn default_transport() -> Result<Arc<dyn Transport>, TransportError> {
    static DEFAULT: OnceCell<Arc<dyn Transport>> = OnceCell::new();
    DEFAULT
        .get_or_try_init(|| Ok(Arc::new(ReqwestTransport::new()?) as Arc<dyn Transport>))
        .cloned()
}
