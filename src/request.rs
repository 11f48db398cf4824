//! Request assembly, execution and response interpretation.

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::context::Context;
use crate::error::{CockpitError, Result, TransportError};
use crate::options::{OutputHeaders, RequestOption};
use crate::transport::{default_transport, HttpRequest, HttpResponse, Transport};

const API_KEY_HEADER: &str = "api-key";
const REDACTED: &str = "[REDACTED]";

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Request payload. `Bytes` and `Text` are sent verbatim, `Json` is
/// serialized right before the request goes out.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Bytes(Vec<u8>),
    Text(String),
    Json(serde_json::Value),
}

impl Body {
    fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Body::Bytes(bytes) => Ok(bytes.clone()),
            Body::Text(text) => Ok(text.as_bytes().to_vec()),
            Body::Json(value) => serde_json::to_vec(value).map_err(CockpitError::Encoding),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Multi-valued query parameters, encoded with keys in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: BTreeMap<String, Vec<String>>,
}

impl Query {
    /// Replace every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), vec![value.into()]);
    }

    /// Append `value` to the values of `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.entry(key.into()).or_default().push(value.into());
    }

    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.params {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

// ---------------------------------------------------------------------------
// Request in progress
// ---------------------------------------------------------------------------

/// A request being configured: defaults snapshot plus applied options.
/// Owned by exactly one call.
pub struct PendingRequest {
    transport: Option<Arc<dyn Transport>>,
    api_key: String,
    base_url: String,
    method: Method,
    path: String,
    query: Query,
    body: Option<Body>,
    debug: bool,
    output_headers: Option<OutputHeaders>,
}

impl PendingRequest {
    pub(crate) fn new(
        transport: Option<Arc<dyn Transport>>,
        api_key: String,
        base_url: String,
        debug: bool,
        method: Method,
        path: String,
    ) -> Self {
        Self {
            transport,
            api_key,
            base_url,
            method,
            path,
            query: Query::default(),
            body: None,
            debug,
            output_headers: None,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut Query {
        &mut self.query
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    pub(crate) fn set_transport(&mut self, transport: Arc<dyn Transport>) {
        self.transport = Some(transport);
    }

    pub(crate) fn set_api_key(&mut self, key: String) {
        self.api_key = key;
    }

    pub(crate) fn set_base_url(&mut self, url: String) {
        self.base_url = url;
    }

    pub(crate) fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    pub(crate) fn set_body(&mut self, body: Body) {
        self.body = Some(body);
    }

    pub(crate) fn set_output_headers(&mut self, sink: OutputHeaders) {
        self.output_headers = Some(sink);
    }

    /// Apply `options` in order, stopping at the first failure.
    pub fn apply(&mut self, options: Vec<RequestOption>) -> Result<()> {
        for option in options {
            trace!(option = option.name(), "applying request option");
            option.apply(self)?;
        }
        Ok(())
    }

    /// True when the server will answer with the `{data, meta}` envelope.
    pub fn is_paginated(&self) -> bool {
        self.query.contains("skip") && self.query.contains("limit")
    }

    /// Base URL + path, plus the encoded query when there is one.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            format!("{}{}", self.base_url, self.path)
        } else {
            format!("{}{}?{}", self.base_url, self.path, self.query.encode())
        }
    }

    fn requires_body(&self) -> bool {
        self.method == Method::POST || self.method == Method::PUT || self.method == Method::PATCH
    }

    /// Validate the request and assemble what goes on the wire.
    pub fn build(&self) -> Result<HttpRequest> {
        if self.api_key.is_empty() {
            return Err(CockpitError::MissingConfig { field: "api key" });
        }
        if self.base_url.is_empty() {
            return Err(CockpitError::MissingConfig { field: "base URL" });
        }

        let body = self.body.as_ref().map(Body::encode).transpose()?;
        let body = body.filter(|bytes| !bytes.is_empty());
        if body.is_none() && self.requires_body() {
            return Err(CockpitError::MissingBody {
                method: self.method.to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key).map_err(|_| CockpitError::InvalidApiKey)?;
        headers.insert(API_KEY_HEADER, key);
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(HttpRequest {
            method: self.method.clone(),
            url: self.url(),
            headers,
            body,
        })
    }

    /// Send the request and hand back the response for interpretation.
    pub(crate) fn execute(self, ctx: &Context) -> Result<Exchange> {
        let request = self.build()?;
        let transport = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => default_transport()?,
        };

        let method = request.method.clone();
        let url = request.url.clone();
        let result = transport.send(request, ctx);

        let response = if self.debug {
            self.log_exchange(&method, &url, result)?
        } else {
            result?
        };

        Ok(Exchange {
            response,
            url,
            output_headers: self.output_headers,
        })
    }

    /// Emit the debug record for a finished round-trip. The response body
    /// is buffered so the caller can still read it afterwards.
    fn log_exchange(
        &self,
        method: &Method,
        url: &str,
        result: std::result::Result<HttpResponse, TransportError>,
    ) -> Result<HttpResponse> {
        match result {
            Ok(mut response) => {
                let mut buffered = Vec::new();
                if let Err(err) = response.body.read_to_end(&mut buffered) {
                    self.debug_record("ERROR", method, url, &err.to_string());
                    return Err(TransportError::Io(err).into());
                }
                let status = status_line(response.status);
                self.debug_record(&status, method, url, &String::from_utf8_lossy(&buffered));
                response.body = Box::new(io::Cursor::new(buffered));
                Ok(response)
            }
            Err(err) => {
                self.debug_record("ERROR", method, url, &err.to_string());
                Err(err.into())
            }
        }
    }

    fn debug_record(&self, status: &str, method: &Method, url: &str, body: &str) {
        let url = redact(url, &self.api_key);
        let body = redact(body, &self.api_key);
        debug!(
            status,
            method = %method,
            url = %url,
            body = %body,
            "[Cockpit][{status}] {method} {url}"
        );
    }
}

fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        text.to_string()
    } else {
        text.replace(secret, REDACTED)
    }
}

fn status_line(status: StatusCode) -> String {
    format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
}

// ---------------------------------------------------------------------------
// Response interpretation
// ---------------------------------------------------------------------------

/// A response that still has to be interpreted. Whatever is left of the
/// body is drained when it goes out of scope.
pub(crate) struct Exchange {
    response: HttpResponse,
    url: String,
    output_headers: Option<OutputHeaders>,
}

impl Exchange {
    fn read_body(&mut self) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        self.response
            .body
            .read_to_end(&mut body)
            .map_err(TransportError::Io)?;
        Ok(body)
    }

    /// Map non-200 statuses to errors, then read the body.
    fn successful_body(&mut self) -> Result<Vec<u8>> {
        let status = self.response.status;
        if status == StatusCode::NOT_FOUND {
            return Err(CockpitError::NotFound {
                url: self.url.clone(),
            });
        }
        if status != StatusCode::OK {
            // The status is the error; a body that fails to read only loses the text.
            let mut body = Vec::new();
            let _ = self.response.body.read_to_end(&mut body);
            return Err(CockpitError::UnexpectedStatus {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        self.read_body()
    }

    fn publish_headers(&self) {
        if let Some(sink) = &self.output_headers {
            sink.store(self.response.headers.clone());
        }
    }

    /// Decode a JSON body into `T`.
    pub(crate) fn decode_json<T: DeserializeOwned>(mut self) -> Result<T> {
        let body = self.successful_body()?;
        let value = serde_json::from_slice(&body).map_err(CockpitError::Decode)?;
        self.publish_headers();
        Ok(value)
    }

    /// Return the body untouched, for endpoints that do not answer JSON.
    pub(crate) fn decode_raw(mut self) -> Result<String> {
        let body = self.successful_body()?;
        self.publish_headers();
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Check the status without decoding anything.
    pub(crate) fn expect_success(mut self) -> Result<()> {
        self.successful_body()?;
        self.publish_headers();
        Ok(())
    }
}

impl Drop for Exchange {
    fn drop(&mut self) {
        let _ = io::copy(&mut self.response.body, &mut io::sink());
    }
}
