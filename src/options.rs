//! Per-request options.
//!
//! Each `with_*` function returns a [`RequestOption`]. Options are applied
//! in the order given and the first one that fails validation aborts the
//! call; no later option runs.
//!
//! ```no_run
//! use cockpit_client::{options::*, Context, CockpitClient};
//!
//! let client = CockpitClient::new("https://cms.example.com/api", "API-KEY");
//! let page = client
//!     .get_items::<serde_json::Value>(
//!         &Context::background(),
//!         "posts",
//!         vec![with_limit(10), with_skip(0), with_sort(r#"{"_created":-1}"#)],
//!     )
//!     .unwrap();
//! println!("{} of {}", page.data.len(), page.meta.total);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use serde::Serialize;

use crate::defaults::normalize_base_url;
use crate::error::{CockpitError, Result};
use crate::request::{Body, PendingRequest};
use crate::transport::Transport;

type ApplyFn = Box<dyn FnOnce(&mut PendingRequest) -> Result<()> + Send>;

/// A single configuration step for a request.
pub struct RequestOption {
    name: &'static str,
    apply: ApplyFn,
}

impl RequestOption {
    /// Build a custom option from a closure.
    pub fn new(
        name: &'static str,
        apply: impl FnOnce(&mut PendingRequest) -> Result<()> + Send + 'static,
    ) -> Self {
        Self {
            name,
            apply: Box::new(apply),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn apply(self, request: &mut PendingRequest) -> Result<()> {
        (self.apply)(request)
    }
}

impl fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RequestOption").field(&self.name).finish()
    }
}

// ---------------------------------------------------------------------------
// Enumerated values
// ---------------------------------------------------------------------------

/// Image resize strategy (`m` query parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    Thumbnail,
    BestFit,
    Resize,
    FitToWidth,
    FitToHeight,
}

impl ResizeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResizeMode::Thumbnail => "thumbnail",
            ResizeMode::BestFit => "bestFit",
            ResizeMode::Resize => "resize",
            ResizeMode::FitToWidth => "fitToWidth",
            ResizeMode::FitToHeight => "fitToHeight",
        }
    }
}

impl FromStr for ResizeMode {
    type Err = CockpitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "thumbnail" => Ok(ResizeMode::Thumbnail),
            "bestFit" => Ok(ResizeMode::BestFit),
            "resize" => Ok(ResizeMode::Resize),
            "fitToWidth" => Ok(ResizeMode::FitToWidth),
            "fitToHeight" => Ok(ResizeMode::FitToHeight),
            other => Err(CockpitError::invalid(
                "resize mode",
                format!("unknown value {other:?}"),
            )),
        }
    }
}

/// Output format of a rendered image (`mime` query parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeType {
    Auto,
    Gif,
    Jpeg,
    Png,
    Webp,
    Bmp,
}

impl MimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::Auto => "auto",
            MimeType::Gif => "gif",
            MimeType::Jpeg => "jpeg",
            MimeType::Png => "png",
            MimeType::Webp => "webp",
            MimeType::Bmp => "bmp",
        }
    }
}

impl FromStr for MimeType {
    type Err = CockpitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(MimeType::Auto),
            "gif" => Ok(MimeType::Gif),
            "jpeg" => Ok(MimeType::Jpeg),
            "png" => Ok(MimeType::Png),
            "webp" => Ok(MimeType::Webp),
            "bmp" => Ok(MimeType::Bmp),
            other => Err(CockpitError::invalid(
                "mime type",
                format!("unknown value {other:?}"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Response headers sink
// ---------------------------------------------------------------------------

/// Receives the response headers of a successful call.
#[derive(Debug, Clone, Default)]
pub struct OutputHeaders {
    inner: Arc<Mutex<Option<HeaderMap>>>,
}

impl OutputHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers of the last successful response, if any.
    pub fn get(&self) -> Option<HeaderMap> {
        self.inner.lock().clone()
    }

    pub(crate) fn store(&self, headers: HeaderMap) {
        *self.inner.lock() = Some(headers);
    }
}

// ---------------------------------------------------------------------------
// Connection options
// ---------------------------------------------------------------------------

/// Use `transport` for this request instead of the default one.
pub fn with_transport(transport: Arc<dyn Transport>) -> RequestOption {
    RequestOption::new("transport", move |r| {
        r.set_transport(transport);
        Ok(())
    })
}

pub fn with_base_url(url: impl Into<String>) -> RequestOption {
    let url = url.into();
    RequestOption::new("base url", move |r| {
        if url.is_empty() {
            return Err(CockpitError::EmptyValue { field: "base URL" });
        }
        r.set_base_url(normalize_base_url(&url));
        Ok(())
    })
}

pub fn with_api_key(key: impl Into<String>) -> RequestOption {
    let key = key.into();
    RequestOption::new("api key", move |r| {
        if key.is_empty() {
            return Err(CockpitError::EmptyValue { field: "api key" });
        }
        r.set_api_key(key);
        Ok(())
    })
}

/// Log the request and its response at debug level.
pub fn with_debug(enabled: bool) -> RequestOption {
    RequestOption::new("debug", move |r| {
        r.set_debug(enabled);
        Ok(())
    })
}

/// Copy the response headers into `sink` once the call succeeds.
pub fn with_output_headers(sink: &OutputHeaders) -> RequestOption {
    let sink = sink.clone();
    RequestOption::new("output headers", move |r| {
        r.set_output_headers(sink);
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Body options
// ---------------------------------------------------------------------------

/// Set the request body. Bytes and text are sent as-is.
pub fn with_body(body: impl Into<Body>) -> RequestOption {
    let body = body.into();
    RequestOption::new("body", move |r| {
        r.set_body(body);
        Ok(())
    })
}

/// Set a JSON body from any serializable value.
pub fn with_json<T: Serialize + ?Sized>(value: &T) -> RequestOption {
    let value = serde_json::to_value(value);
    RequestOption::new("json body", move |r| {
        r.set_body(Body::Json(value.map_err(CockpitError::Encoding)?));
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Image options
// ---------------------------------------------------------------------------

pub fn with_resize_mode(mode: impl Into<String>) -> RequestOption {
    let mode = mode.into();
    RequestOption::new("resize mode", move |r| {
        let mode: ResizeMode = mode.parse()?;
        r.query_mut().set("m", mode.as_str());
        Ok(())
    })
}

pub fn with_width(width: i64) -> RequestOption {
    RequestOption::new("width", move |r| {
        if width < 1 {
            return Err(CockpitError::invalid("width", "must be greater than 0"));
        }
        r.query_mut().set("w", width.to_string());
        Ok(())
    })
}

pub fn with_height(height: i64) -> RequestOption {
    RequestOption::new("height", move |r| {
        if height < 1 {
            return Err(CockpitError::invalid("height", "must be greater than 0"));
        }
        r.query_mut().set("h", height.to_string());
        Ok(())
    })
}

pub fn with_quality(quality: i64) -> RequestOption {
    RequestOption::new("quality", move |r| {
        if !(1..=100).contains(&quality) {
            return Err(CockpitError::invalid("quality", "must be between 1 and 100"));
        }
        r.query_mut().set("q", quality.to_string());
        Ok(())
    })
}

pub fn with_mime(mime: impl Into<String>) -> RequestOption {
    let mime = mime.into();
    RequestOption::new("mime", move |r| {
        let mime: MimeType = mime.parse()?;
        r.query_mut().set("mime", mime.as_str());
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Query options
// ---------------------------------------------------------------------------

pub fn with_locale(locale: impl Into<String>) -> RequestOption {
    set_param("locale", locale.into())
}

/// Projection of the fields to return, e.g. `{"title":1}`.
pub fn with_fields(fields: impl Into<String>) -> RequestOption {
    set_param("fields", fields.into())
}

/// Mongo-style filter, e.g. `{"title": {"$regex": "/cat/i"}}`.
pub fn with_filter(filter: impl Into<String>) -> RequestOption {
    set_param("filter", filter.into())
}

/// Sort order, e.g. `{"title":1}` or `{"title":-1}`.
pub fn with_sort(sort: impl Into<String>) -> RequestOption {
    set_param("sort", sort.into())
}

pub fn with_limit(limit: i64) -> RequestOption {
    RequestOption::new("limit", move |r| {
        if limit < 1 {
            return Err(CockpitError::invalid("limit", "must be greater than 0"));
        }
        r.query_mut().set("limit", limit.to_string());
        Ok(())
    })
}

/// Number of items to skip. Only has an effect together with
/// [`with_limit`], in which case the server switches to the paginated
/// response shape.
pub fn with_skip(skip: i64) -> RequestOption {
    RequestOption::new("skip", move |r| {
        if skip < 0 {
            return Err(CockpitError::invalid(
                "skip",
                "must be greater than or equal to 0",
            ));
        }
        r.query_mut().set("skip", skip.to_string());
        Ok(())
    })
}

/// Resolve linked content items server-side.
pub fn with_populate(enabled: bool) -> RequestOption {
    set_param("populate", if enabled { "1" } else { "0" }.to_string())
}

fn set_param(key: &'static str, value: String) -> RequestOption {
    RequestOption::new(key, move |r| {
        r.query_mut().set(key, value);
        Ok(())
    })
}
