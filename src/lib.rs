//! Cockpit CMS API client library for Rust.
//!
//! A blocking client for the content API of the
//! [Cockpit](https://getcockpit.com) headless CMS: content items, singletons,
//! assets and images. Requests are configured with composable options and
//! responses are decoded into your own `serde` types.
//!
//! # Quick Start
//!
//! ```no_run
//! use cockpit_client::{options::*, Context};
//!
//! cockpit_client::set_default_base_url("https://cms.example.com/api");
//! cockpit_client::set_default_api_key("API-KEY");
//!
//! #[derive(serde::Deserialize)]
//! struct Post {
//!     title: String,
//! }
//!
//! let ctx = Context::background();
//! let posts = cockpit_client::get_items::<Post>(&ctx, "posts", vec![with_limit(5)]).unwrap();
//! for p in &posts.data {
//!     println!("{}", p.title);
//! }
//! ```
//!
//! The free functions use process-wide defaults. Use [`CockpitClient`] with
//! its own [`Defaults`] when different parts of a program talk to different
//! Cockpit instances.

pub mod client;
pub mod context;
pub mod defaults;
pub mod error;
pub mod models;
pub mod options;
pub mod request;
pub mod transport;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

// Re-export the main public types at the crate root for convenience.
pub use client::CockpitClient;
pub use context::Context;
pub use defaults::Defaults;
pub use error::{CockpitError, Result, TransportError};
pub use models::{Asset, BaseModel, PageMeta, PaginatedResponse, State, UpsertData};
pub use options::{MimeType, OutputHeaders, RequestOption, ResizeMode};
pub use request::{Body, PendingRequest, Query};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

// ---------------------------------------------------------------------------
// Process-wide defaults
// ---------------------------------------------------------------------------

/// Set the default transport. `None` restores the built-in one.
pub fn set_default_transport(transport: Option<Arc<dyn Transport>>) {
    Defaults::global().set_transport(transport);
}

/// Set the default API root. Trailing slashes are stripped.
pub fn set_default_base_url(url: &str) {
    Defaults::global().set_base_url(url);
}

pub fn set_default_api_key(key: &str) {
    Defaults::global().set_api_key(key);
}

pub fn set_default_debug(enabled: bool) {
    Defaults::global().set_debug(enabled);
}

// ---------------------------------------------------------------------------
// Operations on the process-wide defaults
// ---------------------------------------------------------------------------

pub fn get_items<T: DeserializeOwned>(
    ctx: &Context,
    model: &str,
    options: Vec<RequestOption>,
) -> Result<PaginatedResponse<T>> {
    CockpitClient::global().get_items(ctx, model, options)
}

pub fn get_singleton<T: DeserializeOwned>(
    ctx: &Context,
    model: &str,
    options: Vec<RequestOption>,
) -> Result<T> {
    CockpitClient::global().get_singleton(ctx, model, options)
}

pub fn get_item<T: DeserializeOwned>(
    ctx: &Context,
    model: &str,
    id: &str,
    options: Vec<RequestOption>,
) -> Result<T> {
    CockpitClient::global().get_item(ctx, model, id, options)
}

pub fn get_asset(ctx: &Context, id: &str, options: Vec<RequestOption>) -> Result<Asset> {
    CockpitClient::global().get_asset(ctx, id, options)
}

pub fn get_asset_link(id: &str, options: Vec<RequestOption>) -> Result<String> {
    CockpitClient::global().get_asset_link(id, options)
}

pub fn get_upload_link(path: &str, options: Vec<RequestOption>) -> Result<String> {
    CockpitClient::global().get_upload_link(path, options)
}

pub fn get_image(ctx: &Context, id: &str, options: Vec<RequestOption>) -> Result<String> {
    CockpitClient::global().get_image(ctx, id, options)
}

pub fn upsert_item<T, D>(
    ctx: &Context,
    model: &str,
    data: &D,
    options: Vec<RequestOption>,
) -> Result<T>
where
    T: DeserializeOwned,
    D: Serialize + ?Sized,
{
    CockpitClient::global().upsert_item(ctx, model, data, options)
}

pub fn delete_item(
    ctx: &Context,
    model: &str,
    id: &str,
    options: Vec<RequestOption>,
) -> Result<()> {
    CockpitClient::global().delete_item(ctx, model, id, options)
}
