use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::context::Context;
use crate::defaults::Defaults;
use crate::error::{CockpitError, Result};
use crate::models::{Asset, PaginatedResponse, UpsertData};
use crate::options::RequestOption;
use crate::request::{Body, PendingRequest};

// ---------------------------------------------------------------------------
// Resource paths
// ---------------------------------------------------------------------------

fn items_path(model: &str) -> String {
    format!("/content/items/{model}")
}

fn item_path(model: &str) -> String {
    format!("/content/item/{model}")
}

fn item_by_id_path(model: &str, id: &str) -> String {
    format!("/content/item/{model}/{id}")
}

fn asset_path(id: &str) -> String {
    format!("/assets/{id}")
}

fn image_path(id: &str) -> String {
    format!("/assets/image/{id}")
}

/// Strip the `/api` suffix so public links point at the site root.
fn site_root(base_url: &str) -> &str {
    let base = base_url.trim_end_matches('/');
    base.strip_suffix("/api").unwrap_or(base)
}

// ---------------------------------------------------------------------------
// Public client
// ---------------------------------------------------------------------------

/// Main entry point for the Cockpit content API.
///
/// A client owns a [`Defaults`] store; every call snapshots it and then
/// applies the per-call options.
///
/// ```no_run
/// use cockpit_client::{options::with_populate, CockpitClient, Context};
///
/// let client = CockpitClient::new("https://cms.example.com/api", "API-KEY");
/// let post: serde_json::Value = client
///     .get_item(&Context::background(), "posts", "65a1f0", vec![with_populate(true)])
///     .unwrap();
/// println!("{}", post["title"]);
/// ```
#[derive(Debug, Clone)]
pub struct CockpitClient {
    defaults: Arc<Defaults>,
}

impl CockpitClient {
    /// Create a client with its own defaults.
    ///
    /// * `base_url` – API root, e.g. `https://cms.example.com/api`
    /// * `api_key`  – key sent as the `Api-Key` header
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let defaults = Defaults::new();
        defaults.set_base_url(base_url);
        defaults.set_api_key(api_key);
        Self::with_defaults(Arc::new(defaults))
    }

    /// Create a client sharing an existing defaults store.
    pub fn with_defaults(defaults: Arc<Defaults>) -> Self {
        Self { defaults }
    }

    /// A client bound to the process-wide defaults.
    pub fn global() -> Self {
        Self::with_defaults(Defaults::global())
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    fn prepare(
        &self,
        method: Method,
        path: String,
        options: Vec<RequestOption>,
    ) -> Result<PendingRequest> {
        let mut request = self.defaults.new_request(method, path);
        request.apply(options)?;
        Ok(request)
    }

    // -- content -------------------------------------------------------------

    /// List the items of `model`.
    ///
    /// When both `skip` and `limit` are given the server answers with a
    /// paginated envelope and `meta.total` is filled in; otherwise the bare
    /// list is returned with `meta.total == 0`.
    pub fn get_items<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        model: &str,
        options: Vec<RequestOption>,
    ) -> Result<PaginatedResponse<T>> {
        let request = self.prepare(Method::GET, items_path(model), options)?;
        let paginated = request.is_paginated();
        let exchange = request.execute(ctx)?;
        if paginated {
            exchange.decode_json()
        } else {
            let items: Vec<T> = exchange.decode_json()?;
            Ok(PaginatedResponse::from(items))
        }
    }

    /// Fetch the single item of a singleton model.
    pub fn get_singleton<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        model: &str,
        options: Vec<RequestOption>,
    ) -> Result<T> {
        self.prepare(Method::GET, item_path(model), options)?
            .execute(ctx)?
            .decode_json()
    }

    pub fn get_item<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        model: &str,
        id: &str,
        options: Vec<RequestOption>,
    ) -> Result<T> {
        self.prepare(Method::GET, item_by_id_path(model, id), options)?
            .execute(ctx)?
            .decode_json()
    }

    /// Create or update an item. `data` is sent as `{"data": data}`; an `_id`
    /// inside it turns the call into an update.
    pub fn upsert_item<T, D>(
        &self,
        ctx: &Context,
        model: &str,
        data: &D,
        options: Vec<RequestOption>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        D: Serialize + ?Sized,
    {
        let envelope =
            serde_json::to_value(UpsertData { data }).map_err(CockpitError::Encoding)?;
        let mut request = self.prepare(Method::POST, item_path(model), options)?;
        // The envelope always wins over a body option.
        request.set_body(Body::Json(envelope));
        request.execute(ctx)?.decode_json()
    }

    pub fn delete_item(
        &self,
        ctx: &Context,
        model: &str,
        id: &str,
        options: Vec<RequestOption>,
    ) -> Result<()> {
        self.prepare(Method::DELETE, item_by_id_path(model, id), options)?
            .execute(ctx)?
            .expect_success()
    }

    // -- assets --------------------------------------------------------------

    pub fn get_asset(
        &self,
        ctx: &Context,
        id: &str,
        options: Vec<RequestOption>,
    ) -> Result<Asset> {
        self.prepare(Method::GET, asset_path(id), options)?
            .execute(ctx)?
            .decode_json()
    }

    /// Render an image. Cockpit answers with the URL of the generated file,
    /// which is returned as-is.
    pub fn get_image(
        &self,
        ctx: &Context,
        id: &str,
        options: Vec<RequestOption>,
    ) -> Result<String> {
        self.prepare(Method::GET, image_path(id), options)?
            .execute(ctx)?
            .decode_raw()
    }

    /// Public redirect link for an asset. No request is made.
    pub fn get_asset_link(&self, id: &str, options: Vec<RequestOption>) -> Result<String> {
        let base = self.link_base(options)?;
        Ok(format!("{base}/assets/link/{id}"))
    }

    /// Direct link to an uploaded file, `path` being the asset's storage
    /// path. No request is made.
    pub fn get_upload_link(&self, path: &str, options: Vec<RequestOption>) -> Result<String> {
        let base = self.link_base(options)?;
        Ok(format!(
            "{base}/storage/uploads/{}",
            path.trim_start_matches('/')
        ))
    }

    fn link_base(&self, options: Vec<RequestOption>) -> Result<String> {
        let request = self.prepare(Method::GET, String::new(), options)?;
        if request.base_url().is_empty() {
            return Err(CockpitError::MissingConfig { field: "base URL" });
        }
        Ok(site_root(request.base_url()).to_string())
    }
}

impl Default for CockpitClient {
    fn default() -> Self {
        Self::global()
    }
}
