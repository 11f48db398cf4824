//! Shared default configuration.
//!
//! Every request starts from a snapshot of a [`Defaults`] store. The store
//! can be owned by a single [`CockpitClient`](crate::CockpitClient) or the
//! process-wide instance returned by [`Defaults::global`].

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use reqwest::Method;

use crate::request::PendingRequest;
use crate::transport::Transport;

#[derive(Clone, Default)]
struct DefaultValues {
    transport: Option<Arc<dyn Transport>>,
    base_url: String,
    api_key: String,
    debug: bool,
}

/// Reader/writer guarded defaults. Setters take the write lock, snapshots
/// take the read lock, so a snapshot always sees a fully applied state.
#[derive(Default)]
pub struct Defaults {
    values: RwLock<DefaultValues>,
}

static GLOBAL: Lazy<Arc<Defaults>> = Lazy::new(|| Arc::new(Defaults::new()));

impl Defaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store used by the crate-level free functions.
    pub fn global() -> Arc<Defaults> {
        Arc::clone(&GLOBAL)
    }

    /// Set the transport used when a request does not override it. `None`
    /// falls back to the built-in reqwest transport.
    pub fn set_transport(&self, transport: Option<Arc<dyn Transport>>) {
        self.values.write().transport = transport;
    }

    /// Set the API root, e.g. `https://cms.example.com/api`. Trailing
    /// slashes are stripped.
    pub fn set_base_url(&self, url: &str) {
        self.values.write().base_url = normalize_base_url(url);
    }

    pub fn set_api_key(&self, key: &str) {
        self.values.write().api_key = key.to_string();
    }

    pub fn set_debug(&self, enabled: bool) {
        self.values.write().debug = enabled;
    }

    pub fn base_url(&self) -> String {
        self.values.read().base_url.clone()
    }

    /// Start a request for `method` + `path` from the current defaults.
    pub fn new_request(&self, method: Method, path: impl Into<String>) -> PendingRequest {
        let values = self.values.read().clone();
        PendingRequest::new(
            values.transport,
            values.api_key,
            values.base_url,
            values.debug,
            method,
            path.into(),
        )
    }
}

impl fmt::Debug for Defaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.values.read();
        f.debug_struct("Defaults")
            .field("transport", &values.transport.is_some())
            .field("base_url", &values.base_url)
            .field("api_key", &"<redacted>")
            .field("debug", &values.debug)
            .finish()
    }
}

pub(crate) fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
