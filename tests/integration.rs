//! Integration tests for the Cockpit client against a local mock server.
//!
//! Every test starts its own `httpmock` server and talks to it through a
//! `CockpitClient` with its own defaults, so tests can run in parallel.
//! Only `free_functions_use_global_defaults` touches the process-wide store.

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde::Deserialize;
use serde_json::json;

use cockpit_client::options::*;
use cockpit_client::{
    Asset, CockpitClient, CockpitError, Context, Defaults, HttpRequest, HttpResponse,
    ReqwestTransport, State, Transport, TransportError,
};

const API_KEY: &str = "test-api-key";

#[derive(Debug, Deserialize, PartialEq)]
struct Post {
    title: String,
}

fn client_for(server: &MockServer) -> CockpitClient {
    CockpitClient::new(&server.base_url(), API_KEY)
}

fn ctx() -> Context {
    Context::background()
}

// ---------------------------------------------------------------------------
// 1. Listing items
// ---------------------------------------------------------------------------

#[test]
fn list_with_skip_and_limit_decodes_paginated_envelope() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/content/items/posts")
            .query_param("limit", "10")
            .query_param("skip", "0")
            .header("api-key", API_KEY);
        then.status(200).json_body(json!({
            "data": [{"title": "first"}, {"title": "second"}],
            "meta": {"total": 42}
        }));
    });

    let page = client_for(&server)
        .get_items::<Post>(&ctx(), "posts", vec![with_limit(10), with_skip(0)])
        .unwrap();

    mock.assert();
    assert_eq!(page.meta.total, 42);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[1].title, "second");
}

#[test]
fn list_without_skip_decodes_bare_array() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/content/items/posts")
            .query_param("limit", "10");
        then.status(200)
            .json_body(json!([{"title": "only"}]));
    });

    let page = client_for(&server)
        .get_items::<Post>(&ctx(), "posts", vec![with_limit(10)])
        .unwrap();

    mock.assert();
    assert_eq!(page.meta.total, 0);
    assert_eq!(page.data, vec![Post { title: "only".into() }]);
}

#[test]
fn list_forwards_query_options() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/content/items/posts")
            .query_param("locale", "de")
            .query_param("populate", "1")
            .query_param("filter", r#"{"title":{"$regex":"/cat/i"}}"#)
            .query_param("sort", r#"{"title":1}"#)
            .query_param("fields", r#"{"title":1}"#);
        then.status(200).json_body(json!([]));
    });

    let page = client_for(&server)
        .get_items::<Post>(
            &ctx(),
            "posts",
            vec![
                with_locale("de"),
                with_populate(true),
                with_filter(r#"{"title":{"$regex":"/cat/i"}}"#),
                with_sort(r#"{"title":1}"#),
                with_fields(r#"{"title":1}"#),
            ],
        )
        .unwrap();

    mock.assert();
    assert!(page.data.is_empty());
}

#[test]
fn list_with_invalid_option_never_reaches_server() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/content/items/posts");
        then.status(200).json_body(json!([]));
    });

    let err = client_for(&server)
        .get_items::<Post>(&ctx(), "posts", vec![with_limit(0)])
        .unwrap_err();

    assert!(matches!(err, CockpitError::InvalidOption { option: "limit", .. }));
    mock.assert_calls(0);
}

// ---------------------------------------------------------------------------
// 2. Single items and status handling
// ---------------------------------------------------------------------------

#[test]
fn get_singleton_and_item() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/content/item/settings");
        then.status(200).json_body(json!({"title": "Site"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/content/item/posts/abc");
        then.status(200).json_body(json!({"title": "Post abc"}));
    });

    let client = client_for(&server);
    let settings: Post = client.get_singleton(&ctx(), "settings", vec![]).unwrap();
    let post: Post = client.get_item(&ctx(), "posts", "abc", vec![]).unwrap();

    assert_eq!(settings.title, "Site");
    assert_eq!(post.title, "Post abc");
}

#[test]
fn missing_item_is_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/content/item/posts/missing");
        then.status(404).json_body(json!({"error": "Item not found"}));
    });

    let err = client_for(&server)
        .get_item::<Post>(&ctx(), "posts", "missing", vec![])
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(404));
}

#[test]
fn other_statuses_keep_code_and_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/content/item/posts/locked");
        then.status(412).body("precondition failed");
    });

    let err = client_for(&server)
        .get_item::<Post>(&ctx(), "posts", "locked", vec![])
        .unwrap_err();

    match err {
        CockpitError::UnexpectedStatus {
            status,
            status_text,
            body,
        } => {
            assert_eq!(status, 412);
            assert_eq!(status_text, "Precondition Failed");
            assert_eq!(body, "precondition failed");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[test]
fn malformed_json_is_a_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/content/item/posts/bad");
        then.status(200).body("{\"title\": ");
    });

    let err = client_for(&server)
        .get_item::<Post>(&ctx(), "posts", "bad", vec![])
        .unwrap_err();

    assert!(matches!(err, CockpitError::Decode(_)));
}

// ---------------------------------------------------------------------------
// 3. Upsert and delete
// ---------------------------------------------------------------------------

#[test]
fn upsert_wraps_data_in_envelope() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/content/item/posts")
            .header("api-key", API_KEY)
            .header("content-type", "application/json")
            .body(r#"{"data":{"title":"A"}}"#);
        then.status(200)
            .json_body(json!({"_id": "new-id", "_state": 0, "title": "A"}));
    });

    let created: serde_json::Value = client_for(&server)
        .upsert_item(&ctx(), "posts", &json!({"title": "A"}), vec![])
        .unwrap();

    mock.assert();
    assert_eq!(created["_id"], "new-id");
}

#[test]
fn upsert_ignores_body_options() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/content/item/posts")
            .body(r#"{"data":{"title":"A"}}"#);
        then.status(200).json_body(json!({"_id": "kept"}));
    });

    let created: serde_json::Value = client_for(&server)
        .upsert_item(
            &ctx(),
            "posts",
            &json!({"title": "A"}),
            vec![with_json(&json!({"title": "B"}))],
        )
        .unwrap();

    mock.assert();
    assert_eq!(created["_id"], "kept");
}

#[test]
fn delete_item_sends_no_body() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(DELETE)
            .path("/content/item/posts/abc")
            .header("api-key", API_KEY);
        then.status(200).json_body(json!({"success": true}));
    });

    client_for(&server)
        .delete_item(&ctx(), "posts", "abc", vec![])
        .unwrap();

    mock.assert();
}

#[test]
fn delete_of_missing_item_is_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(DELETE).path("/content/item/posts/gone");
        then.status(404);
    });

    let err = client_for(&server)
        .delete_item(&ctx(), "posts", "gone", vec![])
        .unwrap_err();

    assert!(err.is_not_found());
}

// ---------------------------------------------------------------------------
// 4. Assets and images
// ---------------------------------------------------------------------------

#[test]
fn get_asset_decodes_record() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/assets/a1");
        then.status(200).json_body(json!({
            "_id": "a1",
            "_state": 1,
            "_hash": "h",
            "path": "/2024/01/cat.png",
            "mime": "image/png",
            "type": "image",
            "size": 1234,
            "width": 800,
            "height": 600
        }));
    });

    let asset: Asset = client_for(&server).get_asset(&ctx(), "a1", vec![]).unwrap();

    assert_eq!(asset.base.id, "a1");
    assert_eq!(asset.base.state, State::Published);
    assert_eq!(asset.path, "/2024/01/cat.png");
    assert_eq!((asset.width, asset.height), (800, 600));
}

#[test]
fn get_image_returns_raw_body() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/assets/image/a1")
            .query_param("m", "bestFit")
            .query_param("w", "320")
            .query_param("h", "200")
            .query_param("q", "80")
            .query_param("mime", "webp");
        then.status(200)
            .body("https://cms.local/storage/thumbs/a1.webp");
    });

    let url = client_for(&server)
        .get_image(
            &ctx(),
            "a1",
            vec![
                with_resize_mode("bestFit"),
                with_width(320),
                with_height(200),
                with_quality(80),
                with_mime("webp"),
            ],
        )
        .unwrap();

    mock.assert();
    assert_eq!(url, "https://cms.local/storage/thumbs/a1.webp");
}

#[test]
fn get_image_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/assets/image/nope");
        then.status(404);
    });

    let err = client_for(&server)
        .get_image(&ctx(), "nope", vec![])
        .unwrap_err();

    assert!(err.is_not_found());
}

// ---------------------------------------------------------------------------
// 5. Options affecting the connection
// ---------------------------------------------------------------------------

#[test]
fn per_call_overrides_replace_defaults() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/content/item/settings")
            .header("api-key", "override-key");
        then.status(200).json_body(json!({"title": "x"}));
    });

    let client = CockpitClient::new("http://127.0.0.1:1", API_KEY);
    let settings: Post = client
        .get_singleton(
            &ctx(),
            "settings",
            vec![
                with_base_url(format!("{}/", server.base_url())),
                with_api_key("override-key"),
            ],
        )
        .unwrap();

    mock.assert();
    assert_eq!(settings.title, "x");
}

#[test]
fn output_headers_are_captured() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/content/item/settings");
        then.status(200)
            .header("x-cockpit-version", "2.8.0")
            .json_body(json!({"title": "x"}));
    });

    let headers = OutputHeaders::new();
    let _: Post = client_for(&server)
        .get_singleton(&ctx(), "settings", vec![with_output_headers(&headers)])
        .unwrap();

    let captured = headers.get().expect("headers should be stored");
    assert_eq!(captured.get("x-cockpit-version").unwrap(), "2.8.0");
}

#[test]
fn missing_configuration_is_reported() {
    let client = CockpitClient::with_defaults(Arc::new(Defaults::new()));
    let err = client
        .get_singleton::<Post>(&ctx(), "settings", vec![])
        .unwrap_err();
    assert!(matches!(err, CockpitError::MissingConfig { field: "api key" }));

    let err = client
        .get_singleton::<Post>(&ctx(), "settings", vec![with_api_key("k")])
        .unwrap_err();
    assert!(matches!(err, CockpitError::MissingConfig { field: "base URL" }));
}

// ---------------------------------------------------------------------------
// 6. Transport and context
// ---------------------------------------------------------------------------

#[test]
fn connection_failure_is_a_transport_error() {
    let client = CockpitClient::new("http://127.0.0.1:1", API_KEY);
    let err = client
        .get_singleton::<Post>(&ctx(), "settings", vec![])
        .unwrap_err();
    assert!(matches!(err, CockpitError::Transport(TransportError::Http(_))));
}

#[test]
fn canceled_context_stops_the_call() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/content/item/settings");
        then.status(200).json_body(json!({"title": "x"}));
    });

    let ctx = Context::background();
    ctx.cancel();
    let err = client_for(&server)
        .get_singleton::<Post>(&ctx, "settings", vec![])
        .unwrap_err();

    assert!(matches!(err, CockpitError::Transport(TransportError::Canceled)));
    mock.assert_calls(0);
}

#[test]
fn slow_response_exceeds_deadline() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/content/item/settings");
        then.status(200)
            .delay(Duration::from_millis(500))
            .json_body(json!({"title": "x"}));
    });

    let ctx = Context::background().with_timeout(Duration::from_millis(50));
    let err = client_for(&server)
        .get_singleton::<Post>(&ctx, "settings", vec![])
        .unwrap_err();

    assert!(matches!(
        err,
        CockpitError::Transport(TransportError::DeadlineExceeded)
    ));
}

/// Counts calls and forwards them to the real transport.
struct CountingTransport {
    inner: ReqwestTransport,
    calls: std::sync::atomic::AtomicUsize,
}

impl Transport for CountingTransport {
    fn send(&self, request: HttpRequest, ctx: &Context) -> Result<HttpResponse, TransportError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.inner.send(request, ctx)
    }
}

#[test]
fn injected_transport_is_used() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/content/item/settings");
        then.status(200).json_body(json!({"title": "x"}));
    });

    let counting = Arc::new(CountingTransport {
        inner: ReqwestTransport::new().unwrap(),
        calls: Default::default(),
    });

    let client = client_for(&server);
    client.defaults().set_transport(Some(counting.clone()));
    let _: Post = client.get_singleton(&ctx(), "settings", vec![]).unwrap();

    let per_call = Arc::new(CountingTransport {
        inner: ReqwestTransport::new().unwrap(),
        calls: Default::default(),
    });
    let _: Post = client
        .get_singleton(&ctx(), "settings", vec![with_transport(per_call.clone())])
        .unwrap();

    let load = |t: &CountingTransport| t.calls.load(std::sync::atomic::Ordering::SeqCst);
    assert_eq!(load(&*counting), 1);
    assert_eq!(load(&*per_call), 1);
}

// ---------------------------------------------------------------------------
// 7. Process-wide defaults
// ---------------------------------------------------------------------------

#[test]
fn free_functions_use_global_defaults() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/content/items/posts")
            .header("api-key", "global-key");
        then.status(200).json_body(json!([{"title": "g"}]));
    });

    cockpit_client::set_default_base_url(&format!("{}/", server.base_url()));
    cockpit_client::set_default_api_key("global-key");
    cockpit_client::set_default_debug(false);
    cockpit_client::set_default_transport(None);

    let page = cockpit_client::get_items::<Post>(&ctx(), "posts", vec![]).unwrap();
    assert_eq!(page.data[0].title, "g");

    let link = cockpit_client::get_asset_link("a1", vec![]).unwrap();
    assert_eq!(link, format!("{}/assets/link/a1", server.base_url()));
}
