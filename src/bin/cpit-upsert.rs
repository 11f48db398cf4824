//! Upsert a test item into a Cockpit instance.
//!
//! Reads `CPIT_BASEURL` and `CPIT_APIKEY` from the environment, turns on
//! request logging and upserts one item into the model given as the first
//! argument (default `test`). Set `RUST_LOG=debug` to see the request log.

use std::process::ExitCode;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cockpit_client::Context;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (Ok(base_url), Ok(api_key)) = (std::env::var("CPIT_BASEURL"), std::env::var("CPIT_APIKEY"))
    else {
        error!("CPIT_BASEURL and CPIT_APIKEY must be set");
        return ExitCode::FAILURE;
    };
    let model = std::env::args().nth(1).unwrap_or_else(|| "test".to_string());

    cockpit_client::set_default_base_url(&base_url);
    cockpit_client::set_default_api_key(&api_key);
    cockpit_client::set_default_debug(true);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let data = json!({
        "title": "UPDATED Title",
        "number": now,
    });

    let ctx = Context::background().with_timeout(Duration::from_secs(30));
    match cockpit_client::upsert_item::<serde_json::Value, _>(&ctx, &model, &data, vec![]) {
        Ok(item) => {
            info!(id = %item["_id"], model = %model, "item upserted");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "upsert failed");
            ExitCode::FAILURE
        }
    }
}
