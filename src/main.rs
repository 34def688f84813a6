//! Local server entrypoint.
//!
//! `LOG_FORMAT=json` switches tracing to JSON lines; otherwise output is
//! human-readable. The store is PostgREST when `SUPABASE_URL` is set and
//! in-memory otherwise.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt};

use hub_access::config::{Config, PipelineSettings};
use hub_access::identity::client::WorkOsClient;
use hub_access::store::AnyStore;
use hub_access::store::memory::MemoryStore;
use hub_access::store::postgrest::PostgrestStore;
use hub_access::{AppState, create_app};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }

    let config = Config::from_env().expect("Failed to load configuration");
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .expect("Failed to build HTTP client");

    let provider = WorkOsClient::new(http_client.clone(), &config);

    let store = if config.has_remote_store() {
        tracing::info!(url = %config.postgrest_url(), "Using PostgREST store");
        AnyStore::Postgrest(PostgrestStore::new(http_client, &config))
    } else {
        tracing::warn!("SUPABASE_URL not set, using in-memory store");
        AnyStore::Memory(MemoryStore::new())
    };

    let pipeline = PipelineSettings::Env;
    let settings = pipeline.load();
    tracing::info!(
        enabled = settings.use_external_org_pipeline,
        admin_org = %settings.admin_organization_name,
        "Organization pipeline"
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState {
        config,
        provider,
        store,
        pipeline,
    });
    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}
