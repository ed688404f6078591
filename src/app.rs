use crate::config::AppConfig;
use crate::http::{create_app, HttpState};
use crate::relay::{TemplateRelay, UpstreamClient};
use crate::TracingReloadHandle;
use anyhow::Result;
use tracing::log::info;

/// Builds the shared state (one upstream client for the whole process)
/// and serves the HTTP API until the listener dies.
pub async fn run(config: AppConfig, tracing_reload: TracingReloadHandle) -> Result<()> {
    let upstream = UpstreamClient::new(&config.upstream)?;
    let relay = TemplateRelay::new(upstream);

    let state = HttpState {
        relay,
        upstream_host: config.upstream.base_url.clone(),
        tracing_reload,
    };

    let address = config.http.address;
    info!(
        "Starting HTTP server on {address}, relaying to {}",
        config.upstream.base_url
    );

    axum_server::bind(address)
        .serve(create_app(state).into_make_service())
        .await
        .map_err(anyhow::Error::from)
}
