use crate::http::types::{HttpError, HttpResult, HttpSuccess, ServerInfo, SetLogLevelRequest};
use crate::http::{extract_credential, HttpState};
use crate::relay::types::{DispatchReport, SendTemplateRequest};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Local;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// The relay operation: verify the contact upstream, create it when the
/// number is unknown, then forward the template send.
pub async fn send_template(
    State(state): State<HttpState>,
    Path(channel_token): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<SendTemplateRequest>,
) -> HttpResult<DispatchReport> {
    let credential = extract_credential(&headers)?;
    let request = payload.resolve()?;

    let report = state
        .relay
        .dispatch(&channel_token, &credential, request)
        .await?;

    Ok(HttpSuccess(report))
}

pub async fn server_info(State(state): State<HttpState>) -> HttpResult<ServerInfo> {
    Ok(HttpSuccess(ServerInfo {
        server_datetime: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        upstream_host: state.upstream_host.clone(),
        version: crate::VERSION.to_string(),
    }))
}

pub async fn sys_version() -> HttpResult<String> {
    Ok(HttpSuccess(crate::VERSION.to_string()))
}

pub async fn sys_set_log_level(
    State(state): State<HttpState>,
    Json(payload): Json<SetLogLevelRequest>,
) -> HttpResult<bool> {
    let filter = EnvFilter::from_str(&payload.level)
        .map_err(|e| HttpError::new(StatusCode::BAD_REQUEST, e.to_string()))?;

    tracing::log::info!("Setting log level to {filter} via API");
    let success = state
        .tracing_reload
        .reload(filter)
        .map(|_| true)
        .map_err(|e| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(HttpSuccess(success))
}
