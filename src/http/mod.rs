mod routes;
mod types;

use crate::http::routes::*;
use crate::relay::error::DispatchError;
use crate::relay::TemplateRelay;
use crate::TracingReloadHandle;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

#[derive(Clone)]
pub struct HttpState {
    pub relay: TemplateRelay,
    pub upstream_host: String,
    pub tracing_reload: TracingReloadHandle,
}

/// Pulls the forwarded credential out of the authorization header. A
/// "Bearer " prefix is stripped case-insensitively; any other shape is
/// forwarded verbatim so callers can supply raw keys. No header, or an
/// empty token, is a terminal authorization failure.
pub(crate) fn extract_credential(headers: &HeaderMap) -> Result<String, DispatchError> {
    let header = headers.get(AUTHORIZATION).ok_or_else(|| {
        DispatchError::Auth("missing authorization header".to_string())
    })?;

    let value = header
        .to_str()
        .map_err(|_| DispatchError::Auth("invalid authorization header".to_string()))?;

    let credential = strip_bearer(value);
    if credential.is_empty() {
        return Err(DispatchError::Auth(
            "authorization header carries no credential".to_string(),
        ));
    }

    Ok(credential.to_string())
}

fn strip_bearer(value: &str) -> &str {
    let trimmed = value.trim();
    match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => trimmed[7..].trim(),
        _ => trimmed,
    }
}

pub fn create_app(state: HttpState) -> Router {
    Router::new()
        .route("/", get(server_info))
        .route(
            "/v2/api/external/{channel_token}/template",
            post(send_template),
        )
        .route("/sys/version", get(sys_version))
        .route("/sys/set-log-level", post(sys_set_log_level))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-version"),
            HeaderValue::from_static(crate::VERSION),
        ))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}
