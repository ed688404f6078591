use crate::relay::error::{DispatchError, DispatchFailure};
use crate::relay::types::{CapturedBody, StepRecord};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct SuccessfulResponse<T> {
    pub success: bool,
    pub response: T,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,

    /// Stable failure classification, when the error came out of a
    /// dispatch run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,

    /// Upstream response body attached to the failing call, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<CapturedBody>,

    /// Step log accumulated before the failure.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepRecord>,
}

pub struct HttpSuccess<T>(pub T);
impl<T: Serialize> IntoResponse for HttpSuccess<T> {
    fn into_response(self) -> Response {
        Json(SuccessfulResponse {
            success: true,
            response: self.0,
        })
        .into_response()
    }
}

pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
    pub kind: Option<&'static str>,
    pub upstream: Option<CapturedBody>,
    pub steps: Vec<StepRecord>,
}
impl HttpError {
    pub fn new(status: StatusCode, message: String) -> Self {
        Self {
            status,
            message,
            kind: None,
            upstream: None,
            steps: Vec::new(),
        }
    }
}
impl From<DispatchFailure> for HttpError {
    fn from(failure: DispatchFailure) -> Self {
        let status = match &failure.error {
            DispatchError::Validation(_) => StatusCode::BAD_REQUEST,
            DispatchError::Auth(_) => StatusCode::UNAUTHORIZED,
            DispatchError::UpstreamVerification { .. }
            | DispatchError::ContactCreation { .. }
            | DispatchError::TemplateDispatch { .. }
            | DispatchError::Network(_) => StatusCode::BAD_GATEWAY,
        };

        Self {
            status,
            message: failure.error.to_string(),
            kind: Some(failure.error.kind()),
            upstream: failure.error.upstream_body().cloned(),
            steps: failure.steps,
        }
    }
}
impl From<DispatchError> for HttpError {
    fn from(error: DispatchError) -> Self {
        HttpError::from(DispatchFailure::from(error))
    }
}
impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                success: false,
                error: self.message,
                kind: self.kind,
                upstream: self.upstream,
                steps: self.steps,
            }),
        )
            .into_response()
    }
}

pub type HttpResult<T> = Result<HttpSuccess<T>, HttpError>;

#[derive(Deserialize)]
pub struct SetLogLevelRequest {
    pub level: String,
}

#[derive(Serialize)]
pub struct ServerInfo {
    pub server_datetime: String,
    pub upstream_host: String,
    pub version: String,
}

#[cfg(test)]
mod mapping_tests {
    use super::*;

    fn status_for(error: DispatchError) -> StatusCode {
        HttpError::from(error).status
    }

    #[test]
    fn classifications_map_to_expected_statuses() {
        assert_eq!(
            status_for(DispatchError::Validation("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(DispatchError::Auth("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(DispatchError::Network("x".to_string())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(DispatchError::UpstreamVerification {
                status: 500,
                body: CapturedBody::Text {
                    text: String::new()
                },
            }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn failure_keeps_partial_step_log() {
        let failure = DispatchFailure {
            error: DispatchError::TemplateDispatch {
                status: 400,
                body: CapturedBody::Json(serde_json::json!({"error": "rejected"})),
            },
            steps: vec![StepRecord {
                step: crate::relay::types::DispatchStep::ShowContact,
                status: 200,
                response: CapturedBody::Json(serde_json::json!({})),
            }],
        };

        let error = HttpError::from(failure);
        assert_eq!(error.kind, Some("template_dispatch"));
        assert_eq!(error.steps.len(), 1);
        assert!(error.upstream.is_some());
    }
}
