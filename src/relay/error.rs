use crate::relay::types::{CapturedBody, StepRecord};
use thiserror::Error;

/// Terminal failure classifications for one dispatch run. There is no
/// local recovery: every variant short-circuits the remaining steps and
/// is mapped straight to a caller-visible response.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed or incomplete request, caught before any upstream call.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Missing or unusable credential, caught before any upstream call.
    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("contact verification failed upstream with status {status}")]
    UpstreamVerification { status: u16, body: CapturedBody },

    #[error("contact creation failed upstream with status {status}")]
    ContactCreation { status: u16, body: CapturedBody },

    #[error("template dispatch failed upstream with status {status}")]
    TemplateDispatch { status: u16, body: CapturedBody },

    #[error("network error talking to upstream: {0}")]
    Network(String),
}
impl DispatchError {
    /// Stable machine-readable classification for API consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Validation(_) => "validation",
            DispatchError::Auth(_) => "authorization",
            DispatchError::UpstreamVerification { .. } => "upstream_verification",
            DispatchError::ContactCreation { .. } => "contact_creation",
            DispatchError::TemplateDispatch { .. } => "template_dispatch",
            DispatchError::Network(_) => "network",
        }
    }

    /// The upstream response body, for the variants that carry one.
    pub fn upstream_body(&self) -> Option<&CapturedBody> {
        match self {
            DispatchError::UpstreamVerification { body, .. }
            | DispatchError::ContactCreation { body, .. }
            | DispatchError::TemplateDispatch { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// A dispatch error together with the step log accumulated before the
/// failure, so callers still see which upstream calls were made.
#[derive(Debug)]
pub struct DispatchFailure {
    pub error: DispatchError,
    pub steps: Vec<StepRecord>,
}
impl From<DispatchError> for DispatchFailure {
    fn from(error: DispatchError) -> Self {
        Self {
            error,
            steps: Vec::new(),
        }
    }
}

#[cfg(test)]
mod kind_tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(
            DispatchError::Validation("x".to_string()).kind(),
            "validation"
        );
        assert_eq!(DispatchError::Auth("x".to_string()).kind(), "authorization");
        assert_eq!(DispatchError::Network("x".to_string()).kind(), "network");
        assert_eq!(
            DispatchError::ContactCreation {
                status: 500,
                body: CapturedBody::Text {
                    text: String::new()
                },
            }
            .kind(),
            "contact_creation"
        );
    }

    #[test]
    fn upstream_body_only_for_upstream_variants() {
        let error = DispatchError::TemplateDispatch {
            status: 400,
            body: CapturedBody::Json(serde_json::json!({"error": "bad template"})),
        };
        assert!(error.upstream_body().is_some());
        assert!(DispatchError::Network("timeout".to_string())
            .upstream_body()
            .is_none());
    }
}
