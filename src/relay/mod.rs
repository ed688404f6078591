pub mod error;
pub mod types;

mod upstream;

pub use upstream::UpstreamClient;

use crate::relay::error::{DispatchError, DispatchFailure};
use crate::relay::types::wire::{ContactLookupBody, TemplateSendBody};
use crate::relay::types::{DispatchReport, DispatchRequest, DispatchStep, StepRecord};
use tracing::log::{debug, info, warn};
use uuid::Uuid;

/// Statuses the upstream uses to acknowledge an operation.
fn accepted(status: u16) -> bool {
    matches!(status, 200 | 201)
}

/// Runs the verify -> conditionally create -> send sequence against the
/// upstream API. Strictly sequential, one attempt per step, no retries.
/// Holds no per-request state, so one instance is shared by all handlers.
#[derive(Clone)]
pub struct TemplateRelay {
    upstream: UpstreamClient,
}
impl TemplateRelay {
    pub fn new(upstream: UpstreamClient) -> Self {
        Self { upstream }
    }

    /// On failure the step log accumulated so far is returned alongside
    /// the classified error.
    pub async fn dispatch(
        &self,
        channel_token: &str,
        credential: &str,
        request: DispatchRequest,
    ) -> Result<DispatchReport, DispatchFailure> {
        let mut steps = Vec::with_capacity(3);
        match self
            .run(channel_token, credential, &request, &mut steps)
            .await
        {
            Ok(()) => Ok(DispatchReport { steps }),
            Err(error) => {
                warn!("Dispatch to {} failed: {error}", request.number);
                Err(DispatchFailure { error, steps })
            }
        }
    }

    async fn run(
        &self,
        channel_token: &str,
        credential: &str,
        request: &DispatchRequest,
        steps: &mut Vec<StepRecord>,
    ) -> Result<(), DispatchError> {
        let run_id = Uuid::new_v4();
        info!(
            "[{run_id}] dispatching template '{}' to {}",
            request.envelope.template.name, request.number
        );

        // Does the upstream already know this number?
        let (status, body) = self
            .upstream
            .post(
                channel_token,
                DispatchStep::ShowContact,
                credential,
                &ContactLookupBody {
                    number: &request.number,
                },
            )
            .await?;
        steps.push(StepRecord {
            step: DispatchStep::ShowContact,
            status,
            response: body.clone(),
        });

        match status {
            _ if accepted(status) => debug!("[{run_id}] contact already exists"),
            404 => {
                self.create_contact(channel_token, credential, request, steps, run_id)
                    .await?
            }
            _ => return Err(DispatchError::UpstreamVerification { status, body }),
        }

        // The upstream routes the send itself by the caller's credential,
        // not the channel token used for contact operations.
        let (status, body) = self
            .upstream
            .post(
                credential,
                DispatchStep::Template,
                credential,
                &TemplateSendBody {
                    number: &request.number,
                    is_closed: request.is_closed,
                    template_data: &request.envelope,
                },
            )
            .await?;
        steps.push(StepRecord {
            step: DispatchStep::Template,
            status,
            response: body.clone(),
        });

        if !accepted(status) {
            return Err(DispatchError::TemplateDispatch { status, body });
        }

        info!(
            "[{run_id}] template dispatched after {} upstream calls",
            steps.len()
        );
        Ok(())
    }

    async fn create_contact(
        &self,
        channel_token: &str,
        credential: &str,
        request: &DispatchRequest,
        steps: &mut Vec<StepRecord>,
        run_id: Uuid,
    ) -> Result<(), DispatchError> {
        let mut contact = match &request.contact {
            Some(contact) => contact.clone(),
            None => {
                return Err(DispatchError::Validation(
                    "contact details are required to register an unknown number".to_string(),
                ))
            }
        };

        // The destination number is authoritative over whatever number the
        // contact payload carried, and doubles as the fallback name.
        contact.number = request.number.clone();
        if contact.name.as_deref().unwrap_or("").is_empty() {
            contact.name = Some(request.number.clone());
        }

        debug!("[{run_id}] contact unknown upstream, creating {}", contact.number);
        let (status, body) = self
            .upstream
            .post(
                channel_token,
                DispatchStep::CreateContact,
                credential,
                &contact,
            )
            .await?;
        steps.push(StepRecord {
            step: DispatchStep::CreateContact,
            status,
            response: body.clone(),
        });

        if !accepted(status) {
            return Err(DispatchError::ContactCreation { status, body });
        }
        Ok(())
    }
}
