//! # Retryable call
//!
//! Time, history, presence and user state endpoints re-issue the request
//! when service returned a body which can't be decoded. This module holds
//! the bounded retry shared by all of them.

use crate::{
    core::{
        envelope::{body_details, error_envelope, error_envelope_with_details},
        error_response::service_error_message,
        PubNubError, ResponseSink, Transport, TransportRequest, TransportResponse,
    },
    dx::pubnub_client::PubNubClientInstance,
};
use log::{debug, warn};
use serde_json::Value;

/// Classification of single response.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CallOutcome {
    /// Envelope which should be delivered to success sink.
    Success(Vec<u8>),

    /// Service reported error.
    Failure(CallFailure),

    /// Body can't be decoded and request should be repeated.
    Malformed,
}

/// Error which should be delivered to error sink.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CallFailure {
    pub message: String,
    pub details: Option<Value>,
}

impl CallFailure {
    fn envelope(&self, name: &str) -> Vec<u8> {
        match &self.details {
            Some(details) => error_envelope_with_details(&self.message, details, name),
            None => error_envelope(&self.message, name),
        }
    }
}

impl From<PubNubError> for CallFailure {
    fn from(value: PubNubError) -> Self {
        Self {
            message: value.envelope_message(),
            details: None,
        }
    }
}

/// Send request until response can be classified.
///
/// Malformed responses are re-requested right away, at most `max_retries`
/// times. Transport errors are not retried.
pub(crate) async fn retryable_call<T, B, C>(
    transport: &T,
    max_retries: u32,
    build_request: B,
    classify: C,
) -> Result<Vec<u8>, CallFailure>
where
    T: Transport + ?Sized,
    B: Fn() -> TransportRequest,
    C: Fn(&TransportResponse) -> CallOutcome,
{
    let mut attempt = 0;

    loop {
        let request = build_request();
        let path = request.path.clone();
        let response = transport.send(request).await?;

        match classify(&response) {
            CallOutcome::Success(envelope) => return Ok(envelope),
            CallOutcome::Failure(failure) => return Err(failure),
            CallOutcome::Malformed if attempt < max_retries => {
                attempt += 1;
                debug!("Malformed response for {path}, retry {attempt} of {max_retries}");
            }
            CallOutcome::Malformed => {
                warn!("Malformed response for {path}, giving up");
                return Err(CallFailure {
                    message: "Unable to handle response".into(),
                    details: Some(body_details(response.body_bytes())),
                });
            }
        }
    }
}

/// Classify response with JSON body.
///
/// `decode` turns successfully parsed body into an envelope or rejects it as
/// malformed.
pub(crate) fn classify_json<D>(response: &TransportResponse, decode: D) -> CallOutcome
where
    D: FnOnce(Value) -> Option<Value>,
{
    let body = response.body_bytes();

    if response.status != 200 {
        return CallOutcome::Failure(CallFailure {
            message: service_error_message(response.status, body),
            details: Some(body_details(body)),
        });
    }

    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(decode)
        .map(|value| CallOutcome::Success(value.to_string().into_bytes()))
        .unwrap_or(CallOutcome::Malformed)
}

/// Classify response which should carry a JSON object.
pub(crate) fn classify_object(response: &TransportResponse) -> CallOutcome {
    classify_json(response, |value| value.is_object().then_some(value))
}

impl<T> PubNubClientInstance<T>
where
    T: Transport + 'static,
{
    /// Run retryable call on a detached task and deliver its outcome.
    pub(crate) fn spawn_retryable<B, C>(
        &self,
        target: String,
        build_request: B,
        classify: C,
        success: ResponseSink,
        error: ResponseSink,
    ) where
        B: Fn() -> TransportRequest + Send + Sync + 'static,
        C: Fn(&TransportResponse) -> CallOutcome + Send + Sync + 'static,
    {
        if self.is_aborted() {
            error.deliver(CallFailure::from(PubNubError::ClientAborted).envelope(&target));
            return;
        }

        let transport = self.transport.clone();
        let max_retries = self.config.retry.max_retries;

        self.runtime.spawn(async move {
            match retryable_call(transport.as_ref(), max_retries, build_request, classify).await
            {
                Ok(envelope) => {
                    success.deliver(envelope);
                }
                Err(failure) => {
                    error.deliver(failure.envelope(&target));
                }
            }
        });
    }
}
