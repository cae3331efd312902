//! Time module.
//!
//! Current service time as a timetoken, `[<timetoken>]`.

use serde_json::Value;

use crate::{
    core::{ResponseSink, Transport, TransportRequest, TransportResponse},
    dx::{
        pubnub_client::PubNubClientInstance,
        retryable::{classify_json, CallOutcome},
    },
};

impl<T> PubNubClientInstance<T>
where
    T: Transport + 'static,
{
    /// Fetch service time.
    ///
    /// `[<timetoken>]` is delivered to `success`.
    pub fn time(&self, success: ResponseSink, error: ResponseSink) {
        self.spawn_retryable(
            String::new(),
            || TransportRequest {
                path: "/time/0".into(),
                ..Default::default()
            },
            classify_time,
            success,
            error,
        );
    }
}

fn classify_time(response: &TransportResponse) -> CallOutcome {
    classify_json(response, |value| {
        value
            .as_array()
            .filter(|items| items.len() == 1)
            .and_then(|items| items.first())
            .map_or(false, Value::is_u64)
            .then_some(value)
    })
}

#[cfg(test)]
mod should {
    use super::*;
    use test_case::test_case;

    #[test_case("[16000000000000000]", true ; "timetoken")]
    #[test_case("[\"16000000000000000\"]", false ; "string timetoken")]
    #[test_case("[]", false ; "empty array")]
    #[test_case("<html>", false ; "html page")]
    fn classify_time_response(body: &str, accepted: bool) {
        let outcome = classify_time(&TransportResponse {
            status: 200,
            body: Some(body.as_bytes().to_vec()),
        });

        assert_eq!(matches!(outcome, CallOutcome::Success(_)), accepted);
    }

    #[test]
    fn report_service_error() {
        let outcome = classify_time(&TransportResponse {
            status: 500,
            body: None,
        });

        assert!(matches!(outcome, CallOutcome::Failure(_)));
    }
}
