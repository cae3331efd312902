//! Publish result module.
//!
//! This module contains the `PublishResult` type.
//! The `PublishResult` type is used to represent the result of a publish operation.

use crate::core::PubNubError;

/// The result of a publish operation.
/// It contains the timetoken of the published message.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublishResult {
    /// The timetoken of the published message.
    pub timetoken: String,
}

impl PublishResult {
    /// Decode envelope which publish delivered into success sink.
    ///
    /// # Example
    /// ```
    /// use pubnub_longpoll::dx::publish::PublishResult;
    ///
    /// let result = PublishResult::from_envelope(br#"[1,"Sent","15815800000000000"]"#)?;
    /// assert_eq!(result.timetoken, "15815800000000000");
    /// # Ok::<(), pubnub_longpoll::core::PubNubError>(())
    /// ```
    pub fn from_envelope(envelope: &[u8]) -> Result<Self, PubNubError> {
        let body = serde_json::from_slice::<PublishResponseBody>(envelope).map_err(|err| {
            PubNubError::Deserialization {
                details: err.to_string(),
            }
        })?;

        body_to_result(body, 200)
    }
}

/// The response body of a publish operation.
///
/// It contains the error indicator, the message from service and the
/// timetoken in this order. The error indicator is `1` if the operation was
/// successful and `0` otherwise.
///
/// # Example
/// ```json
/// [1, "Sent", "15815800000000000"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct PublishResponseBody(pub i32, pub String, pub String);

pub(crate) fn body_to_result(
    body: PublishResponseBody,
    status: u16,
) -> Result<PublishResult, PubNubError> {
    let PublishResponseBody(error_indicator, message, timetoken) = body;

    if error_indicator == 1 {
        Ok(PublishResult { timetoken })
    } else {
        Err(PubNubError::API {
            status,
            message,
            service: Some("Publish".into()),
        })
    }
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn parse_publish_response() {
        let body = PublishResponseBody(1, "Sent".to_string(), "15815800000000000".to_string());
        let result = body_to_result(body, 200).unwrap();

        assert_eq!(result.timetoken, "15815800000000000");
    }

    #[test]
    fn report_rejected_publish() {
        let body = PublishResponseBody(0, "Message Too Large".to_string(), "0".to_string());

        assert!(matches!(
            body_to_result(body, 200),
            Err(PubNubError::API { message, .. }) if message == "Message Too Large"
        ));
    }

    #[test]
    fn reject_foreign_envelope() {
        assert!(PublishResult::from_envelope(br#"[0,"Missing channel",""]"#).is_err());
        assert!(PublishResult::from_envelope(b"{}").is_err());
    }
}
