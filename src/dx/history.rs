//! PubNub History module.
//!
//! The [`HistoryRequestBuilder`] lets you fetch messages which have been
//! stored for a channel.
//!
//! Service responds with `[[<messages>], <start>, <end>]`. When a cryptor is
//! configured, messages are decrypted before the response reaches success
//! sink.

use derive_builder::Builder;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;

use crate::{
    core::{
        cryptor::decrypt_payload, envelope::error_envelope, utils::encoding::url_encode, Cryptor,
        PubNubError, ResponseSink, Transport, TransportRequest, TransportResponse,
    },
    dx::{
        pubnub_client::PubNubClientInstance,
        retryable::{classify_json, CallOutcome},
    },
};

/// Maximum number of messages which can be requested at once.
const MAX_COUNT: u32 = 100;

/// The History request builder.
///
/// This struct is used by the [`history`] method of the [`PubNubClient`].
///
/// [`history`]: crate::dx::PubNubClient::history
/// [`PubNubClient`]: crate::dx::PubNubClient
#[derive(Builder, Debug)]
#[builder(pattern = "owned", build_fn(vis = "pub(crate)", validate = "Self::validate"))]
pub struct HistoryRequest<T> {
    /// Current client which can provide transportation to perform the request.
    #[builder(field(vis = "pub(crate)"), setter(custom))]
    pub(crate) pubnub_client: PubNubClientInstance<T>,

    /// Channel for which messages should be fetched.
    #[builder(setter(into))]
    pub(crate) channel: String,

    /// Number of messages to fetch, at most 100.
    #[builder(default = "MAX_COUNT")]
    pub(crate) count: u32,

    /// Traverse history from the oldest message.
    #[builder(default)]
    pub(crate) reverse: bool,

    /// Timetoken which bounds fetched messages from below (exclusive).
    #[builder(setter(strip_option, into), default)]
    pub(crate) start: Option<String>,

    /// Timetoken which bounds fetched messages from above (inclusive).
    #[builder(setter(strip_option, into), default)]
    pub(crate) end: Option<String>,

    /// Wrap every message into `{"message": .., "timetoken": ..}`.
    #[builder(default)]
    pub(crate) include_token: bool,
}

impl<T> HistoryRequestBuilder<T> {
    /// Validate user-provided data for request builder.
    fn validate(&self) -> Result<(), String> {
        match self.channel.as_deref().map(str::trim) {
            Some(channel) if !channel.is_empty() => Ok(()),
            _ => Err(PubNubError::EmptyChannel.to_string()),
        }
    }
}

impl<T> HistoryRequest<T> {
    /// Create transport request from the request builder.
    pub(crate) fn transport_request(&self) -> TransportRequest {
        let mut query = HashMap::from([
            ("count".to_string(), self.count.min(MAX_COUNT).to_string()),
            ("reverse".to_string(), self.reverse.to_string()),
        ]);

        if let Some(start) = &self.start {
            query.insert("start".into(), start.clone());
        }
        if let Some(end) = &self.end {
            query.insert("end".into(), end.clone());
        }
        if self.include_token {
            query.insert("include_token".into(), "true".into());
        }

        TransportRequest {
            path: format!(
                "/v2/history/sub-key/{}/channel/{}",
                self.pubnub_client.config.subscribe_key,
                url_encode(self.channel.as_bytes())
            ),
            query_parameters: query,
            ..Default::default()
        }
    }
}

impl<T> HistoryRequestBuilder<T>
where
    T: Transport + 'static,
{
    /// Fetch messages.
    ///
    /// Response is re-requested when its body can't be decoded.
    pub fn execute(self, success: ResponseSink, error: ResponseSink) {
        let channel = self.channel.clone().unwrap_or_default();
        let request = match self.build() {
            Ok(request) => request,
            Err(err) => {
                error.deliver(error_envelope(&err.to_string(), &channel));
                return;
            }
        };

        debug!("Fetching history of '{}'", request.channel);
        let transport_request = request.transport_request();
        let cryptor = request.pubnub_client.cryptor.clone();
        let include_token = request.include_token;

        request.pubnub_client.spawn_retryable(
            request.channel.clone(),
            move || transport_request.clone(),
            move |response| classify_history(response, cryptor.as_deref(), include_token),
            success,
            error,
        );
    }
}

impl<T> PubNubClientInstance<T> {
    /// Create a history request builder.
    ///
    /// # Example
    /// ```no_run
    /// # use pubnub_longpoll::{core::ResponseSink, PubNubClientBuilder, Keyset};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let pubnub = PubNubClientBuilder::with_reqwest_transport()
    /// #     .with_keyset(Keyset {
    /// #         subscribe_key: "demo",
    /// #         publish_key: Some("demo"),
    /// #         secret_key: None,
    /// #     })
    /// #     .with_user_id("user_id")
    /// #     .build()?;
    /// let (success, history) = ResponseSink::unbounded();
    /// let (error, _) = ResponseSink::unbounded();
    ///
    /// pubnub
    ///     .history()
    ///     .channel("my_channel")
    ///     .count(10)
    ///     .execute(success, error);
    /// # Ok(())
    /// # }
    /// ```
    pub fn history(&self) -> HistoryRequestBuilder<T> {
        HistoryRequestBuilder {
            pubnub_client: Some(self.clone()),
            ..Default::default()
        }
    }
}

fn classify_history(
    response: &TransportResponse,
    cryptor: Option<&(dyn Cryptor + Send + Sync)>,
    include_token: bool,
) -> CallOutcome {
    classify_json(response, |value| {
        let Value::Array(mut parts) = value else {
            return None;
        };
        if parts.len() != 3 || !parts[0].is_array() {
            return None;
        }

        if let (Some(cryptor), Value::Array(messages)) = (cryptor, &mut parts[0]) {
            messages
                .iter_mut()
                .for_each(|message| decrypt_history_message(cryptor, message, include_token));
        }

        Some(Value::Array(parts))
    })
}

fn decrypt_history_message(cryptor: &dyn Cryptor, message: &mut Value, include_token: bool) {
    let target = if include_token {
        match message.get_mut("message") {
            Some(target) => target,
            None => return,
        }
    } else {
        message
    };

    *target = decrypt_payload(cryptor, target.take());
}


#[cfg(all(test, feature = "tokio"))]
mod execute_should {
    use crate::{
        core::ResponseSink,
        dx::test_support::{client, next, RecordingTransport},
    };

    #[tokio::test]
    async fn request_history() {
        let transport = RecordingTransport::replying(r#"[["m"],10,20]"#);
        let client = client(transport.clone());
        let (success, received) = ResponseSink::unbounded();
        let (error, _) = ResponseSink::unbounded();

        client
            .history()
            .channel("ch")
            .count(500)
            .reverse(true)
            .start("10")
            .include_token(true)
            .execute(success, error);

        assert_eq!(next(&received).await[0][0], "m");
        let request = transport.last_request().unwrap();
        assert_eq!(request.path, "/v2/history/sub-key/sub-key/channel/ch");
        assert_eq!(request.query_parameters["count"], "100");
        assert_eq!(request.query_parameters["reverse"], "true");
        assert_eq!(request.query_parameters["start"], "10");
        assert_eq!(request.query_parameters["include_token"], "true");
        assert!(!request.query_parameters.contains_key("end"));
    }

    #[tokio::test]
    async fn reject_missing_channel() {
        let transport = RecordingTransport::default();
        let client = client(transport.clone());
        let (success, _) = ResponseSink::unbounded();
        let (error, errors) = ResponseSink::unbounded();

        client.history().execute(success, error);

        assert_eq!(next(&errors).await[0], 0);
        assert!(transport.requests().is_empty());
    }
}
