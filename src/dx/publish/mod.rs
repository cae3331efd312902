//! Publish module.
//!
//! Publish message to a channel.
//! The publish module contains the [`PublishMessageBuilder`] and
//! [`PublishMessageViaChannelBuilder`]. The [`PublishMessageBuilder`] is used
//! to publish a message to a channel.
//!
//! Requests are queued to the non-subscribe worker pool. Service response
//! `[1, "Sent", "<timetoken>"]` is delivered to success sink as is, see
//! [`PublishResult::from_envelope`].
//!
//! [`PublishMessageBuilder`]: crate::dx::publish::PublishMessageBuilder
//! [`PublishMessageViaChannelBuilder`]: crate::dx::publish::PublishMessageViaChannelBuilder

#[doc(inline)]
pub use result::{PublishResponseBody, PublishResult};
pub mod result;

#[doc(inline)]
pub use builders::{
    PublishMessageBuilder, PublishMessageViaChannel, PublishMessageViaChannelBuilder,
};
pub mod builders;

use log::debug;
use serde::Serialize;
use std::collections::HashMap;

use crate::{
    core::{
        cryptor::encrypt_message, utils::encoding::url_encode, Cryptor, PubNubError,
        ResponseSink, Transport, TransportRequest,
    },
    dx::{
        pubnub_client::{PubNubClientInstance, PubNubConfig},
        worker_pool::{JobKind, NonSubscribeJob},
    },
};

impl<T> PubNubClientInstance<T> {
    /// Create a new publish message builder.
    /// This method is used to publish a message to a channel.
    ///
    /// Instance of [`PublishMessageBuilder`] is returned.
    ///
    /// # Example
    /// ```no_run
    /// # use pubnub_longpoll::{core::ResponseSink, PubNubClientBuilder, Keyset};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let pubnub = // PubNubClient
    /// # PubNubClientBuilder::with_reqwest_transport()
    /// #     .with_keyset(Keyset{
    /// #         subscribe_key: "demo",
    /// #         publish_key: Some("demo"),
    /// #         secret_key: None,
    /// #      })
    /// #     .with_user_id("uuid")
    /// #     .build()?;
    /// let (success, sent) = ResponseSink::unbounded();
    /// let (error, _) = ResponseSink::unbounded();
    ///
    /// pubnub.publish_message("Hello, world!")
    ///    .channel("my_channel")
    ///    .store(false)
    ///    .execute(success, error);
    ///
    /// println!("{:?}", sent.recv().await?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn publish_message<M>(&self, message: M) -> PublishMessageBuilder<T, M>
    where
        M: Serialize,
    {
        PublishMessageBuilder {
            message,
            pub_nub_client: self.clone(),
            seqn: self.next_seqn(),
        }
    }
}

impl<T, M> PublishMessageViaChannelBuilder<T, M>
where
    T: Transport + 'static,
    M: Serialize,
{
    /// Queue publish request.
    ///
    /// Invalid input (empty channel, missing publish key, message which
    /// can't be serialized) is reported to `error` right away with empty
    /// name or the channel name.
    pub fn execute(self, success: ResponseSink, error: ResponseSink) {
        let instance = match self.build() {
            Ok(instance) => instance,
            Err(err) => {
                let job = NonSubscribeJob {
                    target: String::new(),
                    request: TransportRequest::default(),
                    kind: JobKind::Publish,
                    success,
                    error,
                };
                job.fail(&PubNubError::ClientInitialization {
                    details: err.to_string(),
                });
                return;
            }
        };
        let client = instance.pub_nub_client.clone();
        let params = PublishMessageParams::from(instance);

        let mut job = NonSubscribeJob {
            target: params.channel.clone(),
            request: TransportRequest::default(),
            kind: JobKind::Publish,
            success,
            error,
        };

        match params.create_transport_request(&client.config, client.cryptor()) {
            Ok(request) => {
                debug!("Publishing message to '{}'", job.target);
                job.request = request;
                client.enqueue(job);
            }
            Err(err) => job.fail(&err),
        }
    }
}

struct PublishMessageParams<M> {
    message: M,
    seqn: u16,
    channel: String,
    store: Option<bool>,
    do_not_serialize: bool,
}

impl<T, M> From<PublishMessageViaChannel<T, M>> for PublishMessageParams<M>
where
    M: Serialize,
{
    fn from(value: PublishMessageViaChannel<T, M>) -> Self {
        Self {
            message: value.message,
            seqn: value.seqn,
            channel: value.channel,
            store: value.store,
            do_not_serialize: value.do_not_serialize,
        }
    }
}

impl<M> PublishMessageParams<M>
where
    M: Serialize,
{
    fn prepare_publish_query_params(&self) -> HashMap<String, String> {
        let mut query_params: HashMap<String, String> = HashMap::new();

        self.store
            .and_then(|s| query_params.insert("store".to_string(), bool_to_numeric(s)));

        query_params.insert("seqn".to_string(), self.seqn.to_string());

        query_params
    }

    /// Serialized message which should be placed into request path.
    fn serialize_message(&self) -> Result<String, PubNubError> {
        let serialized =
            serde_json::to_value(&self.message).map_err(|err| PubNubError::Serialization {
                details: err.to_string(),
            })?;

        if !self.do_not_serialize {
            return Ok(serialized.to_string());
        }

        match serialized {
            serde_json::Value::String(raw)
                if serde_json::from_str::<serde_json::Value>(&raw).is_ok() =>
            {
                Ok(raw)
            }
            _ => Err(PubNubError::Serialization {
                details: "Message should be a string with JSON document".into(),
            }),
        }
    }

    fn create_transport_request(
        self,
        config: &PubNubConfig,
        cryptor: Option<&(dyn Cryptor + Send + Sync)>,
    ) -> Result<TransportRequest, PubNubError> {
        if self.channel.trim().is_empty() {
            return Err(PubNubError::EmptyChannel);
        }

        let pub_key = config
            .publish_key
            .as_ref()
            .ok_or_else(|| PubNubError::MissingKey {
                key: "Publish Key".into(),
            })?;
        let sub_key = &config.subscribe_key;

        let mut message = self.serialize_message()?;
        if let Some(cryptor) = cryptor {
            message = encrypt_message(cryptor, &message)?;
        }

        Ok(TransportRequest {
            path: format!(
                "/publish/{}/{}/0/{}/0/{}",
                pub_key,
                sub_key,
                url_encode(self.channel.as_bytes()),
                url_encode(message.as_bytes())
            ),
            query_parameters: self.prepare_publish_query_params(),
            ..Default::default()
        })
    }
}

fn bool_to_numeric(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

#[cfg(test)]
mod should {
    use super::*;
    use crate::core::RetryConfiguration;
    use std::sync::Arc;
    use test_case::test_case;

    fn config(publish_key: Option<&str>) -> PubNubConfig {
        PubNubConfig {
            subscribe_key: "sub_key".into(),
            publish_key: publish_key.map(String::from),
            secret_key: None,
            user_id: Arc::new("user_id".into()),
            auth_key: None,
            cipher_key: None,
            presence: Default::default(),
            retry: RetryConfiguration::default(),
            max_workers: 2,
        }
    }

    fn params<M: Serialize>(message: M, channel: &str) -> PublishMessageParams<M> {
        PublishMessageParams {
            message,
            seqn: 7,
            channel: channel.into(),
            store: None,
            do_not_serialize: false,
        }
    }

    #[test]
    fn build_publish_path() {
        let request = params(HashMap::from([("text", "hi there")]), "my channel")
            .create_transport_request(&config(Some("pub_key")), None)
            .unwrap();

        assert_eq!(
            request.path,
            "/publish/pub_key/sub_key/0/my%20channel/0/%7B%22text%22%3A%22hi%20there%22%7D"
        );
        assert_eq!(request.query_parameters["seqn"], "7");
        assert!(!request.query_parameters.contains_key("store"));
    }

    #[test_case(Some(true), Some("1") ; "when stored")]
    #[test_case(Some(false), Some("0") ; "when not stored")]
    #[test_case(None, None ; "when not set")]
    fn set_store_flag(store: Option<bool>, expected: Option<&str>) {
        let params = PublishMessageParams {
            store,
            ..params("hello", "ch")
        };

        let query = params.prepare_publish_query_params();

        assert_eq!(query.get("store").map(String::as_str), expected);
    }

    #[test]
    fn send_raw_json_without_serialization() {
        let params = PublishMessageParams {
            do_not_serialize: true,
            ..params(r#"{"a":1}"#, "ch")
        };

        assert_eq!(params.serialize_message().unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn quote_string_with_serialization() {
        assert_eq!(params("hello", "ch").serialize_message().unwrap(), r#""hello""#);
    }

    #[test_case(serde_json::json!("not json") ; "invalid JSON string")]
    #[test_case(serde_json::json!({"a": 1}) ; "object")]
    fn reject_raw_message_which_is_not_json_string(message: serde_json::Value) {
        let params = PublishMessageParams {
            do_not_serialize: true,
            ..params(message, "ch")
        };

        assert!(matches!(
            params.serialize_message(),
            Err(PubNubError::Serialization { .. })
        ));
    }

    #[test]
    fn require_publish_key() {
        let result = params("hello", "ch").create_transport_request(&config(None), None);

        assert_eq!(
            result,
            Err(PubNubError::MissingKey {
                key: "Publish Key".into()
            })
        );
    }

    #[test]
    fn require_channel() {
        let result = params("hello", " ").create_transport_request(&config(Some("pub")), None);

        assert_eq!(result, Err(PubNubError::EmptyChannel));
    }
}

#[cfg(all(test, feature = "tokio"))]
mod execute_should {
    use crate::{
        core::ResponseSink,
        dx::test_support::{client, next, RecordingTransport},
    };

    #[tokio::test]
    async fn deliver_publish_response() {
        let transport = RecordingTransport::replying(r#"[1,"Sent","16000000000000000"]"#);
        let client = client(transport.clone());
        let (success, sent) = ResponseSink::unbounded();
        let (error, _) = ResponseSink::unbounded();

        client
            .publish_message("hello")
            .channel("ch")
            .store(false)
            .execute(success, error);

        assert_eq!(next(&sent).await[2], "16000000000000000");
        let request = transport.last_request().unwrap();
        assert_eq!(request.path, "/publish/pub-key/sub-key/0/ch/0/%22hello%22");
        assert_eq!(request.query_parameters["store"], "0");
        assert_eq!(request.query_parameters["seqn"], "1");
    }

    #[tokio::test]
    async fn report_empty_channel() {
        let transport = RecordingTransport::default();
        let client = client(transport.clone());
        let (success, _) = ResponseSink::unbounded();
        let (error, errors) = ResponseSink::unbounded();

        client.publish_message("hello").channel("").execute(success, error);

        assert_eq!(next(&errors).await[1], "Missing channel");
        assert!(transport.requests().is_empty());
    }
}
