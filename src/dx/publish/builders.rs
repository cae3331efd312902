//! Publish builders module.
//!
//! This module contains all builders for the publish operation.

use crate::dx::pubnub_client::PubNubClientInstance;
use derive_builder::Builder;
use serde::Serialize;

/// The [`PublishMessageBuilder`] is used to publish a message to a channel.
///
/// This struct is used by the [`publish_message`] method of the [`PubNubClient`].
/// The [`publish_message`] method is used to publish a message to a channel.
/// The [`PublishMessageBuilder`] is used to build the request that is sent to the [`PubNub`] network.
///
/// # Examples
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
/// #     })
/// #     .with_user_id("user_id")
/// #     .build()?;
/// let (success, _) = ResponseSink::unbounded();
/// let (error, _) = ResponseSink::unbounded();
///
/// pubnub.publish_message("hello world!")
///     .channel("my_channel")
///     .execute(success, error);
///
/// # Ok(())
/// # }
/// ```
///
/// [`publish_message`]: crate::dx::PubNubClient::publish_message
/// [`PubNubClient`]: crate::dx::PubNubClient
/// [`PubNub`]:https://www.pubnub.com/
pub struct PublishMessageBuilder<T, M>
where
    M: Serialize,
{
    pub(super) pub_nub_client: PubNubClientInstance<T>,
    pub(super) message: M,
    pub(super) seqn: u16,
}

impl<T, M> PublishMessageBuilder<T, M>
where
    M: Serialize,
{
    /// The [`channel`] method is used to set the channel to publish the message to.
    ///
    /// [`channel`]: crate::dx::publish::PublishMessageBuilder::channel
    pub fn channel<S>(self, channel: S) -> PublishMessageViaChannelBuilder<T, M>
    where
        S: Into<String>,
    {
        PublishMessageViaChannelBuilder::<T, M> {
            pub_nub_client: Some(self.pub_nub_client),
            seqn: Some(self.seqn),
            ..Default::default()
        }
        .message(self.message)
        .channel(channel.into())
    }
}

/// The [`PublishMessageViaChannelBuilder`] is is next step in the publish process.
/// The [`PublishMessageViaChannelBuilder`] is used to build the request to be sent to the [`PubNub`] network.
///
/// [`PubNub`]:https://www.pubnub.com/
#[derive(Builder)]
#[builder(pattern = "owned", build_fn(vis = "pub(super)"))]
pub struct PublishMessageViaChannel<T, M>
where
    M: Serialize,
{
    #[builder(setter(custom))]
    pub(super) pub_nub_client: PubNubClientInstance<T>,

    #[builder(setter(custom))]
    pub(super) seqn: u16,

    /// Message to publish
    pub(super) message: M,

    /// Channel to publish to
    #[builder(setter(into))]
    pub(super) channel: String,

    /// Switch that decides if the message should be stored in history
    #[builder(setter(strip_option), default = "None")]
    pub(super) store: Option<bool>,

    /// Message already is a JSON document and should be sent as is.
    ///
    /// Message has to serialize into a string which holds valid JSON.
    #[builder(default = "false")]
    pub(super) do_not_serialize: bool,
}
