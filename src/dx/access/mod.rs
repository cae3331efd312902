//! Access Manager module.
//!
//! Grant and audit permissions of authorization keys on channels, presence
//! channels and channel groups. Requests are signed with secret key, so
//! client has to be configured with it.
//!
//! This access manager module contains the [`GrantRequestBuilder`] and
//! [`AuditRequestBuilder`].

#[doc(inline)]
pub use builders::{AuditRequest, AuditRequestBuilder, GrantRequest, GrantRequestBuilder};
pub mod builders;

use crate::dx::pubnub_client::PubNubClientInstance;

/// Resource which permissions are managed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessResource {
    /// Channel subscribe and publish permissions.
    ///
    /// Empty name addresses whole subscribe key.
    Channel(String),

    /// Permissions for presence channel of channel.
    Presence(String),

    /// Channel group permissions.
    ///
    /// Empty name addresses whole subscribe key.
    ChannelGroup(String),
}

impl AccessResource {
    /// Resource name.
    pub fn name(&self) -> &str {
        match self {
            Self::Channel(name) | Self::Presence(name) | Self::ChannelGroup(name) => name,
        }
    }
}

impl<T> PubNubClientInstance<T> {
    /// Create grant request builder for channel.
    ///
    /// # Example
    /// ```rust,no_run
    /// # use pubnub_longpoll::{core::ResponseSink, PubNubClientBuilder, Keyset};
    /// #
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let pubnub = // PubNubClient
    /// #     PubNubClientBuilder::with_reqwest_transport()
    /// #         .with_keyset(Keyset {
    /// #              subscribe_key: "demo",
    /// #              publish_key: Some("demo"),
    /// #              secret_key: Some("demo")
    /// #          })
    /// #         .with_user_id("uuid")
    /// #         .build()?;
    /// let (success, _) = ResponseSink::unbounded();
    /// let (error, _) = ResponseSink::unbounded();
    ///
    /// pubnub
    ///     .grant_subscribe("test-channel")
    ///     .auth_key("auth")
    ///     .read(true)
    ///     .write(true)
    ///     .ttl(60)
    ///     .execute(success, error);
    /// #     Ok(())
    /// # }
    /// ```
    pub fn grant_subscribe<S>(&self, channel: S) -> GrantRequestBuilder<T>
    where
        S: Into<String>,
    {
        self.grant(AccessResource::Channel(channel.into()))
    }

    /// Create grant request builder for presence channel of `channel`.
    pub fn grant_presence<S>(&self, channel: S) -> GrantRequestBuilder<T>
    where
        S: Into<String>,
    {
        self.grant(AccessResource::Presence(channel.into()))
    }

    /// Create grant request builder for channel group.
    pub fn grant_channel_group<S>(&self, group: S) -> GrantRequestBuilder<T>
    where
        S: Into<String>,
    {
        self.grant(AccessResource::ChannelGroup(group.into()))
    }

    /// Create audit request builder for channel.
    pub fn audit_subscribe<S>(&self, channel: S) -> AuditRequestBuilder<T>
    where
        S: Into<String>,
    {
        self.audit(AccessResource::Channel(channel.into()))
    }

    /// Create audit request builder for presence channel of `channel`.
    pub fn audit_presence<S>(&self, channel: S) -> AuditRequestBuilder<T>
    where
        S: Into<String>,
    {
        self.audit(AccessResource::Presence(channel.into()))
    }

    /// Create audit request builder for channel group.
    pub fn audit_channel_group<S>(&self, group: S) -> AuditRequestBuilder<T>
    where
        S: Into<String>,
    {
        self.audit(AccessResource::ChannelGroup(group.into()))
    }

    fn grant(&self, resource: AccessResource) -> GrantRequestBuilder<T> {
        GrantRequestBuilder {
            pubnub_client: Some(self.clone()),
            resource: Some(resource),
            ..Default::default()
        }
    }

    fn audit(&self, resource: AccessResource) -> AuditRequestBuilder<T> {
        AuditRequestBuilder {
            pubnub_client: Some(self.clone()),
            resource: Some(resource),
            ..Default::default()
        }
    }
}
