//! Subscribe module.
//!
//! Allows to subscribe to real-time updates from channels and groups.
//!
//! Each subscribed name keeps the sinks it was subscribed with. Messages,
//! presence events and connection status changes go to the success sink,
//! failures go to the error sink. See [`Envelope`] for the shapes.
//!
//! [`Envelope`]: crate::core::Envelope

use async_channel::{Receiver, Sender};
use log::debug;
use spin::Mutex;

use crate::{
    core::{
        envelope::{
            already_subscribed_envelope, error_envelope, not_subscribed_envelope, status_envelope,
        },
        utils::encoding::join_url_encoded,
        ConnectionEvent, PubNubError, ResponseSink, Transport, TransportRequest,
    },
    dx::{
        pubnub_client::PubNubClientInstance,
        worker_pool::{JobKind, NonSubscribeJob},
    },
};

use dispatcher::RegistryKind;
use registry::{is_presence, presence_name, SubscriptionRegistry};

pub(crate) mod dispatcher;
pub(crate) mod registry;
pub(crate) mod response;
mod retry_loop;
mod subscribe_loop;

/// Continuation token state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubscribeCursor {
    /// Token received with last successful long-poll.
    pub timetoken: String,

    /// Whether next long-poll should start from `0`.
    pub reset: bool,
}

impl Default for SubscribeCursor {
    fn default() -> Self {
        Self {
            timetoken: "0".into(),
            reset: false,
        }
    }
}

/// Cancellation of in-flight long-poll request.
///
/// Every subscribe round opens new connection and races its request against
/// the returned receiver. [`close`] resolves that race so the loop can
/// re-issue request with updated subscription list.
///
/// [`close`]: SubscribeConnection::close
#[derive(Debug, Default)]
pub(crate) struct SubscribeConnection {
    close: Mutex<Option<Sender<()>>>,
}

impl SubscribeConnection {
    pub fn open(&self) -> Receiver<()> {
        let (sender, receiver) = async_channel::bounded(1);
        *self.close.lock() = Some(sender);
        receiver
    }

    pub fn close(&self) {
        if let Some(sender) = self.close.lock().take() {
            debug!("Closing subscribe connection");
            sender.close();
        }
    }
}

impl<T> PubNubClientInstance<T>
where
    T: Transport + 'static,
{
    /// Subscribe to channels.
    ///
    /// Names which already are subscribed (as channel or channel group) are
    /// reported to `error` and skipped. When `timetoken` is provided, the
    /// subscription resumes from it and no `connected` status is sent.
    /// With `presence` set, presence channels (`<name>-pnpres`) are
    /// subscribed instead.
    ///
    /// # Example
    /// ```no_run
    /// use pubnub_longpoll::{core::ResponseSink, Keyset, PubNubClientBuilder};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let pubnub = // PubNubClient
    /// # PubNubClientBuilder::with_reqwest_transport()
    /// #     .with_keyset(Keyset {
    /// #         subscribe_key: "demo",
    /// #         publish_key: Some("demo"),
    /// #         secret_key: None,
    /// #     })
    /// #     .with_user_id("user_id")
    /// #     .build()?;
    /// let (success, messages) = ResponseSink::unbounded();
    /// let (error, errors) = ResponseSink::unbounded();
    ///
    /// pubnub.subscribe(&["my_channel"], None, false, success, error);
    ///
    /// while let Ok(envelope) = messages.recv().await {
    ///     println!("{}", String::from_utf8_lossy(&envelope));
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe<S>(
        &self,
        channels: &[S],
        timetoken: Option<&str>,
        presence: bool,
        success: ResponseSink,
        error: ResponseSink,
    ) where
        S: AsRef<str>,
    {
        let names = subscription_names(channels, presence);
        self.add_subscriptions(RegistryKind::Channels, names, timetoken, success, error);
    }

    /// Subscribe to channel groups.
    ///
    /// Same as [`subscribe`] for channel groups.
    ///
    /// [`subscribe`]: PubNubClientInstance::subscribe
    pub fn channel_group_subscribe<S>(
        &self,
        groups: &[S],
        timetoken: Option<&str>,
        presence: bool,
        success: ResponseSink,
        error: ResponseSink,
    ) where
        S: AsRef<str>,
    {
        let names = subscription_names(groups, presence);
        self.add_subscriptions(RegistryKind::Groups, names, timetoken, success, error);
    }

    /// Unsubscribe from channels.
    ///
    /// Every removed channel gets `unsubscribed` status in `success`, names
    /// which weren't subscribed are reported to `error`. `leave` is
    /// announced for removed channels unless suppressed by configuration.
    pub fn unsubscribe<S>(&self, channels: &[S], success: ResponseSink, error: ResponseSink)
    where
        S: AsRef<str>,
    {
        let names = subscription_names(channels, false);
        self.remove_subscriptions(RegistryKind::Channels, names, success, error);
    }

    /// Unsubscribe from presence channels of provided channels.
    pub fn presence_unsubscribe<S>(&self, channels: &[S], success: ResponseSink, error: ResponseSink)
    where
        S: AsRef<str>,
    {
        let names = subscription_names(channels, true);
        self.remove_subscriptions(RegistryKind::Channels, names, success, error);
    }

    /// Unsubscribe from channel groups.
    ///
    /// With `presence` set, presence of provided channel groups is removed.
    pub fn channel_group_unsubscribe<S>(
        &self,
        groups: &[S],
        presence: bool,
        success: ResponseSink,
        error: ResponseSink,
    ) where
        S: AsRef<str>,
    {
        let names = subscription_names(groups, presence);
        self.remove_subscriptions(RegistryKind::Groups, names, success, error);
    }

    fn registry(&self, kind: RegistryKind) -> &SubscriptionRegistry {
        match kind {
            RegistryKind::Channels => &self.subscriptions.channels,
            RegistryKind::Groups => &self.subscriptions.groups,
        }
    }

    fn add_subscriptions(
        &self,
        kind: RegistryKind,
        names: Vec<String>,
        timetoken: Option<&str>,
        success: ResponseSink,
        error: ResponseSink,
    ) {
        if self.is_aborted() {
            report(&error, &names, &PubNubError::ClientAborted);
            return;
        }
        if names.is_empty() {
            report(&error, &[String::new()], &PubNubError::EmptyChannel);
            return;
        }

        let resume = timetoken.filter(|timetoken| !timetoken.is_empty() && *timetoken != "0");
        let registry = self.registry(kind);
        let mut added = 0;

        for name in names {
            if self.subscriptions.exists(&name) {
                error.deliver(already_subscribed_envelope(
                    kind.subscription_kind(&name),
                    &name,
                ));
                continue;
            }

            match resume {
                Some(_) => registry.add_connected(&name, success.clone(), error.clone()),
                None => registry.add(&name, success.clone(), error.clone()),
            }
            added += 1;
        }

        if added == 0 {
            return;
        }

        {
            let mut cursor = self.cursor.write();
            match resume {
                Some(timetoken) => {
                    cursor.timetoken = timetoken.to_string();
                    cursor.reset = false;
                }
                None => cursor.reset = true,
            }
        }
        debug!("Added {added} subscriptions, restarting long-poll");

        self.connection.close();
        self.start_subscribe_loop();
        self.start_retry_loop();
        self.start_heartbeat_loop();
    }

    fn remove_subscriptions(
        &self,
        kind: RegistryKind,
        names: Vec<String>,
        success: ResponseSink,
        error: ResponseSink,
    ) {
        if names.is_empty() {
            report(&error, &[String::new()], &PubNubError::EmptyChannel);
            return;
        }

        let mut removed = Vec::new();
        for name in names {
            match self.registry(kind).remove(&name) {
                Some(item) => {
                    success.deliver(status_envelope(
                        ConnectionEvent::Unsubscribed,
                        kind.subscription_kind(&item.name),
                        &item.name,
                    ));
                    removed.push(item.name);
                }
                None => {
                    error.deliver(not_subscribed_envelope(kind.subscription_kind(&name), &name));
                }
            }
        }

        if removed.is_empty() {
            return;
        }

        if kind == RegistryKind::Channels {
            let mut state = self.state.write();
            removed.iter().for_each(|name| {
                state.remove(name);
            });
        }

        self.announce_leave(kind, &removed, success, error);
        self.connection.close();
    }

    fn announce_leave(
        &self,
        kind: RegistryKind,
        names: &[String],
        success: ResponseSink,
        error: ResponseSink,
    ) {
        let names = names
            .iter()
            .filter(|name| !is_presence(name))
            .cloned()
            .collect::<Vec<_>>();

        if names.is_empty() || self.config.presence.suppress_leave_events {
            return;
        }

        let (channels, groups) = match kind {
            RegistryKind::Channels => (names.as_slice(), &[][..]),
            RegistryKind::Groups => (&[][..], names.as_slice()),
        };

        self.enqueue(NonSubscribeJob {
            target: names.join(","),
            request: self.leave_request(channels, groups),
            kind: JobKind::Verbatim,
            success,
            error,
        });
    }

    fn leave_request(&self, channels: &[String], groups: &[String]) -> TransportRequest {
        let mut request = TransportRequest {
            path: format!(
                "/v2/presence/sub-key/{}/channel/{}/leave",
                self.config.subscribe_key,
                join_url_encoded(channels, ",").unwrap_or_else(|| ",".into())
            ),
            ..Default::default()
        };

        if !groups.is_empty() {
            request
                .query_parameters
                .insert("channel-group".into(), groups.join(","));
        }

        request
    }
}

fn subscription_names<S>(names: &[S], presence: bool) -> Vec<String>
where
    S: AsRef<str>,
{
    names
        .iter()
        .map(|name| name.as_ref().trim())
        .filter(|name| !name.is_empty())
        .map(|name| {
            if presence {
                presence_name(name)
            } else {
                name.to_string()
            }
        })
        .collect()
}

fn report(error: &ResponseSink, names: &[String], err: &PubNubError) {
    let message = err.envelope_message();
    names.iter().for_each(|name| {
        error.deliver(error_envelope(&message, name));
    });
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn prepare_subscription_names() {
        assert_eq!(
            subscription_names(&["a", " b ", ""], false),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(
            subscription_names(&["a", "b-pnpres"], true),
            vec!["a-pnpres".to_string(), "b-pnpres".to_string()]
        );
    }

    #[test]
    fn close_open_connection() {
        let connection = SubscribeConnection::default();
        let receiver = connection.open();

        connection.close();

        assert!(receiver.is_closed());
    }

    #[test]
    fn replace_previous_connection() {
        let connection = SubscribeConnection::default();
        let first = connection.open();
        let second = connection.open();

        connection.close();

        assert!(second.is_closed());
        assert!(first.is_closed());
    }
}
