//! # Response dispatcher
//!
//! Routes parsed real-time messages, life-cycle events and errors to the
//! sinks of registered subscriptions.

use super::{
    registry::{strip_presence, SubscriptionItem, Subscriptions},
    response::SubscribeMessage,
};
use crate::core::{
    envelope::{error_envelope, error_envelope_with_details, message_envelope, status_envelope},
    ConnectionEvent, SubscriptionKind,
};
use log::{debug, warn};
use serde_json::Value;

/// Registry from which items have been taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegistryKind {
    Channels,
    Groups,
}

impl RegistryKind {
    pub(crate) fn subscription_kind(&self, name: &str) -> SubscriptionKind {
        match self {
            RegistryKind::Channels => SubscriptionKind::for_channel(name),
            RegistryKind::Groups => SubscriptionKind::ChannelGroup,
        }
    }
}

/// Result of message routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DispatchOutcome {
    /// Message has been pushed into subscription sink.
    Delivered,

    /// Target subscription is gone (unsubscribed while request was in flight).
    Dropped,

    /// Service attributed message to something client never subscribed to.
    Unrecognized,
}

/// Route real-time message to the subscription which requested it.
///
/// Messages without match source go to the channel item. Messages with one
/// are resolved in order: exact name in channels registry, wildcard pattern
/// which covers the channel, channel group.
pub(crate) fn dispatch_message(
    subscriptions: &Subscriptions,
    message: &SubscribeMessage,
    timetoken: &str,
) -> DispatchOutcome {
    let channel = strip_presence(&message.channel);

    let Some(source) = message.source.as_deref() else {
        return match subscriptions.channels.get(&message.channel) {
            Some(item) => {
                item.success
                    .deliver(message_envelope(&message.payload, timetoken, channel, None));
                DispatchOutcome::Delivered
            }
            None => {
                debug!("Dropping message for '{}': not subscribed", message.channel);
                DispatchOutcome::Dropped
            }
        };
    };

    let target = subscriptions
        .channels
        .get(source)
        .or_else(|| {
            source
                .ends_with('*')
                .then(|| wildcard_for(subscriptions, &message.channel))
                .flatten()
        })
        .or_else(|| subscriptions.groups.get(source));

    match target {
        Some(item) => {
            item.success.deliver(message_envelope(
                &message.payload,
                timetoken,
                channel,
                Some(&item.name),
            ));
            DispatchOutcome::Delivered
        }
        None if subscriptions.channels.exists(&message.channel) => {
            warn!(
                "Message for '{}' attributed to unknown subscription '{source}'",
                message.channel
            );
            DispatchOutcome::Unrecognized
        }
        None => {
            debug!(
                "Dropping message for '{}' through '{source}': not subscribed",
                message.channel
            );
            DispatchOutcome::Dropped
        }
    }
}

/// Wildcard subscription which covers `channel`.
fn wildcard_for(subscriptions: &Subscriptions, channel: &str) -> Option<SubscriptionItem> {
    subscriptions.channels.items().into_iter().find(|item| {
        item.name
            .strip_suffix('*')
            .map_or(false, |prefix| channel.starts_with(prefix))
    })
}

/// Push life-cycle event to every provided item.
pub(crate) fn announce(items: &[SubscriptionItem], registry: RegistryKind, event: ConnectionEvent) {
    items.iter().for_each(|item| {
        item.success.deliver(status_envelope(
            event,
            registry.subscription_kind(&item.name),
            &item.name,
        ));
    });
}

/// Push `Reconnected` to live subscriptions which have been connected.
///
/// Items which still wait for their first `Connected` event are skipped.
pub(crate) fn announce_reconnected(subscriptions: &Subscriptions) {
    let connected = |items: Vec<SubscriptionItem>| {
        items
            .into_iter()
            .filter(|item| item.connected)
            .collect::<Vec<_>>()
    };

    announce(
        &connected(subscriptions.channels.items()),
        RegistryKind::Channels,
        ConnectionEvent::Reconnected,
    );
    announce(
        &connected(subscriptions.groups.items()),
        RegistryKind::Groups,
        ConnectionEvent::Reconnected,
    );
}

/// Push error to every provided item.
pub(crate) fn broadcast_error(items: &[SubscriptionItem], message: &str, details: Option<&Value>) {
    items.iter().for_each(|item| {
        let envelope = match details {
            Some(details) => error_envelope_with_details(message, details, &item.name),
            None => error_envelope(message, &item.name),
        };
        item.error.deliver(envelope);
    });
}
