//! # Envelopes
//!
//! JSON array shapes pushed into [`ResponseSink`]s and typed decoding of
//! them.
//!
//! * data message: `[[<payload>], "<token>", "<channel>"]` or
//!   `[[<payload>], "<token>", "<channel>", "<group-or-wildcard>"]`
//! * connection event: `[1, "<text>", "<name>"]`
//! * error: `[0, "<message>", "<name>"]` or
//!   `[0, "<message>", <details>, "<name>"]`
//!
//! [`ResponseSink`]: super::ResponseSink

use crate::core::PubNubError;
use serde_json::{json, Value};
use std::fmt::Display;

/// Kind of subscribed entity.
///
/// Used to render human readable connection and error texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    /// Regular or presence channel.
    Channel,

    /// Channel group.
    ChannelGroup,

    /// Wildcard channel (`name.*`).
    Wildcard,
}

impl SubscriptionKind {
    /// Kind of entity stored in channels registry under `name`.
    pub(crate) fn for_channel(name: &str) -> Self {
        if name.contains('*') {
            SubscriptionKind::Wildcard
        } else {
            SubscriptionKind::Channel
        }
    }
}

impl Display for SubscriptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SubscriptionKind::Channel => "channel",
                SubscriptionKind::ChannelGroup => "channel group",
                SubscriptionKind::Wildcard => "wildcard channel",
            }
        )
    }
}

/// Subscription life-cycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionEvent {
    /// First successful long-poll after subscription has been added.
    Connected,

    /// First successful long-poll after connectivity issues.
    Reconnected,

    /// Subscription has been removed by caller.
    Unsubscribed,
}

impl Display for ConnectionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ConnectionEvent::Connected => "connected",
                ConnectionEvent::Reconnected => "reconnected",
                ConnectionEvent::Unsubscribed => "unsubscribed",
            }
        )
    }
}

/// Decoded sink envelope.
///
/// # Examples
/// ```
/// use pubnub_longpoll::core::Envelope;
///
/// # fn main() -> Result<(), pubnub_longpoll::core::PubNubError> {
/// let envelope = Envelope::parse(br#"[1, "Subscription to channel 'demo' connected", "demo"]"#)?;
///
/// assert!(matches!(envelope, Envelope::Status { .. }));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Real-time message or presence event.
    Message {
        /// Received payload (decrypted if cryptor configured).
        payload: Value,

        /// Continuation token of the long-poll which delivered it.
        timetoken: String,

        /// Channel name without presence suffix.
        channel: String,

        /// Channel group or wildcard through which message has been received.
        subscription: Option<String>,
    },

    /// Subscription life-cycle status.
    Status {
        /// Human readable status text.
        text: String,

        /// Name of affected channel or channel group.
        name: String,
    },

    /// Operation or subscription failure.
    Error {
        /// Human readable error.
        message: String,

        /// Additional information (service response).
        details: Option<Value>,

        /// Name of affected channel or channel group.
        name: String,
    },
}

impl Envelope {
    /// Classify envelope received from [`ResponseSink`].
    ///
    /// # Errors
    /// Returns [`PubNubError::Deserialization`] for bytes which are not one
    /// of known envelope shapes.
    ///
    /// [`ResponseSink`]: super::ResponseSink
    pub fn parse(bytes: &[u8]) -> Result<Self, PubNubError> {
        let invalid = |details: &str| PubNubError::Deserialization {
            details: details.into(),
        };
        let value = serde_json::from_slice::<Value>(bytes).map_err(|err| {
            PubNubError::Deserialization {
                details: err.to_string(),
            }
        })?;
        let Value::Array(mut parts) = value else {
            return Err(invalid("Envelope is not an array"));
        };

        let name = match parts.pop() {
            Some(Value::String(name)) => name,
            _ => return Err(invalid("Envelope should end with name")),
        };

        match parts.as_slice() {
            [Value::Array(payload), Value::String(timetoken), rest @ ..]
                if payload.len() == 1 && rest.len() <= 1 =>
            {
                let (channel, subscription) = match rest {
                    [Value::String(channel)] => (channel.clone(), Some(name)),
                    [] => (name, None),
                    _ => return Err(invalid("Unexpected message channel")),
                };

                Ok(Envelope::Message {
                    payload: payload[0].clone(),
                    timetoken: timetoken.clone(),
                    channel,
                    subscription,
                })
            }
            [Value::Number(code), Value::String(text)] if code.as_u64() == Some(1) => {
                Ok(Envelope::Status {
                    text: text.clone(),
                    name,
                })
            }
            [Value::Number(code), Value::String(message), details @ ..]
                if code.as_u64() == Some(0) && details.len() <= 1 =>
            {
                Ok(Envelope::Error {
                    message: message.clone(),
                    details: details.first().cloned(),
                    name,
                })
            }
            _ => Err(invalid("Unknown envelope shape")),
        }
    }
}

/// Real-time message envelope.
pub(crate) fn message_envelope(
    payload: &Value,
    timetoken: &str,
    channel: &str,
    subscription: Option<&str>,
) -> Vec<u8> {
    let envelope = match subscription {
        Some(subscription) => json!([[payload], timetoken, channel, subscription]),
        None => json!([[payload], timetoken, channel]),
    };
    envelope.to_string().into_bytes()
}

/// Subscription life-cycle status envelope.
pub(crate) fn status_envelope(
    event: ConnectionEvent,
    kind: SubscriptionKind,
    name: &str,
) -> Vec<u8> {
    json!([1, format!("Subscription to {kind} '{name}' {event}"), name])
        .to_string()
        .into_bytes()
}

/// Error envelope.
pub(crate) fn error_envelope(message: &str, name: &str) -> Vec<u8> {
    json!([0, message, name]).to_string().into_bytes()
}

/// Error envelope with additional information.
pub(crate) fn error_envelope_with_details(message: &str, details: &Value, name: &str) -> Vec<u8> {
    json!([0, message, details, name]).to_string().into_bytes()
}

/// Error for attempt to subscribe to already subscribed entity.
pub(crate) fn already_subscribed_envelope(kind: SubscriptionKind, name: &str) -> Vec<u8> {
    error_envelope(
        &format!("Subscription to {kind} '{name}' already subscribed"),
        name,
    )
}

/// Error for attempt to unsubscribe from entity which is not subscribed.
pub(crate) fn not_subscribed_envelope(kind: SubscriptionKind, name: &str) -> Vec<u8> {
    let entity = match kind {
        SubscriptionKind::ChannelGroup => "Channel group",
        _ => "Channel",
    };
    error_envelope(&format!("{entity} '{name}' is not subscribed"), name)
}

/// Body of a service response as JSON for error details.
///
/// Non-JSON bodies are kept as a string.
pub(crate) fn body_details(body: &[u8]) -> Value {
    serde_json::from_slice::<Value>(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}
