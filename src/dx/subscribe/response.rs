//! # Subscribe response parser
//!
//! Decodes long-poll responses into an ordered list of messages and the
//! next continuation token.

use crate::core::PubNubError;
use serde::Deserialize;
use serde_json::Value;

/// Service response shapes.
///
/// ```json
/// [[<m>, ...], "<token>"]
/// [[<m>, ...], "<token>", "<c1>,<c2>"]
/// [[<m>, ...], "<token>", "<c1>,<c2>", "<src1>,<src2>"]
/// ```
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum SubscribeResponseBody {
    WithSources(Vec<Value>, String, String, String),
    WithChannels(Vec<Value>, String, String),
    Plain(Vec<Value>, String),
}

/// Single real-time message.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SubscribeMessage {
    /// Message payload as received.
    pub payload: Value,

    /// Channel on which message has been published.
    pub channel: String,

    /// Subscription through which message has been received.
    ///
    /// `None` when message matched channel subscription directly.
    pub source: Option<String>,
}

/// Parsed long-poll response.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SubscribeResponse {
    /// Messages in order in which service returned them.
    pub messages: Vec<SubscribeMessage>,

    /// Continuation token for next long-poll.
    pub timetoken: String,
}

/// Whether the body carries nothing to process.
pub(crate) fn is_empty_body(body: &[u8]) -> bool {
    let body = body
        .iter()
        .copied()
        .filter(|byte| !byte.is_ascii_whitespace())
        .collect::<Vec<u8>>();
    body.is_empty() || body == b"[]"
}

/// Parse long-poll response.
///
/// `channels` is the list of channels sent with the request. It is used to
/// attribute messages from single channel responses which don't carry
/// channel names.
pub(crate) fn parse_subscribe_response(
    body: &[u8],
    channels: &[String],
) -> Result<SubscribeResponse, PubNubError> {
    let response = serde_json::from_slice::<SubscribeResponseBody>(body).map_err(|err| {
        PubNubError::Deserialization {
            details: err.to_string(),
        }
    })?;

    let (payloads, timetoken, names, sources) = match response {
        SubscribeResponseBody::WithSources(payloads, timetoken, names, sources) => {
            (payloads, timetoken, Some(names), Some(sources))
        }
        SubscribeResponseBody::WithChannels(payloads, timetoken, names) => {
            (payloads, timetoken, Some(names), None)
        }
        SubscribeResponseBody::Plain(payloads, timetoken) => (payloads, timetoken, None, None),
    };

    if payloads.is_empty() {
        return Ok(SubscribeResponse {
            messages: vec![],
            timetoken,
        });
    }

    let names = match names {
        Some(names) => split_names(&names, payloads.len())?,
        None => {
            let channel = channels.first().ok_or(PubNubError::Deserialization {
                details: "Unable to attribute messages without subscribed channel".into(),
            })?;
            vec![channel.clone(); payloads.len()]
        }
    };
    let sources = match sources {
        Some(sources) => split_names(&sources, payloads.len())?
            .into_iter()
            .map(Some)
            .collect(),
        None => vec![None; payloads.len()],
    };

    let messages = payloads
        .into_iter()
        .zip(names)
        .zip(sources)
        .map(|((payload, channel), source)| SubscribeMessage {
            source: source.filter(|source| source != &channel),
            payload,
            channel,
        })
        .collect();

    Ok(SubscribeResponse {
        messages,
        timetoken,
    })
}

fn split_names(names: &str, expected: usize) -> Result<Vec<String>, PubNubError> {
    let names = names.split(',').map(String::from).collect::<Vec<_>>();

    if names.len() != expected {
        return Err(PubNubError::Deserialization {
            details: format!(
                "Expected {expected} names for messages, received {}",
                names.len()
            ),
        });
    }

    Ok(names)
}
