//! # Error response
//!
//! The module contains a result type that represents parsed service error
//! responses for [`PubNubError`] consumption.

use crate::core::PubNubError;
use std::collections::HashMap;

/// Implementation for [`PubNubError`] to create struct from service error
/// response body.
impl From<APIErrorBody> for PubNubError {
    fn from(value: APIErrorBody) -> Self {
        PubNubError::API {
            status: value.status(),
            message: value.message(),
            service: value.service(),
        }
    }
}

/// Additional error information struct.
///
/// This structure used by [`APIErrorBody::AsObjectWithServiceAndErrorPayload`]
/// to represent list of resources for which access has been denied.
#[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorObjectPayload {
    /// The list of channels for which an error was reported.
    channels: Option<Vec<String>>,

    /// The list of channel groups for which an error was reported.
    #[serde(rename = "channel-groups")]
    channel_groups: Option<Vec<String>>,
}

/// PubNub service error response.
///
/// `APIErrorBody` enum variants covers error responses returned by the
/// endpoints used by this crate.
///
/// [`PubNub API`]: https://www.pubnub.com/docs
#[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum APIErrorBody {
    /// Error response in format of an array.
    ///
    /// # Example
    /// ```json
    /// [0,"Not modified"]
    /// ```
    AsArray2(u8, String),

    /// Error response in format of an array.
    ///
    /// Such data includes information about when the error occurred.
    ///
    /// # Example
    /// ```json
    /// [0,"Message Too Large","15782702375048763"]
    /// ```
    AsArray3(u8, String, Option<String>),

    /// Error response in format of dictionary.
    ///
    /// # Example
    /// ```json
    /// {
    ///     "message": "Forbidden",
    ///     "payload": {
    ///         "channels": [
    ///             "test-channel1"
    ///         ],
    ///         "channel-groups": [
    ///             "test-group1"
    ///         ]
    ///     },
    ///     "error": true,
    ///     "service": "Access Manager",
    ///     "status": 403
    /// }
    /// ```
    AsObjectWithServiceAndErrorPayload {
        /// Operation status (HTTP) code.
        status: u16,

        /// There is a flag that tells if this is an error response.
        error: bool,

        /// Service which reported an error.
        service: String,

        /// A message explaining what went wrong.
        message: String,

        /// Additional error information.
        payload: ErrorObjectPayload,
    },

    /// Error response in format of dictionary.
    ///
    /// # Example
    /// ```json
    /// {
    ///     "message": "Invalid Arguments",
    ///     "error": true,
    ///     "service": "Presence",
    ///     "status": 400
    /// }
    /// ```
    AsObjectWithService {
        /// Operation status (HTTP) code.
        status: u16,

        /// There is a flag that tells if this is an error response.
        error: bool,

        /// Service which reported an error.
        service: String,

        /// A message explaining what went wrong.
        message: String,
    },

    /// Error response in format of dictionary.
    ///
    /// # Example
    /// ```json
    /// {
    ///     "status": 400,
    ///     "error": true,
    ///     "error_message": "Invalid Subscribe Keys",
    ///     "channels": {}
    /// }
    /// ```
    AsObjectWithErrorMessageAndChannels {
        /// Operation status (HTTP) code.
        status: u16,

        /// There is a flag that tells if this is an error response.
        error: bool,

        /// A message explaining what went wrong.
        error_message: String,

        /// List of channels for which error has been reported.
        channels: Option<HashMap<String, serde_json::Value>>,
    },

    /// Error response in format of dictionary.
    ///
    /// # Example
    /// ```json
    /// {
    ///     "status": 400,
    ///     "error": true,
    ///     "message": "Invalid Subscribe Key"
    /// }
    /// ```
    AsObjectWithMessage {
        /// Operation status (HTTP) code.
        status: u16,

        /// There is a flag that tells if this is an error response.
        error: bool,

        /// A message explaining what went wrong.
        message: String,
    },
}

impl APIErrorBody {
    fn status(&self) -> u16 {
        match self {
            APIErrorBody::AsObjectWithServiceAndErrorPayload { status, .. } => *status,
            APIErrorBody::AsObjectWithService { status, .. } => *status,
            APIErrorBody::AsObjectWithErrorMessageAndChannels { status, .. } => *status,
            APIErrorBody::AsObjectWithMessage { status, .. } => *status,
            APIErrorBody::AsArray2(_, _) => 400,
            APIErrorBody::AsArray3(_, _, _) => 400,
        }
    }

    fn service(&self) -> Option<String> {
        match self {
            APIErrorBody::AsObjectWithServiceAndErrorPayload { service, .. } => {
                Some(service.to_owned())
            }
            APIErrorBody::AsObjectWithService { service, .. } => Some(service.to_owned()),
            _ => None,
        }
    }

    /// Message reported by service.
    pub fn message(&self) -> String {
        match self {
            APIErrorBody::AsArray2(_, message) => message.to_owned(),
            APIErrorBody::AsArray3(_, message, _) => message.to_owned(),
            APIErrorBody::AsObjectWithServiceAndErrorPayload {
                message, payload, ..
            } => {
                let mut affected: Vec<String> = Vec::new();
                if let Some(channels) = &payload.channels {
                    if !channels.is_empty() {
                        affected.push(format!("affected channels: {}", channels.join(", ")))
                    }
                }

                if let Some(groups) = &payload.channel_groups {
                    if !groups.is_empty() {
                        affected.push(format!("affected channel groups: {}", groups.join(", ")))
                    }
                }

                if affected.is_empty() {
                    message.to_string()
                } else {
                    format!("{message} ({})", affected.join("; "))
                }
            }
            APIErrorBody::AsObjectWithService { message, .. } => message.to_owned(),
            APIErrorBody::AsObjectWithErrorMessageAndChannels { error_message, .. } => {
                error_message.to_owned()
            }
            APIErrorBody::AsObjectWithMessage { message, .. } => message.to_owned(),
        }
    }
}

/// Message for non-200 service response.
///
/// Falls back to the status code when the body is not a known error shape.
pub(crate) fn service_error_message(status: u16, body: &[u8]) -> String {
    serde_json::from_slice::<APIErrorBody>(body)
        .map(|error| error.message())
        .unwrap_or_else(|_| format!("HTTP error {status}"))
}
