//! # Error types
//!
//! This module contains the error types for the [`pubnub_longpoll`] crate.
//!
//! Errors produced here never cross the callback boundary as-is: the client
//! renders them into JSON error envelopes for the caller's error sink. They
//! are still returned directly from builder and transport APIs.
//!
//! [`pubnub_longpoll`]: ../index.html

use snafu::Snafu;

/// PubNub error type
///
/// This type is used to represent errors that can occur while talking to
/// the [`PubNub API`].
///
/// # Examples
/// ```
/// use pubnub_longpoll::core::PubNubError;
///
/// fn foo() -> Result<(), PubNubError> {
///   Ok(())
/// }
///
/// foo().map_err(|e| match e {
///   PubNubError::Transport { details, .. } => println!("Transport error: {details}"),
///   _ => println!("Other error"),
/// });
/// ```
///
/// [`PubNub API`]: https://www.pubnub.com/docs
#[derive(Snafu, Debug, Clone, PartialEq, Eq)]
pub enum PubNubError {
    /// this error is returned when the transport layer fails
    #[snafu(display("Transport error: {details}"))]
    Transport {
        /// docs
        details: String,

        /// Failure class used by the subscribe loop to decide on retries.
        kind: TransportErrorKind,
    },

    /// this error is returned when the serialization of the request fails
    #[snafu(display("Serialization error: {details}"))]
    Serialization {
        ///docs
        details: String,
    },

    /// this error is returned when the deserialization of the response fails
    #[snafu(display("Deserialization error: {details}"))]
    Deserialization {
        ///docs
        details: String,
    },

    /// this error is returned when the initialization of client fails
    #[snafu(display("Client initialization error: {details}"))]
    ClientInitialization {
        ///docs
        details: String,
    },

    /// this error is returned when the initialization of the cryptor fails
    #[snafu(display("Cryptor initialization error: {details}"))]
    CryptoInitialization {
        ///docs
        details: String,
    },

    /// this error is returned when the cryptor is unable to encrypt data
    #[snafu(display("Data encryption error: {details}"))]
    Encryption {
        ///docs
        details: String,
    },

    /// this error is returned when the cryptor is unable to decrypt data
    #[snafu(display("Data decryption error: {details}"))]
    Decryption {
        ///docs
        details: String,
    },

    /// this error is returned when a channel or channel group name is empty
    #[snafu(display("Missing channel"))]
    EmptyChannel,

    /// this error is returned when a key required by the operation is missing
    #[snafu(display("Missing {key}"))]
    MissingKey {
        /// Human readable key name.
        key: String,
    },

    /// this error is returned when the client has already been aborted
    #[snafu(display("Client has been aborted"))]
    ClientAborted,

    /// this error is returned when the service responded with an error
    #[snafu(display("API error: {message}"))]
    API {
        /// Operation status (HTTP) code.
        status: u16,

        /// A message explaining what went wrong.
        message: String,

        /// Service which reported an error.
        service: Option<String>,
    },
}

/// Transport failure classification.
///
/// Transport implementations map their native errors onto these classes so
/// the subscribe loop can tell a timeout from a dead network from a request
/// that was cancelled on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The request did not complete within the traffic class timeout.
    Timeout,

    /// DNS resolution or TCP connect failed.
    HostUnreachable,

    /// The in-flight request was cancelled by the client.
    ConnectionAborted,

    /// Any other transport level failure.
    Other,
}

impl PubNubError {
    /// Create transport error of specified kind.
    pub fn transport<S>(kind: TransportErrorKind, details: S) -> Self
    where
        S: Into<String>,
    {
        PubNubError::Transport {
            details: details.into(),
            kind,
        }
    }

    /// Transport failure class if this is a transport error.
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            PubNubError::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Message which is placed into error envelopes.
    ///
    /// Transport failures are reported with the fixed texts callers match on,
    /// everything else with its display form.
    pub(crate) fn envelope_message(&self) -> String {
        match self {
            PubNubError::Transport {
                kind: TransportErrorKind::Timeout,
                ..
            } => "Request timeout".into(),
            PubNubError::Transport {
                kind: TransportErrorKind::HostUnreachable,
                ..
            } => "Network unreachable".into(),
            PubNubError::Transport { details, .. } => details.clone(),
            PubNubError::API { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use test_case::test_case;

    #[test_case(TransportErrorKind::Timeout, "Request timeout" ; "for timeout")]
    #[test_case(TransportErrorKind::HostUnreachable, "Network unreachable" ; "for unreachable host")]
    #[test_case(TransportErrorKind::ConnectionAborted, "Connection aborted" ; "for aborted connection")]
    fn render_transport_errors_for_envelopes(kind: TransportErrorKind, expected: &str) {
        let error = PubNubError::transport(kind, "Connection aborted");

        assert_eq!(error.envelope_message(), expected);
        assert_eq!(error.transport_kind(), Some(kind));
    }

    #[test]
    fn render_missing_key() {
        let error = PubNubError::MissingKey {
            key: "Publish Key".into(),
        };

        assert_eq!(error.envelope_message(), "Missing Publish Key");
        assert_eq!(error.transport_kind(), None);
    }
}
