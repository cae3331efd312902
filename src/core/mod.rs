//! # PubNub Core
//!
//! Core functionality of the PubNub client.
//!
//! The `core` module contains transport, runtime and crypto abstractions,
//! error types and the envelopes which are delivered to response sinks.
//!
//! [`pubnub_longpoll`]: ../index.html

pub use error::{PubNubError, TransportErrorKind};
pub mod error;

pub use error_response::APIErrorBody;
pub mod error_response;

pub use transport::{Transport, TransportConfiguration};
pub mod transport;

pub use transport_request::{TrafficClass, TransportRequest};
pub mod transport_request;

pub use transport_response::TransportResponse;
pub mod transport_response;

pub use runtime::Runtime;
pub(crate) use runtime::RuntimeSupport;
pub mod runtime;

pub use cryptor::Cryptor;
pub mod cryptor;

pub use retry_policy::RetryConfiguration;
pub mod retry_policy;

pub use response_sink::ResponseSink;
pub mod response_sink;

pub use envelope::{ConnectionEvent, Envelope, SubscriptionKind};
pub mod envelope;

pub(crate) mod utils;
