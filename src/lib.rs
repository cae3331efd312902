#![warn(missing_docs)]
//! # PubNub long-poll client
//!
//! Client for the [PubNub] realtime messaging service built around a
//! long-polling subscribe loop.
//!
//! Every operation takes two [`ResponseSink`]s. Results are delivered into
//! them as JSON encoded envelopes:
//!
//! * message: `[[<payload>], "<timetoken>", "<channel>"]`, with fourth
//!   element naming the channel group or wildcard subscription the message
//!   has been matched by,
//! * connection status: `[1, "Subscription to channel '<name>' connected", "<name>"]`,
//! * error: `[0, "<message>", "<name>"]` or `[0, "<message>", <details>, "<name>"]`,
//! * service responses of publish, history, presence, access manager and
//!   channel groups calls are delivered as they were received.
//!
//! [`Envelope::parse`] classifies received envelopes.
//!
//! ## Example
//!
//! ```no_run
//! use pubnub_longpoll::{core::{Envelope, ResponseSink}, Keyset, PubNubClientBuilder};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PubNubClientBuilder::with_reqwest_transport()
//!     .with_keyset(Keyset {
//!         subscribe_key: "demo",
//!         publish_key: Some("demo"),
//!         secret_key: None,
//!     })
//!     .with_user_id("user_id")
//!     .with_heartbeat_value(60)
//!     .build()?;
//!
//! let (success, messages) = ResponseSink::unbounded();
//! let (error, errors) = ResponseSink::unbounded();
//! client.subscribe(&["my_channel"], None, false, success.clone(), error.clone());
//!
//! client
//!     .publish_message("hello")
//!     .channel("my_channel")
//!     .execute(success, error);
//!
//! while let Ok(envelope) = messages.recv().await {
//!     if let Envelope::Message { payload, channel, .. } = Envelope::parse(&envelope)? {
//!         println!("{channel}: {payload}");
//!     }
//! }
//! # drop(errors);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! * `reqwest` - [`reqwest`] based transport ([`TransportReqwest`]),
//! * `tokio` - [`tokio`] runtime for background loops,
//! * `crypto` - AES-CBC cryptor configured with
//!   [`with_cipher_key`](dx::pubnub_client::PubNubClientConfigBuilder::with_cipher_key).
//!
//! All of them are enabled by default, `full` enables all of them too.
//!
//! [PubNub]: https://www.pubnub.com/
//! [`ResponseSink`]: core::ResponseSink
//! [`Envelope::parse`]: core::Envelope::parse
//! [`reqwest`]: https://docs.rs/reqwest
//! [`tokio`]: https://docs.rs/tokio
//! [`TransportReqwest`]: transport::TransportReqwest

#[doc(inline)]
pub use dx::{Keyset, PubNubClientBuilder, PubNubGenericClient};

#[cfg(feature = "reqwest")]
#[doc(inline)]
pub use dx::PubNubClient;

pub mod core;
pub mod dx;
pub mod providers;
pub mod transport;
