//! # PubNub Developer Experience
//!
//! This module provides a structures and methods for the [PubNub] realtime messaging service.
//! It is intended to be used by the [`pubnub_longpoll`] crate.
//!
//! [`pubnub_longpoll`]: ../index.html
//! [PubNub]: https://www.pubnub.com/

pub mod access;
pub mod channel_groups;
pub mod history;
pub mod presence;
pub mod publish;
pub mod subscribe;
pub mod time;

#[cfg(feature = "reqwest")]
pub use pubnub_client::PubNubClient;
pub use pubnub_client::{Keyset, PubNubClientBuilder, PubNubGenericClient};
pub mod pubnub_client;

pub(crate) mod retryable;
pub(crate) mod worker_pool;

#[cfg(all(test, feature = "tokio"))]
pub(crate) mod test_support;
