//! # Providers module
//!
//! This module contains the Providers that can be used by [`PubNubClient`].
//! It is intended to be used by the [`pubnub_longpoll`] crate.
//!
//! [`PubNubClient`]: crate::PubNubClient
//! [`pubnub_longpoll`]: ../index.html

#[cfg(feature = "crypto")]
pub mod crypto_aescbc;

#[cfg(feature = "tokio")]
pub mod futures_tokio;
