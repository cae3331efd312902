//! # Transport Providers Module
//!
//! This module contains the Transport Providers that can be used by [`PubNubClient`]
//! and the [`PubNubMiddleware`] which every client wraps its transport with.
//!
//! [`PubNubClient`]: crate::PubNubClient
//! [`PubNubMiddleware`]: middleware::PubNubMiddleware

#[cfg(feature = "reqwest")]
pub use self::reqwest::TransportReqwest;
#[cfg(feature = "reqwest")]
pub mod reqwest;

pub mod middleware;
