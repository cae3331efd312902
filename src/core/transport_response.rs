//! This module contains the `TransportResponse` struct.
//!
//! This struct is used to represent the response from a request to the [`PubNub API`].
//! It is used as the response type for the [`Transport`] trait.
//!
//! [`Transport`]: ../transport/trait.Transport.html
//! [`PubNub API`]: https://www.pubnub.com/docs

/// This struct is used to represent the response from a request to the [`PubNub API`].
/// It is used as the response type for the [`Transport`] trait.
///
/// [`Transport`]: ../transport/trait.Transport.html
/// [`PubNub API`]: https://www.pubnub.com/docs
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct TransportResponse {
    /// status code of the response
    pub status: u16,

    /// body of the response
    pub body: Option<Vec<u8>>,
}

impl TransportResponse {
    /// Response body or empty slice.
    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }
}
