//! # Transport module
//!
//! This module contains the [`Transport`] trait and the timeouts used for
//! each [`TrafficClass`].
//!
//! You can implement this trait for your own types, or use one of the provided
//! features to use a transport library.
//!
//! [`PubNub API`]: https://www.pubnub.com/docs

use super::{transport_response::TransportResponse, PubNubError, TrafficClass, TransportRequest};
use std::{sync::Arc, time::Duration};

/// This trait is used to send requests to the [`PubNub API`].
///
/// You can implement this trait for your own types, or use one of the provided
/// features to use a transport library.
///
/// Implementations must report failures as [`PubNubError::Transport`] with a
/// [`TransportErrorKind`] that matches the failure: the subscribe loop uses
/// it to tell timeouts from unreachable hosts.
///
/// # Examples
/// ```
/// use pubnub_longpoll::core::{Transport, TransportRequest, TransportResponse, PubNubError};
///
/// struct MyTransport;
///
/// #[async_trait::async_trait]
/// impl Transport for MyTransport {
///    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, PubNubError> {
///         // Send your request here
///
///         Ok(TransportResponse::default())
///    }
/// }
/// ```
///
/// [`PubNub API`]: https://www.pubnub.com/docs
/// [`TransportErrorKind`]: super::error::TransportErrorKind
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send a request to the [`PubNub API`].
    ///
    /// # Errors
    /// Should return an [`PubNubError::Transport`] if the request cannot be sent.
    ///
    /// [`PubNub API`]: https://www.pubnub.com/docs
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, PubNubError>;
}

#[async_trait::async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, PubNubError> {
        self.as_ref().send(req).await
    }
}

/// Transport specific configuration
///
/// Configuration let specify timeouts for each traffic class:
/// * `subscribe` - long-poll requests
/// * `non-subscribe` - any one-shot requests
/// * `heartbeat` - presence announcements
/// * `reachability` - checks made while subscribe is failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfiguration {
    /// Timeout after which subscribe request will be cancelled by timeout.
    pub subscribe_request_timeout: Duration,

    /// Timeout after which any non-subscribe request will be cancelled by
    /// timeout.
    pub request_timeout: Duration,

    /// Timeout for presence heartbeat requests.
    pub heartbeat_request_timeout: Duration,

    /// Timeout for reachability check requests.
    pub reachability_timeout: Duration,

    /// Timeout for TCP connection establishment.
    pub connect_timeout: Duration,
}

impl TransportConfiguration {
    /// Request timeout for specified traffic class.
    pub fn timeout(&self, class: TrafficClass) -> Duration {
        match class {
            TrafficClass::Subscribe => self.subscribe_request_timeout,
            TrafficClass::NonSubscribe => self.request_timeout,
            TrafficClass::PresenceHeartbeat => self.heartbeat_request_timeout,
            TrafficClass::Reachability => self.reachability_timeout,
        }
    }
}

impl Default for TransportConfiguration {
    fn default() -> Self {
        Self {
            subscribe_request_timeout: Duration::from_secs(310),
            request_timeout: Duration::from_secs(15),
            heartbeat_request_timeout: Duration::from_secs(15),
            reachability_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
        }
    }
}
