//! # Reqwest Transport Implementation
//!
//! This module contains the [`TransportReqwest`] struct.
//! It is used to send requests to the [`PubNub API`] using the [`reqwest`] crate.
//! It is intended to be used by the [`pubnub_longpoll`] crate.
//!
//! It requires the [`reqwest` feature] to be enabled.
//!
//! [`TransportReqwest`]: ./struct.TransportReqwest.html
//! [`PubNub API`]: https://www.pubnub.com/docs
//! [`reqwest`]: https://docs.rs/reqwest
//! [`pubnub_longpoll`]: ../index.html
//! [`reqwest` feature]: ../index.html#features

use crate::core::{
    PubNubError, TrafficClass, Transport, TransportConfiguration, TransportErrorKind,
    TransportRequest, TransportResponse,
};
use log::{error, info};
use reqwest::StatusCode;

/// This struct is used to send requests to the [`PubNub API`] using the [`reqwest`] crate.
/// It is used as the transport type for the [`PubNubClient`].
///
/// Each [`TrafficClass`] is served by its own [`reqwest::Client`], so every
/// class has independent connection pool and timeout.
///
/// [`PubNub API`]: https://www.pubnub.com/docs
/// [`reqwest`]: https://docs.rs/reqwest
/// [`PubNubClient`]: crate::PubNubClient
#[derive(Clone, Debug)]
pub struct TransportReqwest {
    subscribe_client: reqwest::Client,
    non_subscribe_client: reqwest::Client,
    heartbeat_client: reqwest::Client,
    reachability_client: reqwest::Client,
    configuration: TransportConfiguration,

    /// The hostname to use for requests.
    /// It is used as the base URL for all requests.
    ///
    /// It defaults to `https://ps.pndsn.com`.
    /// # Examples
    /// ```
    /// use pubnub_longpoll::transport::TransportReqwest;
    ///
    /// let transport = {
    ///    let mut transport = TransportReqwest::default();
    ///    transport.hostname = "https://wherever.you.want.com".into();
    ///    transport
    /// };
    /// ```
    pub hostname: String,
}

#[async_trait::async_trait]
impl Transport for TransportReqwest {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, PubNubError> {
        let request_url = prepare_url(&self.hostname, &request);
        info!("{}", request_url);

        let result = self
            .client(request.class)
            .get(request_url)
            .timeout(self.configuration.timeout(request.class))
            .send()
            .await
            .map_err(transport_error)?;

        let status = result.status();
        result
            .bytes()
            .await
            .map_err(transport_error)
            .and_then(|bytes| create_result(status, &bytes))
    }
}

impl Default for TransportReqwest {
    fn default() -> Self {
        Self::with_configuration(TransportConfiguration::default())
    }
}

impl TransportReqwest {
    /// Create a new [`TransportReqwest`] instance.
    ///
    /// It uses default [`TransportConfiguration`] timeouts and a default
    /// hostname of `https://ps.pndsn.com`.
    ///
    /// # Example
    /// ```
    /// use pubnub_longpoll::transport::TransportReqwest;
    ///
    /// let transport = TransportReqwest::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`TransportReqwest`] instance with custom timeouts.
    pub fn with_configuration(configuration: TransportConfiguration) -> Self {
        Self {
            subscribe_client: create_client(&configuration, TrafficClass::Subscribe),
            non_subscribe_client: create_client(&configuration, TrafficClass::NonSubscribe),
            heartbeat_client: create_client(&configuration, TrafficClass::PresenceHeartbeat),
            reachability_client: create_client(&configuration, TrafficClass::Reachability),
            configuration,
            hostname: "https://ps.pndsn.com".into(),
        }
    }

    /// set the custom hostname for request
    pub fn set_hostname<S>(&mut self, hostname: S)
    where
        S: Into<String>,
    {
        self.hostname = hostname.into();
    }

    fn client(&self, class: TrafficClass) -> &reqwest::Client {
        match class {
            TrafficClass::Subscribe => &self.subscribe_client,
            TrafficClass::NonSubscribe => &self.non_subscribe_client,
            TrafficClass::PresenceHeartbeat => &self.heartbeat_client,
            TrafficClass::Reachability => &self.reachability_client,
        }
    }
}

fn create_client(configuration: &TransportConfiguration, class: TrafficClass) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(configuration.connect_timeout)
        .timeout(configuration.timeout(class))
        .build()
        .unwrap_or_else(|err| {
            error!("Unable to configure {class} client: {err}");
            reqwest::Client::new()
        })
}

fn transport_error(err: reqwest::Error) -> PubNubError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::HostUnreachable
    } else {
        TransportErrorKind::Other
    };

    PubNubError::transport(kind, err.to_string())
}

fn prepare_url(hostname: &str, request: &TransportRequest) -> String {
    let hostname = hostname.trim_end_matches('/');

    if request.query_parameters.is_empty() {
        return format!("{}{}", hostname, request.path);
    }

    format!("{}{}?{}", hostname, request.path, request.sorted_query())
}

fn create_result(status: StatusCode, body: &[u8]) -> Result<TransportResponse, PubNubError> {
    Ok(TransportResponse {
        status: status.as_u16(),
        body: (!body.is_empty()).then(|| body.to_vec()),
    })
}
