//! # Transport Request
//!
//! This module contains the `TransportRequest` struct and related types.
//!
//! [`pubnub_longpoll`]: ../index.html

use std::{collections::HashMap, fmt::Display};

/// Traffic class of a request.
///
/// Every class is served by a dedicated pool of connections with its own
/// timeout, so a parked long-poll never delays a publish or a heartbeat.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default)]
pub enum TrafficClass {
    /// Long-poll subscribe request.
    Subscribe,

    /// Publish, history, presence, access manager and other one-shot calls.
    #[default]
    NonSubscribe,

    /// Presence heartbeat announcement.
    PresenceHeartbeat,

    /// Reachability check issued by the retry loop.
    Reachability,
}

impl Display for TrafficClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TrafficClass::Subscribe => "subscribe",
                TrafficClass::NonSubscribe => "non-subscribe",
                TrafficClass::PresenceHeartbeat => "heartbeat",
                TrafficClass::Reachability => "reachability",
            }
        )
    }
}

/// This struct represents a request to be sent to the PubNub API.
///
/// All endpoints used by this crate are plain `GET` requests, so a request is
/// fully described by its path, query and traffic class.
///
/// [`Transport`]: ../transport/trait.Transport.html
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct TransportRequest {
    /// path to the resource
    pub path: String,

    /// query parameters to be sent with the request
    pub query_parameters: HashMap<String, String>,

    /// connection pool which should be used to send the request
    pub class: TrafficClass,
}

impl TransportRequest {
    /// Query string with keys sorted and values percent-encoded.
    ///
    /// The same string is used to build request URL and access manager
    /// signature, so both always agree on parameters order.
    pub fn sorted_query(&self) -> String {
        let mut keys = self.query_parameters.keys().collect::<Vec<_>>();
        keys.sort();

        keys.into_iter()
            .map(|key| {
                format!(
                    "{key}={}",
                    crate::core::utils::encoding::url_encode(
                        self.query_parameters[key].as_bytes()
                    )
                )
            })
            .collect::<Vec<String>>()
            .join("&")
    }
}
