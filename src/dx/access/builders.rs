//! Access manager builders module.
//!
//! This module contains grant and audit request builders.

use derive_builder::Builder;
use log::debug;
use std::collections::HashMap;

use crate::{
    core::{envelope::error_envelope, PubNubError, ResponseSink, Transport, TransportRequest},
    dx::{
        access::AccessResource,
        pubnub_client::PubNubClientInstance,
        worker_pool::{JobKind, NonSubscribeJob},
    },
    transport::middleware::ACCESS_MANAGER_PATH,
};

/// The [`GrantRequestBuilder`] is used to build grant permissions request
/// that is sent to the [`PubNub`] network.
///
/// Permissions which aren't set explicitly are revoked. Channel resources
/// use `read` and `write`, channel groups use `read` and `manage`.
///
/// [`PubNub`]:https://www.pubnub.com/
#[derive(Builder)]
#[builder(
    pattern = "owned",
    build_fn(vis = "pub(in crate::dx::access)", validate = "Self::validate")
)]
pub struct GrantRequest<T> {
    /// Current client which can provide transportation to perform the request.
    #[builder(field(vis = "pub(in crate::dx::access)"), setter(custom))]
    pub(in crate::dx::access) pubnub_client: PubNubClientInstance<T>,

    /// Resource for which permissions should be granted.
    #[builder(field(vis = "pub(in crate::dx::access)"), setter(custom))]
    pub(in crate::dx::access) resource: AccessResource,

    /// Authorization key for which permissions should be granted.
    ///
    /// Permissions are granted for all keys when not set.
    #[builder(
        field(vis = "pub(in crate::dx::access)"),
        setter(strip_option, into),
        default = "None"
    )]
    pub(in crate::dx::access) auth_key: Option<String>,

    /// Read permission.
    #[builder(field(vis = "pub(in crate::dx::access)"), default = "false")]
    pub(in crate::dx::access) read: bool,

    /// Write permission.
    #[builder(field(vis = "pub(in crate::dx::access)"), default = "false")]
    pub(in crate::dx::access) write: bool,

    /// Manage permission.
    #[builder(field(vis = "pub(in crate::dx::access)"), default = "false")]
    pub(in crate::dx::access) manage: bool,

    /// How long (minutes) granted permissions are valid.
    #[builder(
        field(vis = "pub(in crate::dx::access)"),
        setter(strip_option),
        default = "None"
    )]
    pub(in crate::dx::access) ttl: Option<u32>,
}

/// The [`AuditRequestBuilder`] is used to build permissions audit request.
#[derive(Builder)]
#[builder(
    pattern = "owned",
    build_fn(vis = "pub(in crate::dx::access)", validate = "Self::validate")
)]
pub struct AuditRequest<T> {
    /// Current client which can provide transportation to perform the request.
    #[builder(field(vis = "pub(in crate::dx::access)"), setter(custom))]
    pub(in crate::dx::access) pubnub_client: PubNubClientInstance<T>,

    /// Resource which permissions should be audited.
    #[builder(field(vis = "pub(in crate::dx::access)"), setter(custom))]
    pub(in crate::dx::access) resource: AccessResource,

    /// Authorization key which permissions should be audited.
    #[builder(
        field(vis = "pub(in crate::dx::access)"),
        setter(strip_option, into),
        default = "None"
    )]
    pub(in crate::dx::access) auth_key: Option<String>,
}

/// Ensure that client is able to sign access manager requests and resource
/// name is set where it is required.
fn validate_access<T>(
    client: &Option<PubNubClientInstance<T>>,
    resource: &Option<AccessResource>,
) -> Result<(), String> {
    if let Some(client) = client {
        if client.config.secret_key.is_none() {
            return Err(PubNubError::MissingKey {
                key: "Secret Key".into(),
            }
            .to_string());
        }
    }

    match resource {
        Some(AccessResource::Presence(name)) if name.trim().is_empty() => {
            Err(PubNubError::EmptyChannel.to_string())
        }
        _ => Ok(()),
    }
}

impl<T> GrantRequestBuilder<T> {
    fn validate(&self) -> Result<(), String> {
        validate_access(&self.pubnub_client, &self.resource)
    }
}

impl<T> AuditRequestBuilder<T> {
    fn validate(&self) -> Result<(), String> {
        validate_access(&self.pubnub_client, &self.resource)
    }
}

impl<T> GrantRequest<T> {
    /// Create transport request from the request builder.
    pub(in crate::dx::access) fn transport_request(&self) -> TransportRequest {
        let mut query = resource_query(&self.resource, &self.auth_key);

        query.insert("r".into(), bool_to_numeric(self.read));
        match self.resource {
            AccessResource::ChannelGroup(_) => {
                query.insert("m".into(), bool_to_numeric(self.manage));
            }
            _ => {
                query.insert("w".into(), bool_to_numeric(self.write));
            }
        }
        if let Some(ttl) = self.ttl {
            query.insert("ttl".into(), ttl.to_string());
        }

        access_request("grant", &self.pubnub_client.config.subscribe_key, query)
    }
}

impl<T> AuditRequest<T> {
    /// Create transport request from the request builder.
    pub(in crate::dx::access) fn transport_request(&self) -> TransportRequest {
        access_request(
            "audit",
            &self.pubnub_client.config.subscribe_key,
            resource_query(&self.resource, &self.auth_key),
        )
    }
}

impl<T> GrantRequestBuilder<T>
where
    T: Transport + 'static,
{
    /// Queue grant request.
    ///
    /// Service response is delivered to `success` as is.
    pub fn execute(self, success: ResponseSink, error: ResponseSink) {
        let target = target_name(&self.resource);

        match self.build() {
            Ok(request) => {
                let transport_request = request.transport_request();
                enqueue(&request.pubnub_client, target, transport_request, success, error)
            }
            Err(err) => reject(&target, &err.to_string(), &error),
        }
    }
}

impl<T> AuditRequestBuilder<T>
where
    T: Transport + 'static,
{
    /// Queue audit request.
    ///
    /// Service response is delivered to `success` as is.
    pub fn execute(self, success: ResponseSink, error: ResponseSink) {
        let target = target_name(&self.resource);

        match self.build() {
            Ok(request) => {
                let transport_request = request.transport_request();
                enqueue(&request.pubnub_client, target, transport_request, success, error)
            }
            Err(err) => reject(&target, &err.to_string(), &error),
        }
    }
}

fn enqueue<T>(
    client: &PubNubClientInstance<T>,
    target: String,
    request: TransportRequest,
    success: ResponseSink,
    error: ResponseSink,
) where
    T: Transport + 'static,
{
    debug!("Access manager request {} for '{target}'", request.path);
    client.enqueue(NonSubscribeJob {
        target,
        request,
        kind: JobKind::Verbatim,
        success,
        error,
    });
}

fn reject(target: &str, message: &str, error: &ResponseSink) {
    debug!("Access manager request for '{target}' rejected: {message}");
    error.deliver(error_envelope(message, target));
}

fn target_name(resource: &Option<AccessResource>) -> String {
    resource
        .as_ref()
        .map(|resource| resource.name().to_string())
        .unwrap_or_default()
}

fn resource_query(
    resource: &AccessResource,
    auth_key: &Option<String>,
) -> HashMap<String, String> {
    let mut query = HashMap::new();

    match resource {
        AccessResource::Channel(name) if !name.is_empty() => {
            query.insert("channel".into(), name.clone());
        }
        AccessResource::Presence(name) => {
            query.insert("channel".into(), format!("{name}-pnpres"));
        }
        AccessResource::ChannelGroup(name) if !name.is_empty() => {
            query.insert("channel-group".into(), name.clone());
        }
        _ => {}
    }
    if let Some(auth_key) = auth_key.as_ref().filter(|key| !key.is_empty()) {
        query.insert("auth".into(), auth_key.clone());
    }

    query
}

fn access_request(
    action: &str,
    subscribe_key: &str,
    query: HashMap<String, String>,
) -> TransportRequest {
    TransportRequest {
        path: format!("{ACCESS_MANAGER_PATH}{action}/sub-key/{subscribe_key}"),
        query_parameters: query,
        ..Default::default()
    }
}

fn bool_to_numeric(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}
