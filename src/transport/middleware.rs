//! # Request middleware
//!
//! Adds the query parameters every [`PubNub API`] call has to carry and
//! signs access manager requests.
//!
//! [`PubNub API`]: https://www.pubnub.com/docs

use crate::core::{PubNubError, Transport, TransportRequest, TransportResponse};
use crate::dx::pubnub_client::{SDK_ID, VERSION};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use log::debug;
use sha2::Sha256;
use std::sync::Arc;

/// Path prefix of access manager endpoints.
pub(crate) const ACCESS_MANAGER_PATH: &str = "/v1/auth/";

/// Keys required to sign access manager requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureKeySet {
    pub(crate) secret_key: String,
    pub(crate) publish_key: String,
    pub(crate) subscribe_key: String,
}

impl SignatureKeySet {
    /// Signature for request with `action` (`grant` or `audit`) and sorted
    /// query string.
    pub(crate) fn signature(&self, action: &str, query: &str) -> Result<String, PubNubError> {
        let message = format!(
            "{}\n{}\n{action}\n{query}",
            self.subscribe_key, self.publish_key
        );
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret_key.as_bytes()).map_err(|err| {
            PubNubError::ClientInitialization {
                details: err.to_string(),
            }
        })?;
        mac.update(message.as_bytes());

        Ok(general_purpose::URL_SAFE.encode(mac.finalize().into_bytes()))
    }
}

/// Transport wrapper used by client for every request.
///
/// Adds `uuid`, `pnsdk`, `instanceid` and `auth` to each request. Requests
/// to access manager also get `timestamp` and `signature`; they carry their
/// own `auth` (the key permissions are managed for).
#[derive(Debug)]
pub struct PubNubMiddleware<T> {
    pub(crate) transport: Arc<T>,
    pub(crate) instance_id: Option<Arc<String>>,
    pub(crate) user_id: Arc<String>,
    pub(crate) auth_key: Option<Arc<String>>,
    pub(crate) signature_keys: Option<SignatureKeySet>,
}

impl<T> PubNubMiddleware<T> {
    fn sign(&self, request: &mut TransportRequest) -> Result<(), PubNubError> {
        let Some(action) = request
            .path
            .strip_prefix(ACCESS_MANAGER_PATH)
            .and_then(|rest| rest.split('/').next())
            .map(String::from)
        else {
            return Ok(());
        };

        let keys = self.signature_keys.as_ref().ok_or(PubNubError::MissingKey {
            key: "secret key".into(),
        })?;

        request.query_parameters.insert(
            "timestamp".into(),
            time::OffsetDateTime::now_utc().unix_timestamp().to_string(),
        );
        let signature = keys.signature(&action, &request.sorted_query())?;
        request
            .query_parameters
            .insert("signature".into(), signature);

        Ok(())
    }
}

#[async_trait::async_trait]
impl<T> Transport for PubNubMiddleware<T>
where
    T: Transport + Send + Sync,
{
    async fn send(&self, mut req: TransportRequest) -> Result<TransportResponse, PubNubError> {
        req.query_parameters
            .insert("pnsdk".into(), format!("{}/{}", SDK_ID, VERSION));
        req.query_parameters
            .insert("uuid".into(), self.user_id.as_ref().clone());

        if let Some(instance_id) = &self.instance_id {
            req.query_parameters
                .insert("instanceid".into(), instance_id.as_ref().clone());
        }

        if req.path.starts_with(ACCESS_MANAGER_PATH) {
            self.sign(&mut req)?;
        } else if let Some(auth_key) = &self.auth_key {
            req.query_parameters
                .insert("auth".into(), auth_key.as_ref().clone());
        }

        debug!("{} request: {}?{}", req.class, req.path, req.sorted_query());
        self.transport.send(req).await
    }
}
