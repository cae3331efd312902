//! Presence module.
//!
//! The presence module allows retrieving presence information and managing the
//! state in specific channels associated with specific `uuid`.
//!
//! Calls are executed on detached tasks and re-issued when the service
//! returns a body which can't be decoded.

use log::debug;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::{
    core::{
        envelope::error_envelope, utils::encoding::url_encode, PubNubError, ResponseSink,
        Transport, TransportRequest,
    },
    dx::{pubnub_client::PubNubClientInstance, retryable::classify_object},
};

mod heartbeat_loop;

impl<T> PubNubClientInstance<T> {
    /// Serialized user state for provided channels.
    ///
    /// Returns `None` when there is no state for any of them.
    pub(crate) fn presence_state(&self, channels: &[String]) -> Option<String> {
        let state = self.state.read();
        let selected = channels
            .iter()
            .filter_map(|channel| {
                state
                    .get(channel)
                    .map(|value| (channel.clone(), Value::Object(value.clone())))
            })
            .collect::<Map<String, Value>>();

        (!selected.is_empty()).then(|| Value::Object(selected).to_string())
    }
}

impl<T> PubNubClientInstance<T>
where
    T: Transport + 'static,
{
    /// Users present on channel.
    ///
    /// `show_uuids` controls whether list of present user ids should be
    /// returned, `include_state` adds their state.
    ///
    /// Service response object is delivered to `success` as is.
    pub fn here_now(
        &self,
        channel: &str,
        show_uuids: bool,
        include_state: bool,
        success: ResponseSink,
        error: ResponseSink,
    ) {
        if channel.is_empty() {
            error.deliver(error_envelope(&PubNubError::EmptyChannel.to_string(), channel));
            return;
        }

        let request = TransportRequest {
            path: format!(
                "/v2/presence/sub-key/{}/channel/{}",
                self.config.subscribe_key,
                url_encode(channel.as_bytes())
            ),
            query_parameters: presence_flags(show_uuids, include_state),
            ..Default::default()
        };

        self.spawn_retryable(
            channel.into(),
            move || request.clone(),
            classify_object,
            success,
            error,
        );
    }

    /// Users present on every channel of subscribe key.
    pub fn global_here_now(
        &self,
        show_uuids: bool,
        include_state: bool,
        success: ResponseSink,
        error: ResponseSink,
    ) {
        let request = TransportRequest {
            path: format!("/v2/presence/sub-key/{}", self.config.subscribe_key),
            query_parameters: presence_flags(show_uuids, include_state),
            ..Default::default()
        };

        self.spawn_retryable(
            String::new(),
            move || request.clone(),
            classify_object,
            success,
            error,
        );
    }

    /// Channels on which user is present.
    ///
    /// Client's own user id is used when `uuid` is `None` or empty.
    pub fn where_now(&self, uuid: Option<&str>, success: ResponseSink, error: ResponseSink) {
        let uuid = uuid
            .filter(|uuid| !uuid.is_empty())
            .unwrap_or(self.user_id())
            .to_string();
        let request = TransportRequest {
            path: format!(
                "/v2/presence/sub-key/{}/uuid/{}",
                self.config.subscribe_key,
                url_encode(uuid.as_bytes())
            ),
            ..Default::default()
        };

        self.spawn_retryable(uuid, move || request.clone(), classify_object, success, error);
    }

    /// State associated with client's user id on channel.
    pub fn get_user_state(&self, channel: &str, success: ResponseSink, error: ResponseSink) {
        if channel.is_empty() {
            error.deliver(error_envelope(&PubNubError::EmptyChannel.to_string(), channel));
            return;
        }

        let request = TransportRequest {
            path: self.user_state_path(channel, false),
            ..Default::default()
        };

        self.spawn_retryable(
            channel.into(),
            move || request.clone(),
            classify_object,
            success,
            error,
        );
    }

    /// Update single key of user state on channel.
    ///
    /// [`Value::Null`] removes the key. Updated state is stored and sent with
    /// subscribe and heartbeat requests.
    pub fn set_user_state_key_value(
        &self,
        channel: &str,
        key: &str,
        value: Value,
        success: ResponseSink,
        error: ResponseSink,
    ) {
        if channel.is_empty() {
            error.deliver(error_envelope(&PubNubError::EmptyChannel.to_string(), channel));
            return;
        }

        let state = {
            let mut states = self.state.write();
            let state = states.entry(channel.to_string()).or_default();
            if value.is_null() {
                state.remove(key);
            } else {
                state.insert(key.to_string(), value);
            }
            let state = state.clone();
            if state.is_empty() {
                states.remove(channel);
            }
            state
        };

        self.send_user_state(channel, state, success, error);
    }

    /// Replace user state on channel with JSON object.
    pub fn set_user_state_json(
        &self,
        channel: &str,
        state: &str,
        success: ResponseSink,
        error: ResponseSink,
    ) {
        if channel.is_empty() {
            error.deliver(error_envelope(&PubNubError::EmptyChannel.to_string(), channel));
            return;
        }

        let state = match serde_json::from_str::<Value>(state) {
            Ok(Value::Object(state)) => state,
            _ => {
                error.deliver(error_envelope("Invalid JSON", channel));
                return;
            }
        };

        {
            let mut states = self.state.write();
            if state.is_empty() {
                states.remove(channel);
            } else {
                states.insert(channel.to_string(), state.clone());
            }
        }

        self.send_user_state(channel, state, success, error);
    }

    fn send_user_state(
        &self,
        channel: &str,
        state: Map<String, Value>,
        success: ResponseSink,
        error: ResponseSink,
    ) {
        debug!("Updating state on '{channel}'");
        let request = TransportRequest {
            path: self.user_state_path(channel, true),
            query_parameters: [("state".to_string(), Value::Object(state).to_string())].into(),
            ..Default::default()
        };

        self.spawn_retryable(
            channel.into(),
            move || request.clone(),
            classify_object,
            success,
            error,
        );
    }

    fn user_state_path(&self, channel: &str, update: bool) -> String {
        format!(
            "/v2/presence/sub-key/{}/channel/{}/uuid/{}{}",
            self.config.subscribe_key,
            url_encode(channel.as_bytes()),
            url_encode(self.user_id().as_bytes()),
            if update { "/data" } else { "" }
        )
    }
}

fn presence_flags(show_uuids: bool, include_state: bool) -> HashMap<String, String> {
    let mut query = HashMap::new();

    if !show_uuids {
        query.insert("disable_uuids".into(), "1".into());
    }
    if include_state {
        query.insert("state".into(), "1".into());
    }

    query
}

#[cfg(all(test, feature = "tokio"))]
mod should {
    use super::*;
    use crate::dx::test_support::{client, next, RecordingTransport};
    use test_case::test_case;

    #[test_case(true, false, &[] ; "show uuids")]
    #[test_case(false, false, &["disable_uuids"] ; "hide uuids")]
    #[test_case(false, true, &["disable_uuids", "state"] ; "hide uuids with state")]
    fn build_presence_flags(show_uuids: bool, include_state: bool, expected: &[&str]) {
        let flags = presence_flags(show_uuids, include_state);
        let mut keys = flags.keys().map(String::as_str).collect::<Vec<_>>();
        keys.sort();

        assert_eq!(keys, expected);
    }

    #[test]
    fn serialize_state_of_listed_channels() {
        let client = client(RecordingTransport::default());
        client.state.write().insert(
            "ch1".into(),
            serde_json::json!({"mood": "happy"}).as_object().unwrap().clone(),
        );

        assert_eq!(
            client.presence_state(&["ch1".into(), "ch2".into()]),
            Some(r#"{"ch1":{"mood":"happy"}}"#.into())
        );
        assert_eq!(client.presence_state(&["ch2".into()]), None);
    }

    #[tokio::test]
    async fn request_here_now() {
        let transport = RecordingTransport::replying(r#"{"status":200,"occupancy":1}"#);
        let client = client(transport.clone());
        let (success, received) = ResponseSink::unbounded();
        let (error, _) = ResponseSink::unbounded();

        client.here_now("my channel", false, true, success, error);

        assert_eq!(next(&received).await["occupancy"], 1);
        let request = transport.last_request().unwrap();
        assert_eq!(request.path, "/v2/presence/sub-key/sub-key/channel/my%20channel");
        assert_eq!(request.query_parameters["disable_uuids"], "1");
        assert_eq!(request.query_parameters["state"], "1");
    }

    #[tokio::test]
    async fn request_where_now_for_own_user_id() {
        let transport = RecordingTransport::replying(r#"{"status":200,"payload":{}}"#);
        let client = client(transport.clone());
        let (success, received) = ResponseSink::unbounded();
        let (error, _) = ResponseSink::unbounded();

        client.where_now(None, success, error);

        next(&received).await;
        assert_eq!(
            transport.last_request().unwrap().path,
            "/v2/presence/sub-key/sub-key/uuid/user-id"
        );
    }

    #[tokio::test]
    async fn reject_empty_channel() {
        let client = client(RecordingTransport::default());
        let (success, _) = ResponseSink::unbounded();
        let (error, errors) = ResponseSink::unbounded();

        client.here_now("", true, false, success, error);

        assert_eq!(next(&errors).await[0], 0);
    }

    #[tokio::test]
    async fn store_and_send_key_value_state() {
        let transport = RecordingTransport::replying(r#"{"status":200,"payload":{}}"#);
        let client = client(transport.clone());
        let (success, received) = ResponseSink::unbounded();
        let (error, _) = ResponseSink::unbounded();

        client.set_user_state_key_value(
            "ch",
            "age",
            serde_json::json!(42),
            success.clone(),
            error.clone(),
        );
        next(&received).await;

        let request = transport.last_request().unwrap();
        assert_eq!(
            request.path,
            "/v2/presence/sub-key/sub-key/channel/ch/uuid/user-id/data"
        );
        assert_eq!(request.query_parameters["state"], r#"{"age":42}"#);
        assert_eq!(client.presence_state(&["ch".into()]), Some(r#"{"ch":{"age":42}}"#.into()));

        client.set_user_state_key_value("ch", "age", Value::Null, success, error);
        next(&received).await;

        assert_eq!(transport.last_request().unwrap().query_parameters["state"], "{}");
        assert_eq!(client.presence_state(&["ch".into()]), None);
    }

    #[tokio::test]
    async fn reject_invalid_json_state() {
        let transport = RecordingTransport::default();
        let client = client(transport.clone());
        let (success, _) = ResponseSink::unbounded();
        let (error, errors) = ResponseSink::unbounded();

        client.set_user_state_json("ch", "[1, 2]", success, error);

        assert_eq!(next(&errors).await[1], "Invalid JSON");
        assert!(transport.requests().is_empty());
    }
}
