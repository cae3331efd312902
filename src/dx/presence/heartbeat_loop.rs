//! # Heartbeat loop
//!
//! Periodically announces `user_id` presence on subscribed channels and
//! groups while there is at least one of them.

use log::{debug, warn};
use std::time::Duration;

use crate::{
    core::{utils::encoding::join_url_encoded, TrafficClass, Transport, TransportRequest},
    dx::{
        pubnub_client::{LoopFlags, PubNubClientInstance},
        subscribe::registry::is_presence,
    },
};

impl<T> PubNubClientInstance<T>
where
    T: Transport + 'static,
{
    /// Spawn heartbeat loop if presence heartbeat is configured and loop
    /// isn't running yet.
    pub(crate) fn start_heartbeat_loop(&self) {
        let presence = &self.config.presence;
        if presence.heartbeat_value == 0 || presence.heartbeat_interval == 0 {
            return;
        }
        if !LoopFlags::acquire(&self.loops.heartbeat) {
            return;
        }

        let client = self.clone();
        self.runtime.spawn(async move { client.heartbeat_loop().await });
    }

    async fn heartbeat_loop(self) {
        let interval = Duration::from_secs(self.config.presence.heartbeat_interval);
        debug!("Heartbeat loop started with {interval:?} interval");

        loop {
            let (channels, groups) = self.heartbeat_targets();

            if self.is_aborted() || (channels.is_empty() && groups.is_empty()) {
                LoopFlags::release(&self.loops.heartbeat);
                let (channels, groups) = self.heartbeat_targets();
                if self.is_aborted()
                    || (channels.is_empty() && groups.is_empty())
                    || !LoopFlags::acquire(&self.loops.heartbeat)
                {
                    break;
                }
                continue;
            }

            let request = self.heartbeat_request(&channels, &groups);
            match self.transport.send(request).await {
                Ok(response) if response.status == 200 => debug!("Heartbeat announced"),
                Ok(response) => warn!("Heartbeat failed with status {}", response.status),
                Err(err) => warn!("Heartbeat failed: {err}"),
            }

            self.runtime.sleep(interval).await;
        }

        debug!("Heartbeat loop stopped");
    }

    /// Subscribed channels and groups without presence names.
    fn heartbeat_targets(&self) -> (Vec<String>, Vec<String>) {
        let regular = |names: Vec<String>| {
            names
                .into_iter()
                .filter(|name| !is_presence(name))
                .collect::<Vec<_>>()
        };

        (
            regular(self.subscriptions.channels.names()),
            regular(self.subscriptions.groups.names()),
        )
    }

    pub(crate) fn heartbeat_request(&self, channels: &[String], groups: &[String]) -> TransportRequest {
        let mut request = TransportRequest {
            path: format!(
                "/v2/presence/sub-key/{}/channel/{}/heartbeat",
                self.config.subscribe_key,
                join_url_encoded(channels, ",").unwrap_or_else(|| ",".into())
            ),
            class: TrafficClass::PresenceHeartbeat,
            ..Default::default()
        };

        request.query_parameters.insert(
            "heartbeat".into(),
            self.config.presence.heartbeat_value.to_string(),
        );
        if !groups.is_empty() {
            request
                .query_parameters
                .insert("channel-group".into(), groups.join(","));
        }
        if let Some(state) = self.presence_state(channels) {
            request.query_parameters.insert("state".into(), state);
        }

        request
    }
}

#[cfg(all(test, feature = "tokio"))]
mod should {
    use crate::{
        core::{ResponseSink, TrafficClass},
        dx::test_support::{builder, RecordingTransport},
    };
    use std::{sync::atomic::Ordering, time::Duration};

    fn heartbeats(transport: &RecordingTransport) -> usize {
        transport
            .requests()
            .iter()
            .filter(|request| request.class == TrafficClass::PresenceHeartbeat)
            .count()
    }

    #[tokio::test]
    async fn run_single_loop_until_subscriptions_removed() {
        let transport = RecordingTransport::replying(r#"{"status":200}"#);
        let client = builder(transport.clone(), None)
            .with_heartbeat_value(20)
            .with_heartbeat_interval(1)
            .build()
            .unwrap();
        client.subscriptions.channels.add(
            "demo",
            ResponseSink::unbounded().0,
            ResponseSink::unbounded().0,
        );

        client.start_heartbeat_loop();
        client.start_heartbeat_loop();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(heartbeats(&transport), 1);
        assert!(client.loops.heartbeat.load(Ordering::Acquire));

        client.subscriptions.channels.remove("demo");
        tokio::time::sleep(Duration::from_millis(1300)).await;

        assert_eq!(heartbeats(&transport), 1);
        assert!(!client.loops.heartbeat.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn not_start_without_heartbeat_configuration() {
        let transport = RecordingTransport::default();
        let client = builder(transport.clone(), None).build().unwrap();
        client.subscriptions.channels.add(
            "demo",
            ResponseSink::unbounded().0,
            ResponseSink::unbounded().0,
        );

        client.start_heartbeat_loop();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(heartbeats(&transport), 0);
        assert!(!client.loops.heartbeat.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn skip_presence_only_subscriptions() {
        let transport = RecordingTransport::replying(r#"{"status":200}"#);
        let client = builder(transport.clone(), None)
            .with_heartbeat_value(20)
            .with_heartbeat_interval(1)
            .build()
            .unwrap();
        client.subscriptions.channels.add(
            "demo-pnpres",
            ResponseSink::unbounded().0,
            ResponseSink::unbounded().0,
        );

        client.start_heartbeat_loop();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(heartbeats(&transport), 0);
        assert!(!client.loops.heartbeat.load(Ordering::Acquire));
    }

    #[test]
    fn build_heartbeat_request() {
        let client = builder(RecordingTransport::default(), None)
            .with_heartbeat_value(60)
            .build()
            .unwrap();
        client.state.write().insert(
            "ch-b".into(),
            serde_json::json!({"k": "v"}).as_object().unwrap().clone(),
        );

        let request =
            client.heartbeat_request(&["ch-a".into(), "ch-b".into()], &["group".into()]);

        assert_eq!(
            request.path,
            "/v2/presence/sub-key/sub-key/channel/ch-a,ch-b/heartbeat"
        );
        assert_eq!(request.query_parameters["heartbeat"], "60");
        assert_eq!(request.query_parameters["channel-group"], "group");
        assert_eq!(request.query_parameters["state"], r#"{"ch-b":{"k":"v"}}"#);
    }

    #[test]
    fn use_comma_placeholder_without_channels() {
        let client = builder(RecordingTransport::default(), None)
            .with_heartbeat_value(30)
            .build()
            .unwrap();

        let request = client.heartbeat_request(&[], &["group".into()]);

        assert_eq!(request.path, "/v2/presence/sub-key/sub-key/channel/,/heartbeat");
        assert!(!request.query_parameters.contains_key("state"));
    }
}
