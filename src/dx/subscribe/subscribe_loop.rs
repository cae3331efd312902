//! # Subscribe loop
//!
//! Long-poll driver. Every round snapshots subscribed names and continuation
//! token, issues subscribe request and classifies its outcome. The loop
//! stops when both registries are empty.

use async_channel::Receiver;
use futures::{select_biased, FutureExt};
use log::{debug, error, warn};

use super::{
    dispatcher::{
        announce, announce_reconnected, broadcast_error, dispatch_message, DispatchOutcome,
        RegistryKind,
    },
    response::{is_empty_body, parse_subscribe_response, SubscribeMessage, SubscribeResponse},
};
use crate::{
    core::{
        cryptor::decrypt_payload,
        envelope::body_details,
        error_response::service_error_message,
        utils::encoding::join_url_encoded,
        ConnectionEvent, PubNubError, TrafficClass, Transport, TransportErrorKind,
        TransportRequest, TransportResponse,
    },
    dx::pubnub_client::{LoopFlags, PubNubClientInstance},
};

/// Message for subscriptions dropped after too many connectivity failures.
pub(crate) const MAX_RETRIES_MESSAGE: &str = "Max retries exceeded, subscription aborted";

/// Message for responses which can't be processed.
pub(crate) const UNHANDLED_RESPONSE_MESSAGE: &str = "Unable to handle response";

impl<T> PubNubClientInstance<T>
where
    T: Transport + 'static,
{
    /// Spawn subscribe loop unless one is running already.
    pub(crate) fn start_subscribe_loop(&self) {
        if !LoopFlags::acquire(&self.loops.subscribe) {
            return;
        }

        let client = self.clone();
        self.runtime.spawn(async move { client.subscribe_loop().await });
    }

    async fn subscribe_loop(self) {
        debug!("Subscribe loop started");

        loop {
            self.sweep_aborted("Connection aborted");

            if self.subscriptions.is_empty() {
                LoopFlags::release(&self.loops.subscribe);
                if self.subscriptions.is_empty() || !LoopFlags::acquire(&self.loops.subscribe) {
                    break;
                }
                continue;
            }

            self.subscribe_round().await;
        }

        debug!("Subscribe loop stopped");
        self.loop_exit.notify();
    }

    async fn subscribe_round(&self) {
        let close = self.connection.open();
        let channels = self.subscriptions.channels.names();
        let groups = self.subscriptions.groups.names();
        let sent = {
            let mut cursor = self.cursor.write();
            if cursor.reset {
                cursor.reset = false;
                "0".to_string()
            } else {
                cursor.timetoken.clone()
            }
        };

        let request = self.subscribe_request(&channels, &groups, &sent);
        let result = select_biased! {
            _ = close.recv().fuse() => Err(PubNubError::transport(
                TransportErrorKind::ConnectionAborted,
                "Connection aborted",
            )),
            response = self.transport.send(request).fuse() => response,
        };

        match result {
            Ok(response) if response.status == 200 => {
                self.handle_response(response, &channels, &groups, &sent, &close)
                    .await
            }
            Ok(response) => {
                self.restore_reset(&sent);
                self.handle_service_error(response, &close).await
            }
            Err(err) => {
                self.restore_reset(&sent);
                self.handle_transport_error(err, &close).await
            }
        }
    }

    fn subscribe_request(
        &self,
        channels: &[String],
        groups: &[String],
        timetoken: &str,
    ) -> TransportRequest {
        let mut request = TransportRequest {
            path: format!(
                "/subscribe/{}/{}/0/{}",
                self.config.subscribe_key,
                join_url_encoded(channels, ",").unwrap_or_else(|| ",".into()),
                timetoken
            ),
            class: TrafficClass::Subscribe,
            ..Default::default()
        };

        if !groups.is_empty() {
            request
                .query_parameters
                .insert("channel-group".into(), groups.join(","));
        }
        if let Some(heartbeat) = self.config.heartbeat_value() {
            request
                .query_parameters
                .insert("heartbeat".into(), heartbeat.to_string());
        }
        if let Some(state) = self.presence_state(channels) {
            request.query_parameters.insert("state".into(), state);
        }

        request
    }

    async fn handle_response(
        &self,
        response: TransportResponse,
        channels: &[String],
        groups: &[String],
        sent: &str,
        close: &Receiver<()>,
    ) {
        let body = response.body_bytes();

        if is_empty_body(body) {
            debug!("Empty subscribe response");
            self.restore_reset(sent);
            self.backoff(close).await;
            return;
        }

        let parsed = match parse_subscribe_response(body, channels) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Unable to parse subscribe response: {err}");
                self.restore_reset(sent);
                broadcast_error(
                    &self.subscriptions.items(),
                    UNHANDLED_RESPONSE_MESSAGE,
                    Some(&body_details(body)),
                );
                self.backoff(close).await;
                return;
            }
        };

        self.cursor.write().timetoken = parsed.timetoken.clone();

        let reconnected = self.retry.reset() > 0;
        if reconnected {
            debug!("Subscribe connection restored");
            announce_reconnected(&self.subscriptions);
        }

        if parsed.messages.is_empty() && sent == "0" {
            if reconnected {
                // Initial connect is confirmed by the next round.
                self.restore_reset(sent);
                return;
            }

            announce(
                &self.subscriptions.channels.set_connected_for(channels),
                RegistryKind::Channels,
                ConnectionEvent::Connected,
            );
            announce(
                &self.subscriptions.groups.set_connected_for(groups),
                RegistryKind::Groups,
                ConnectionEvent::Connected,
            );
            return;
        }

        self.dispatch(parsed);
    }

    fn dispatch(&self, response: SubscribeResponse) {
        let SubscribeResponse {
            messages,
            timetoken,
        } = response;

        for message in messages {
            let message = match self.cryptor() {
                Some(cryptor) => SubscribeMessage {
                    payload: decrypt_payload(cryptor, message.payload),
                    ..message
                },
                None => message,
            };

            if dispatch_message(&self.subscriptions, &message, &timetoken)
                == DispatchOutcome::Unrecognized
            {
                broadcast_error(
                    &self.subscriptions.items(),
                    UNHANDLED_RESPONSE_MESSAGE,
                    Some(&message.payload),
                );
            }
        }
    }

    async fn handle_service_error(&self, response: TransportResponse, close: &Receiver<()>) {
        let body = response.body_bytes();
        error!("Subscribe failed with status {}", response.status);

        // 403 doesn't prove connectivity, so failures counted so far stay.
        if response.status != 403 {
            self.retry.reset();
        }

        broadcast_error(
            &self.subscriptions.items(),
            &service_error_message(response.status, body),
            Some(&body_details(body)),
        );
        self.backoff(close).await;
    }

    async fn handle_transport_error(&self, err: PubNubError, close: &Receiver<()>) {
        match err.transport_kind() {
            Some(TransportErrorKind::ConnectionAborted) => {
                debug!("Subscribe connection closed");
                self.sweep_aborted(&err.envelope_message());
            }
            Some(TransportErrorKind::Timeout) | Some(TransportErrorKind::HostUnreachable) => {
                let attempt = self.retry.increment();
                warn!("Subscribe connectivity failure {attempt}: {err}");

                if self.config.retry.reached_max_retries(attempt) {
                    self.abort_on_max_retries();
                    return;
                }

                self.backoff(close).await;
                broadcast_error(&self.subscriptions.items(), &err.envelope_message(), None);
            }
            _ => {
                error!("Subscribe failed: {err}");
                broadcast_error(&self.subscriptions.items(), &err.envelope_message(), None);
                self.backoff(close).await;
            }
        }
    }

    /// Drop every subscription after connectivity failures limit reached.
    pub(crate) fn abort_on_max_retries(&self) {
        let items = self.subscriptions.clear();
        warn!("Max retries reached, dropping {} subscriptions", items.len());

        broadcast_error(&items, MAX_RETRIES_MESSAGE, None);
        self.retry.reset();
        self.connection.close();
    }

    /// Remove subscriptions marked by [`abort`] and notify their owners.
    ///
    /// [`abort`]: PubNubClientInstance::abort
    fn sweep_aborted(&self, message: &str) {
        let items = self.subscriptions.apply_abort();
        if !items.is_empty() {
            debug!("Removed {} aborted subscriptions", items.len());
            broadcast_error(&items, message, None);
        }
    }

    /// Next round should start from `0` again if this one has been the
    /// initial one.
    fn restore_reset(&self, sent: &str) {
        if sent == "0" {
            self.cursor.write().reset = true;
        }
    }

    /// Sleep for retry interval or until subscription list changes.
    async fn backoff(&self, close: &Receiver<()>) {
        select_biased! {
            _ = close.recv().fuse() => {},
            _ = self.runtime.sleep(self.config.retry.retry_interval).fuse() => {},
        }
    }
}
