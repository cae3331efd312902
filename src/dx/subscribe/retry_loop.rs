//! # Retry loop
//!
//! Reachability check which runs next to the subscribe loop. It notices
//! lost connectivity while long-poll is still parked and forces the
//! subscribe loop to re-dial.

use log::{debug, warn};

use super::dispatcher::{announce_reconnected, broadcast_error};
use crate::{
    core::{
        PubNubError, TrafficClass, Transport, TransportErrorKind, TransportRequest,
        TransportResponse,
    },
    dx::pubnub_client::{LoopFlags, PubNubClientInstance},
};

impl<T> PubNubClientInstance<T>
where
    T: Transport + 'static,
{
    /// Spawn retry loop unless one is running already.
    pub(crate) fn start_retry_loop(&self) {
        if !LoopFlags::acquire(&self.loops.retry) {
            return;
        }

        let client = self.clone();
        self.runtime.spawn(async move { client.retry_loop().await });
    }

    async fn retry_loop(self) {
        debug!("Retry loop started");

        loop {
            if self.subscriptions.is_empty() {
                LoopFlags::release(&self.loops.retry);
                if self.subscriptions.is_empty() || !LoopFlags::acquire(&self.loops.retry) {
                    break;
                }
            }

            let result = self
                .transport
                .send(TransportRequest {
                    path: "/time/0".into(),
                    class: TrafficClass::Reachability,
                    ..Default::default()
                })
                .await;
            self.handle_reachability(result);

            self.runtime.sleep(self.config.retry.retry_interval).await;
        }

        debug!("Retry loop stopped");
    }

    fn handle_reachability(&self, result: Result<TransportResponse, PubNubError>) {
        match result {
            Ok(response) if response.status == 200 => {
                if self.retry.reset() > 0 {
                    debug!("Reachability check succeeded after failures");
                    announce_reconnected(&self.subscriptions);
                }
            }
            Ok(response) => debug!("Reachability check status {}", response.status),
            Err(err) => match err.transport_kind() {
                Some(TransportErrorKind::Timeout) | Some(TransportErrorKind::HostUnreachable) => {
                    // Failures which subscribe loop already counted are not counted twice.
                    let Some(attempt) = self.retry.increment_if_clear() else {
                        return;
                    };
                    warn!("Reachability check failed: {err}");

                    if self.config.retry.reached_max_retries(attempt) {
                        self.abort_on_max_retries();
                        return;
                    }

                    broadcast_error(&self.subscriptions.items(), &err.envelope_message(), None);
                    self.connection.close();
                }
                _ => debug!("Reachability check failed: {err}"),
            },
        }
    }
}
