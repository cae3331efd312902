//! Scripted in-memory transport for client integration tests.

#![allow(dead_code)]

use async_channel::Receiver;
use pubnub_longpoll::{
    core::{
        PubNubError, RetryConfiguration, TrafficClass, Transport, TransportErrorKind,
        TransportRequest, TransportResponse,
    },
    Keyset, PubNubClientBuilder, PubNubGenericClient,
};
use serde_json::Value;
use spin::Mutex;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

type Scripted = Result<TransportResponse, PubNubError>;
type Hook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct StubState {
    requests: Mutex<Vec<TransportRequest>>,
    subscribe: Mutex<VecDeque<Scripted>>,
    subscribe_fallback: Mutex<Option<Scripted>>,
    subscribe_hook: Mutex<Option<Hook>>,
    reachability_queue: Mutex<VecDeque<Scripted>>,
    reachability_fallback: Mutex<Option<Scripted>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    delay: Mutex<Duration>,
}

/// Transport stub.
///
/// * subscribe requests get queued responses, then the fallback one; without
///   fallback they hang until cancelled,
/// * reachability checks get queued responses, then succeed unless failure
///   is configured,
/// * other requests are answered after configured delay while their
///   concurrency is tracked.
#[derive(Clone, Default)]
pub struct StubTransport {
    state: Arc<StubState>,
}

impl StubTransport {
    pub fn push_subscribe(&self, response: Scripted) -> &Self {
        self.state.subscribe.lock().push_back(response);
        self
    }

    pub fn fail_subscribe_with(&self, response: Scripted) -> &Self {
        *self.state.subscribe_fallback.lock() = Some(response);
        self
    }

    /// Run `hook` while the next subscribe request is being answered.
    pub fn on_next_subscribe<F>(&self, hook: F) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        *self.state.subscribe_hook.lock() = Some(Box::new(hook));
        self
    }

    pub fn push_reachability(&self, response: Scripted) -> &Self {
        self.state.reachability_queue.lock().push_back(response);
        self
    }

    pub fn fail_reachability_with(&self, response: Scripted) -> &Self {
        *self.state.reachability_fallback.lock() = Some(response);
        self
    }

    pub fn delay_non_subscribe(&self, delay: Duration) -> &Self {
        *self.state.delay.lock() = delay;
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.state.requests.lock().clone()
    }

    pub fn requests_of(&self, class: TrafficClass) -> Vec<TransportRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.class == class)
            .collect()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }

    async fn subscribe(&self) -> Scripted {
        let hook = self.state.subscribe_hook.lock().take();
        if let Some(hook) = hook {
            hook();
        }

        let scripted = self.state.subscribe.lock().pop_front();
        if let Some(response) = scripted {
            return response;
        }

        let fallback = self.state.subscribe_fallback.lock().clone();
        match fallback {
            Some(response) => response,
            None => futures::future::pending().await,
        }
    }

    fn reachability(&self) -> Scripted {
        let scripted = self.state.reachability_queue.lock().pop_front();
        if let Some(response) = scripted {
            return response;
        }

        let fallback = self.state.reachability_fallback.lock().clone();
        fallback.unwrap_or_else(|| Ok(ok("[16000000000000000]")))
    }

    async fn non_subscribe(&self, request: &TransportRequest) -> Scripted {
        let current = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak.fetch_max(current, Ordering::SeqCst);

        let delay = *self.state.delay.lock();
        tokio::time::sleep(delay).await;

        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        let body = if request.path.starts_with("/publish/") {
            r#"[1,"Sent","16000000000000000"]"#
        } else if request.path.ends_with("/leave") {
            r#"{"status":200,"message":"OK","action":"leave","service":"Presence"}"#
        } else {
            r#"{"status":200,"message":"OK"}"#
        };
        Ok(ok(body))
    }
}

#[async_trait::async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, PubNubError> {
        self.state.requests.lock().push(request.clone());

        match request.class {
            TrafficClass::Subscribe => self.subscribe().await,
            TrafficClass::Reachability => self.reachability(),
            TrafficClass::PresenceHeartbeat => Ok(ok(r#"{"status":200}"#)),
            TrafficClass::NonSubscribe => self.non_subscribe(&request).await,
        }
    }
}

pub fn ok(body: &str) -> TransportResponse {
    TransportResponse {
        status: 200,
        body: Some(body.as_bytes().to_vec()),
    }
}

pub fn status(status: u16, body: &str) -> TransportResponse {
    TransportResponse {
        status,
        body: Some(body.as_bytes().to_vec()),
    }
}

pub fn timeout() -> Scripted {
    Err(PubNubError::transport(
        TransportErrorKind::Timeout,
        "operation timed out",
    ))
}

pub fn unreachable() -> Scripted {
    Err(PubNubError::transport(
        TransportErrorKind::HostUnreachable,
        "dns error",
    ))
}

pub fn client(transport: StubTransport) -> PubNubGenericClient<StubTransport> {
    client_with(transport, 50, 2)
}

pub fn client_with(
    transport: StubTransport,
    max_retries: u32,
    max_workers: usize,
) -> PubNubGenericClient<StubTransport> {
    let _ = env_logger::builder().is_test(true).try_init();

    PubNubClientBuilder::with_transport(transport)
        .with_keyset(Keyset {
            subscribe_key: "sub-key",
            publish_key: Some("pub-key"),
            secret_key: None,
        })
        .with_user_id("tester")
        .with_retry_configuration(RetryConfiguration {
            max_retries,
            retry_interval: Duration::from_millis(20),
        })
        .with_max_workers(max_workers)
        .build()
        .unwrap()
}

/// Next envelope from sink receiver.
pub async fn next(receiver: &Receiver<Vec<u8>>) -> Value {
    let envelope = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
        .await
        .expect("envelope should be delivered in time")
        .expect("sink should stay open");

    serde_json::from_slice(&envelope).unwrap()
}

/// Whether nothing arrives into sink for a short while.
pub async fn stays_empty(receiver: &Receiver<Vec<u8>>) -> bool {
    tokio::time::timeout(Duration::from_millis(100), receiver.recv())
        .await
        .is_err()
}
