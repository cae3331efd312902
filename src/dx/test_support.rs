//! Scripted transport shared by client tests.

use spin::Mutex;
use std::{collections::VecDeque, sync::Arc};

use crate::{
    core::{PubNubError, Transport, TransportRequest, TransportResponse},
    dx::pubnub_client::{
        Keyset, PubNubClientBuilder, PubNubClientConfigBuilder, PubNubGenericClient,
    },
};

type Scripted = Result<TransportResponse, PubNubError>;

/// Transport which records requests and replies with queued responses.
///
/// When the queue is empty, `fallback` body is returned with status `200`.
#[derive(Clone, Default)]
pub(crate) struct RecordingTransport {
    requests: Arc<Mutex<Vec<TransportRequest>>>,
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    fallback: Arc<String>,
}

impl RecordingTransport {
    pub fn replying(body: &str) -> Self {
        Self {
            fallback: Arc::new(body.into()),
            ..Default::default()
        }
    }

    pub fn push(&self, response: Scripted) {
        self.responses.lock().push_back(response);
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, PubNubError> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(ok(&self.fallback)))
    }
}

pub(crate) fn ok(body: &str) -> TransportResponse {
    TransportResponse {
        status: 200,
        body: Some(body.as_bytes().to_vec()),
    }
}

pub(crate) fn builder(
    transport: RecordingTransport,
    secret_key: Option<&'static str>,
) -> PubNubClientConfigBuilder<RecordingTransport> {
    PubNubClientBuilder::with_transport(transport)
        .with_keyset(Keyset {
            subscribe_key: "sub-key",
            publish_key: Some("pub-key"),
            secret_key,
        })
        .with_user_id("user-id")
}

pub(crate) fn client(transport: RecordingTransport) -> PubNubGenericClient<RecordingTransport> {
    builder(transport, None).build().unwrap()
}

/// Wait for the next envelope delivered into sink.
pub(crate) async fn next(receiver: &async_channel::Receiver<Vec<u8>>) -> serde_json::Value {
    let envelope = tokio::time::timeout(std::time::Duration::from_secs(5), receiver.recv())
        .await
        .expect("envelope should be delivered")
        .expect("sink should be open");

    serde_json::from_slice(&envelope).unwrap()
}
