mod common;

use common::{client, client_with, next, stays_empty, StubTransport};
use pubnub_longpoll::core::{ResponseSink, TrafficClass};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn limit_concurrent_requests_by_worker_count() {
    let transport = StubTransport::default();
    transport.delay_non_subscribe(Duration::from_millis(50));
    let client = client_with(transport.clone(), 50, 2);
    let (success, received) = ResponseSink::unbounded();
    let (error, errors) = ResponseSink::unbounded();

    for index in 0..5 {
        client
            .publish_message(json!({ "index": index }))
            .channel("demo")
            .execute(success.clone(), error.clone());
    }

    for _ in 0..5 {
        assert_eq!(next(&received).await, json!([1, "Sent", "16000000000000000"]));
    }
    assert!(stays_empty(&errors).await);
    assert_eq!(transport.requests_of(TrafficClass::NonSubscribe).len(), 5);
    assert!(transport.peak_in_flight() <= 2);
}

#[tokio::test]
async fn number_published_messages() {
    let transport = StubTransport::default();
    let client = client(transport.clone());
    let (success, received) = ResponseSink::unbounded();
    let (error, _errors) = ResponseSink::unbounded();

    for _ in 0..2 {
        client
            .publish_message("hello")
            .channel("demo")
            .execute(success.clone(), error.clone());
        next(&received).await;
    }

    let seqns = transport
        .requests_of(TrafficClass::NonSubscribe)
        .into_iter()
        .map(|request| request.query_parameters["seqn"].clone())
        .collect::<Vec<_>>();
    assert_eq!(seqns, vec!["1".to_string(), "2".to_string()]);
}

#[tokio::test]
async fn reject_requests_after_abort() {
    let transport = StubTransport::default();
    let client = client(transport.clone());
    let (success, received) = ResponseSink::unbounded();
    let (error, errors) = ResponseSink::unbounded();

    client.abort();
    client
        .publish_message("hello")
        .channel("demo")
        .execute(success.clone(), error.clone());
    client.time(success, error);

    assert_eq!(next(&errors).await, json!([0, "Client has been aborted", "demo"]));
    assert_eq!(next(&errors).await[1], "Client has been aborted");
    assert!(stays_empty(&received).await);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn forward_channel_group_responses() {
    let transport = StubTransport::default();
    let client = client(transport.clone());
    let (success, received) = ResponseSink::unbounded();
    let (error, _errors) = ResponseSink::unbounded();

    client.channel_group_add_channels("family", &["wife", "son"], success, error);

    assert_eq!(next(&received).await, json!({"status": 200, "message": "OK"}));
    let request = &transport.requests_of(TrafficClass::NonSubscribe)[0];
    assert_eq!(
        request.path,
        "/v1/channel-registration/sub-key/sub-key/channel-group/family"
    );
    assert_eq!(request.query_parameters["add"], "wife,son");
}
