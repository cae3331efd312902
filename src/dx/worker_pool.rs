//! # Non-subscribe worker pool
//!
//! Fixed number of workers which execute queued publish, access manager and
//! channel group requests. Each worker registers its own job channel in the
//! shared pool and a single dispatcher hands every queued job to the next
//! free worker, so no more than `max_workers` requests are in flight.

use crate::{
    core::{
        envelope::{body_details, error_envelope, error_envelope_with_details},
        error_response::service_error_message,
        PubNubError, ResponseSink, RuntimeSupport, Transport, TransportRequest,
        TransportResponse,
    },
    dx::publish::PublishResponseBody,
};
use async_channel::{Receiver, Sender};
use log::{debug, error, warn};
use serde_json::Value;
use spin::Once;
use std::sync::Arc;

/// How service response should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobKind {
    /// `[1, "Sent", "<timetoken>"]` on success.
    Publish,

    /// Successful body forwarded as is (access manager, channel groups,
    /// leave).
    Verbatim,
}

/// Queued non-subscribe request.
#[derive(Debug)]
pub(crate) struct NonSubscribeJob {
    /// Name of affected channel or channel group.
    pub target: String,
    pub request: TransportRequest,
    pub kind: JobKind,
    pub success: ResponseSink,
    pub error: ResponseSink,
}

impl NonSubscribeJob {
    /// Report failure without performing request.
    pub fn fail(&self, err: &PubNubError) {
        self.error
            .deliver(error_envelope(&err.envelope_message(), &self.target));
    }

    /// Route request outcome to caller sinks.
    pub fn complete(self, result: Result<TransportResponse, PubNubError>) {
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                error!("{} request for '{}' failed: {err}", self.request.class, self.target);
                self.fail(&err);
                return;
            }
        };

        let outcome = match self.kind {
            JobKind::Publish => interpret_publish(&response),
            JobKind::Verbatim => interpret_verbatim(&response),
        };

        match outcome {
            Ok(body) => {
                self.success.deliver(body);
            }
            Err((message, details)) => {
                self.error.deliver(match details {
                    Some(details) => error_envelope_with_details(&message, &details, &self.target),
                    None => error_envelope(&message, &self.target),
                });
            }
        }
    }
}

type JobOutcome = Result<Vec<u8>, (String, Option<Value>)>;

fn interpret_publish(response: &TransportResponse) -> JobOutcome {
    let body = response.body_bytes();

    if response.status != 200 {
        return Err((
            service_error_message(response.status, body),
            Some(body_details(body)),
        ));
    }

    match serde_json::from_slice::<PublishResponseBody>(body) {
        Ok(PublishResponseBody(1, _, _)) => Ok(body.to_vec()),
        Ok(PublishResponseBody(_, message, _)) => Err((message, Some(body_details(body)))),
        Err(_) => Err(("Unable to handle response".into(), Some(body_details(body)))),
    }
}

fn interpret_verbatim(response: &TransportResponse) -> JobOutcome {
    let body = response.body_bytes();

    if response.status == 200 {
        Ok(body.to_vec())
    } else {
        Err((
            service_error_message(response.status, body),
            Some(body_details(body)),
        ))
    }
}

/// Handle to running worker pool.
#[derive(Debug)]
pub(crate) struct NonSubscribeQueue {
    jobs: Sender<NonSubscribeJob>,
}

impl NonSubscribeQueue {
    fn start<T>(runtime: &RuntimeSupport, transport: Arc<T>, workers: usize) -> Self
    where
        T: Transport + 'static,
    {
        let (jobs, jobs_rx) = async_channel::unbounded();
        let (pool, pool_rx) = async_channel::bounded(workers);

        (0..workers).for_each(|id| runtime.spawn(worker(id, transport.clone(), pool.clone())));
        runtime.spawn(dispatcher(jobs_rx, pool_rx));
        debug!("Started {workers} non-subscribe workers");

        Self { jobs }
    }

    /// Add job to the queue.
    pub fn enqueue(&self, job: NonSubscribeJob) {
        if let Err(err) = self.jobs.try_send(job) {
            let job = err.into_inner();
            warn!("Non-subscribe queue closed, dropping request for '{}'", job.target);
            job.fail(&PubNubError::ClientAborted);
        }
    }

    fn shutdown(&self) {
        self.jobs.close();
    }
}

/// Lazily started worker pool.
///
/// Workers are spawned with the first job, so client can be created outside
/// of async runtime.
#[derive(Debug, Default)]
pub(crate) struct WorkerPool {
    queue: Once<NonSubscribeQueue>,
}

impl WorkerPool {
    /// Queue of running pool.
    pub fn start<T>(
        &self,
        runtime: &RuntimeSupport,
        transport: Arc<T>,
        workers: usize,
    ) -> &NonSubscribeQueue
    where
        T: Transport + 'static,
    {
        self.queue
            .call_once(|| NonSubscribeQueue::start(runtime, transport, workers))
    }

    /// Stop accepting jobs and release workers once queue drained.
    pub fn shutdown(&self) {
        if let Some(queue) = self.queue.get() {
            queue.shutdown();
        }
    }
}

async fn dispatcher(jobs: Receiver<NonSubscribeJob>, pool: Receiver<Sender<NonSubscribeJob>>) {
    while let Ok(job) = jobs.recv().await {
        let Ok(worker) = pool.recv().await else {
            job.fail(&PubNubError::ClientAborted);
            break;
        };

        if let Err(err) = worker.send(job).await {
            err.into_inner().fail(&PubNubError::ClientAborted);
        }
    }

    pool.close();
    while let Ok(worker) = pool.try_recv() {
        worker.close();
    }
    debug!("Non-subscribe dispatcher stopped");
}

async fn worker<T>(id: usize, transport: Arc<T>, pool: Sender<Sender<NonSubscribeJob>>)
where
    T: Transport,
{
    let (inbox, jobs) = async_channel::bounded(1);

    loop {
        if pool.send(inbox.clone()).await.is_err() {
            break;
        }

        let Ok(job) = jobs.recv().await else {
            break;
        };

        let response = transport.send(job.request.clone()).await;
        job.complete(response);
    }

    debug!("Non-subscribe worker {id} stopped");
}

#[cfg(all(test, feature = "tokio"))]
mod should {
    use super::*;
    use crate::{
        core::{Envelope, TrafficClass},
        providers::futures_tokio::RuntimeTokio,
    };
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };
    use test_case::test_case;

    #[derive(Default)]
    struct CountingTransport {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Transport for CountingTransport {
        async fn send(&self, _request: TransportRequest) -> Result<TransportResponse, PubNubError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            Ok(TransportResponse {
                status: 200,
                body: Some(br#"[1,"Sent","15"]"#.to_vec()),
            })
        }
    }

    fn job(kind: JobKind) -> (NonSubscribeJob, Receiver<Vec<u8>>, Receiver<Vec<u8>>) {
        let (success, success_rx) = ResponseSink::unbounded();
        let (error, error_rx) = ResponseSink::unbounded();
        (
            NonSubscribeJob {
                target: "ch1".into(),
                request: TransportRequest {
                    class: TrafficClass::NonSubscribe,
                    ..Default::default()
                },
                kind,
                success,
                error,
            },
            success_rx,
            error_rx,
        )
    }

    fn response(status: u16, body: &str) -> Result<TransportResponse, PubNubError> {
        Ok(TransportResponse {
            status,
            body: Some(body.as_bytes().to_vec()),
        })
    }

    #[tokio::test]
    async fn limit_concurrent_requests() {
        let transport = Arc::new(CountingTransport::default());
        let pool = WorkerPool::default();
        let queue = pool.start(&RuntimeSupport::new(RuntimeTokio), transport.clone(), 2);

        let receivers = (0..5)
            .map(|_| {
                let (job, success, _) = job(JobKind::Publish);
                queue.enqueue(job);
                success
            })
            .collect::<Vec<_>>();
        for receiver in receivers {
            receiver.recv().await.unwrap();
        }

        assert_eq!(transport.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fail_jobs_after_shutdown() {
        let pool = WorkerPool::default();
        let queue = pool.start(
            &RuntimeSupport::new(RuntimeTokio),
            Arc::new(CountingTransport::default()),
            1,
        );
        pool.shutdown();
        let (job, _, error) = job(JobKind::Verbatim);

        queue.enqueue(job);

        assert!(matches!(
            Envelope::parse(&error.recv().await.unwrap()).unwrap(),
            Envelope::Error { message, .. } if message == "Client has been aborted"
        ));
    }

    #[test]
    fn forward_sent_publish() {
        let (job, success, error) = job(JobKind::Publish);

        job.complete(response(200, r#"[1,"Sent","15"]"#));

        assert_eq!(success.try_recv().unwrap(), br#"[1,"Sent","15"]"#.to_vec());
        assert!(error.try_recv().is_err());
    }

    #[test_case(200, r#"[0,"Message Too Large","15"]"#, "Message Too Large" ; "rejected by service")]
    #[test_case(400, r#"[0,"Invalid Key","15"]"#, "Invalid Key" ; "non 200 status")]
    #[test_case(200, r#"{"a":1}"#, "Unable to handle response" ; "unknown shape")]
    fn report_failed_publish(status: u16, body: &str, expected: &str) {
        let (job, success, error) = job(JobKind::Publish);

        job.complete(response(status, body));

        assert!(success.try_recv().is_err());
        assert!(matches!(
            Envelope::parse(&error.try_recv().unwrap()).unwrap(),
            Envelope::Error { message, details: Some(_), name } if message == expected && name == "ch1"
        ));
    }

    #[test]
    fn forward_verbatim_body() {
        let (job, success, _) = job(JobKind::Verbatim);

        job.complete(response(200, r#"{"status":200,"payload":{}}"#));

        assert_eq!(
            success.try_recv().unwrap(),
            br#"{"status":200,"payload":{}}"#.to_vec()
        );
    }

    #[test]
    fn report_transport_error() {
        let (job, _, error) = job(JobKind::Verbatim);

        job.complete(Err(PubNubError::transport(
            crate::core::TransportErrorKind::Timeout,
            "operation timed out",
        )));

        assert!(matches!(
            Envelope::parse(&error.try_recv().unwrap()).unwrap(),
            Envelope::Error { message, details: None, .. } if message == "Request timeout"
        ));
    }
}
