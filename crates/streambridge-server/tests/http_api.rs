//! Tests of the HTTP surface, driven through the router in-process.
//!
//! A stub log client stands in for Kafka; everything else is the production
//! wiring, so these tests pin the status semantics: 400 before any consumer
//! work, 500 when the subscription fails, 200 followed by a chunked body of
//! envelopes otherwise.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::BodyExt;
use tokio::sync::mpsc;
use tower::ServiceExt;

use streambridge_consumer::runner::ClientFactory;
use streambridge_consumer::{
    ConsumerController, ConsumerError, ConsumerRunner, ConsumerStarter, DeliveryError, LogMessage,
    PartitionConsumer, StartConsumerError, Transform,
};
use streambridge_core::{BackendEvent, TransformError};
use streambridge_server::handler::{stream_changes, StreamState};

#[derive(Clone)]
struct EchoTransformer;

impl Transform for EchoTransformer {
    fn transform(&self, event: &BackendEvent) -> Result<String, TransformError> {
        Ok(String::from_utf8_lossy(&event.data).into_owned())
    }
}

struct StubClient {
    fail: bool,
    messages: Option<mpsc::UnboundedReceiver<LogMessage>>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl PartitionConsumer for StubClient {
    async fn consume_partition(&mut self, _partition: i32, _offset: i64) -> Result<(), ConsumerError> {
        if self.fail {
            Err(ConsumerError::Subscribe("no brokers".into()))
        } else {
            Ok(())
        }
    }

    fn messages(&mut self) -> mpsc::UnboundedReceiver<LogMessage> {
        self.messages.take().unwrap_or_else(|| {
            let (_, rx) = mpsc::unbounded_channel();
            rx
        })
    }

    fn errors(&mut self) -> mpsc::UnboundedReceiver<DeliveryError> {
        let (_, rx) = mpsc::unbounded_channel();
        rx
    }

    async fn close(&mut self) -> Result<(), ConsumerError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Counts `start_consumer` calls on the way into a real runner.
struct CountingStarter {
    inner: ConsumerRunner,
    starts: Arc<AtomicUsize>,
}

#[async_trait]
impl ConsumerStarter for CountingStarter {
    async fn start_consumer(&self, offset: i64) -> Result<ConsumerController, StartConsumerError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.inner.start_consumer(offset).await
    }
}

struct TestApp {
    router: Router,
    messages: mpsc::UnboundedSender<LogMessage>,
    starts: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

fn test_app(fail_subscribe: bool) -> TestApp {
    let (message_tx, message_rx) = mpsc::unbounded_channel();
    let messages = Mutex::new(Some(message_rx));
    let closes = Arc::new(AtomicUsize::new(0));
    let closes_for_factory = closes.clone();
    let clients: ClientFactory = Box::new(move || {
        Box::new(StubClient {
            fail: fail_subscribe,
            messages: messages.lock().unwrap().take(),
            closes: closes_for_factory.clone(),
        })
    });
    let starts = Arc::new(AtomicUsize::new(0));
    let runner = CountingStarter {
        inner: ConsumerRunner::with_clients(EchoTransformer, clients),
        starts: starts.clone(),
    };
    let router = Router::new().route(
        "/filings",
        get(stream_changes).with_state(StreamState {
            runner: Arc::new(runner),
        }),
    );
    TestApp {
        router,
        messages: message_tx,
        starts,
        closes,
    }
}

#[tokio::test]
async fn malformed_offset_is_rejected_before_any_consumer_work() {
    let app = test_app(false);

    let resp = app
        .router
        .oneshot(
            Request::builder()
                .uri("/filings?offset=q")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.starts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn subscribe_failure_yields_500_and_an_empty_body() {
    let app = test_app(true);

    let resp = app
        .router
        .oneshot(
            Request::builder()
                .uri("/filings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.starts.load(Ordering::SeqCst), 1);

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());
}

#[tokio::test]
async fn streams_envelopes_as_they_arrive() {
    let app = test_app(false);

    let resp = app
        .router
        .oneshot(
            Request::builder()
                .uri("/filings?offset=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);

    let mut body = resp.into_body().into_data_stream();

    app.messages
        .send(LogMessage {
            value: Bytes::from_static(b"{\"data\":\"one\",\"offset\":1}"),
            offset: 1,
        })
        .unwrap();
    let chunk = body.next().await.unwrap().unwrap();
    assert_eq!(chunk.as_ref(), b"{\"data\":\"one\",\"offset\":1}");

    app.messages
        .send(LogMessage {
            value: Bytes::from_static(b"{\"data\":\"two\",\"offset\":2}"),
            offset: 2,
        })
        .unwrap();
    let chunk = body.next().await.unwrap().unwrap();
    assert_eq!(chunk.as_ref(), b"{\"data\":\"two\",\"offset\":2}");
}

#[tokio::test]
async fn missing_offset_defaults_to_newest() {
    let app = test_app(false);

    let resp = app
        .router
        .oneshot(
            Request::builder()
                .uri("/filings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(app.starts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn client_disconnect_tears_the_consumer_down() {
    let app = test_app(false);

    let resp = app
        .router
        .oneshot(
            Request::builder()
                .uri("/filings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // The client goes away: the response body is dropped.
    drop(resp);

    // The worker observes the stop, closes its log client and exits.
    for _ in 0..50 {
        if app.closes.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(app.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn healthcheck_returns_200_with_an_empty_body() {
    let router = Router::new().route(
        "/healthcheck",
        get(streambridge_server::handler::healthcheck),
    );

    let resp = router
        .oneshot(
            Request::builder()
                .uri("/healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());
}
