//! Composition of the backend service: one streaming route per topic.

use std::sync::Arc;

use apache_avro::Schema;
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use streambridge_consumer::{ConsumerRunner, ConsumerStarter};

use crate::config::Config;
use crate::handler::{self, StreamState};

/// Subject under which the registry holds the message schema.
pub const SCHEMA_NAME: &str = "resource-changed-data";

/// The streaming surface: each path is bound to exactly one topic.
pub const STREAM_ROUTES: [(&str, &str); 6] = [
    ("/filings", "stream-filing-history"),
    ("/companies", "stream-company-profile"),
    ("/insolvency-cases", "stream-company-insolvency"),
    ("/charges", "stream-company-charges"),
    ("/officers", "stream-company-officers"),
    ("/persons-with-significant-control", "stream-company-psc"),
];

/// Builds the router serving every stream plus the healthcheck.
pub struct BackendService {
    kafka_brokers: Vec<String>,
    schema: Schema,
}

impl BackendService {
    pub fn new(config: &Config, schema: Schema) -> Self {
        Self {
            kafka_brokers: config.kafka_broker_addr.clone(),
            schema,
        }
    }

    /// Bind every (path, topic) pair. Each route owns its runner, so
    /// connections on different topics never share consumer state.
    pub fn router(&self) -> Router {
        let mut router = Router::new().route("/healthcheck", get(handler::healthcheck));
        for (path, topic) in STREAM_ROUTES {
            let runner: Arc<dyn ConsumerStarter> = Arc::new(ConsumerRunner::new(
                self.kafka_brokers.clone(),
                topic,
                self.schema.clone(),
            ));
            router = router.route(
                path,
                get(handler::stream_changes).with_state(StreamState { runner }),
            );
        }
        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }
}
