//! Streambridge gateway binary.
//!
//! Boot order matters: configuration first, then the Avro schema from the
//! registry (fatal if unavailable), then the router, then the listener.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use streambridge_server::{service, shutdown, BackendService, Config, SchemaRegistryClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    info!(config = %serde_json::to_string(&config)?, "configuration loaded");

    info!(
        schema_name = service::SCHEMA_NAME,
        "fetching avro schema from schema registry"
    );
    let registry = SchemaRegistryClient::new(&config.schema_registry_url);
    let schema = match registry.latest_schema(service::SCHEMA_NAME).await {
        Ok(schema) => schema,
        Err(err) => {
            error!(
                schema_name = service::SCHEMA_NAME,
                error = %err,
                "error receiving schema"
            );
            return Err(err.into());
        }
    };

    let router = BackendService::new(&config, schema).router();
    shutdown::serve(router, &config).await
}
