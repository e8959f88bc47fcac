//! Process configuration.
//!
//! Every setting can come from the environment or from a command-line flag;
//! the flag wins. The TLS key material paths are excluded from any JSON dump
//! of the configuration.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

#[derive(Debug, Clone, Parser, Serialize)]
#[command(
    name = "streambridge",
    about = "Streaming gateway bridging the resource-changed log to HTTP clients"
)]
pub struct Config {
    /// Address the HTTP listener binds to.
    #[arg(long = "bind-address", env = "BIND_ADDRESS", default_value = "0.0.0.0:8080")]
    pub bind_address: String,

    /// TLS certificate (PEM). TLS is served when both certificate and key
    /// are configured.
    #[arg(long = "cert-file", env = "CERT_FILE")]
    #[serde(skip)]
    pub cert_file: Option<PathBuf>,

    /// TLS private key (PEM).
    #[arg(long = "key-file", env = "KEY_FILE")]
    #[serde(skip)]
    pub key_file: Option<PathBuf>,

    /// Kafka broker addresses, comma separated.
    #[arg(
        long = "kafka-broker-addr",
        env = "KAFKA_STREAMING_BROKER_ADDR",
        value_delimiter = ',',
        required = true
    )]
    pub kafka_broker_addr: Vec<String>,

    /// Base URL of the Avro schema registry.
    #[arg(long = "schema-registry-url", env = "SCHEMA_REGISTRY_URL", required = true)]
    pub schema_registry_url: String,
}
