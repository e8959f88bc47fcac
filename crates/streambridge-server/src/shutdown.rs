//! Serving and graceful shutdown.
//!
//! SIGINT and SIGTERM are handled here, at the top of the process; in-flight
//! connections are torn down through the HTTP server's own cancellation, so
//! no other component touches OS signals.

use std::net::SocketAddr;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tracing::info;

use crate::config::Config;

/// Serve `router` until a termination signal arrives.
///
/// TLS is used when the configuration carries both a certificate and a key;
/// plain TCP otherwise.
pub async fn serve(router: Router, config: &Config) -> anyhow::Result<()> {
    match (&config.cert_file, &config.key_file) {
        (Some(cert), Some(key)) => {
            let addr: SocketAddr = config.bind_address.parse()?;
            let tls = RustlsConfig::from_pem_file(cert, key).await?;
            let handle = axum_server::Handle::new();
            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                let signal = shutdown_signal().await;
                info!(signal, "shutting down");
                shutdown_handle.graceful_shutdown(None);
            });

            info!(address = %addr, "listening with TLS");
            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(router.into_make_service())
                .await?;
        }
        _ => {
            let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
            info!(address = %config.bind_address, "listening");
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let signal = shutdown_signal().await;
                    info!(signal, "shutting down");
                })
                .await?;
        }
    }
    Ok(())
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() -> &'static str {
    let interrupt = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        signal = interrupt => signal,
        signal = terminate => signal,
    }
}
