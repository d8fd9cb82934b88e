/// MLS Relay Server - delivery service for MLS group messaging
///
/// Main server entry point. Handles:
/// - Command-line argument parsing
/// - Registry setup
/// - Relay listener and liveness endpoint startup
use anyhow::Context;
use tokio::net::TcpListener;

use mls_relay_server::config::Config;
use mls_relay_server::registry::Registries;
use mls_relay_server::server;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();

    let config = Config::from_args();

    log::info!("Starting MLS relay server");
    log::info!("Relay port: {}", config.port);
    log::info!("Health port: {}", config.health_port);

    config.write_pidfile().context("Failed to write PID file")?;
    if let Some(pidfile) = &config.pidfile {
        log::info!("PID file written to: {:?}", pidfile);
    }

    // The three registries are the only shared state; everything else is
    // per-connection.
    let registries = Registries::new();

    let relay_addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&relay_addr)
        .await
        .with_context(|| format!("Failed to bind relay listener on {}", relay_addr))?;
    log::info!("Relay listening on {}", relay_addr);
    tokio::spawn(server::run_relay(listener, registries));

    let health_addr = format!("{}:{}", config.host, config.health_port);
    log::info!("Health endpoint on http://{}/health", health_addr);
    let http_server = server::create_http_server(&health_addr)?;
    http_server.await.context("Liveness server failed")?;

    Ok(())
}
