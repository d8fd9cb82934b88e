/// Server factories: the relay accept loop and the liveness HTTP server.
/// Provides reusable constructors for use in both the main binary and tests.

use actix_web::{middleware, web, App, HttpServer};
use log::{error, info};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::handlers::{handle_connection, health};
use crate::registry::Registries;

/// Accept relay connections forever, spawning one handler task per
/// connection. The registries are the only state shared between tasks.
pub async fn run_relay(listener: TcpListener, registries: Registries) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New client connection from: {}", addr);
                let registries = registries.clone();
                tokio::spawn(async move {
                    handle_connection(stream, addr, registries).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Create the liveness HTTP server
///
/// Serves `GET /health` for supervision; it never touches the registries.
pub fn create_http_server(bind_addr: &str) -> std::io::Result<actix_web::dev::Server> {
    let server = HttpServer::new(|| {
        App::new()
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(health))
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}

/// Bind the relay on a random available port and run it in the background.
///
/// Convenience for tests that need a live listener without picking a port.
/// Returns the bound address clients can connect to.
pub async fn spawn_test_relay(registries: Registries) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(run_relay(listener, registries));
    Ok(addr)
}
