/// Configuration management for the relay server.
/// Handles command-line argument parsing and config structure.
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "MLS Relay Server")]
#[command(about = "Delivery service relay for MLS group messaging", long_about = None)]
pub struct Config {
    /// Listen host (default: 127.0.0.1)
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Relay listener port (default: 8080)
    #[arg(long, default_value = "8080")]
    pub port: u16,

    /// HTTP liveness port (default: 8081)
    #[arg(long, default_value = "8081")]
    pub health_port: u16,

    /// PID file path (optional) - write server PID to this file on startup
    #[arg(long)]
    pub pidfile: Option<PathBuf>,
}

impl Config {
    /// Parse command-line arguments into Config
    pub fn from_args() -> Self {
        Config::parse()
    }

    /// Write the server PID to the configured pidfile, if one was given
    pub fn write_pidfile(&self) -> std::io::Result<()> {
        if let Some(pidfile) = &self.pidfile {
            fs::write(pidfile, process::id().to_string())?;
        }
        Ok(())
    }
}
