//! JSON Exporter HTTP server
//!
//! Starts an Axum web server that scrapes the configured JSON endpoints on
//! every collection and exposes the flattened values to Prometheus.

use clap::Parser;
use json_exporter::{
    cli::{Cli, Command, generate_config_template},
    error::AppError,
    exporter::Exporter,
    handlers::{self, AppState},
    telemetry,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command.take() {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                eprintln!("Configuration template written to {path}");
            }
            None => print!("{template}"),
        }
        return Ok(());
    }

    let config = cli.into_config()?;

    telemetry::init(&config.observability.log_level);

    tracing::info!(
        urls = config.scrape.urls.len(),
        namespace = %config.metrics.namespace,
        refresh_interval_seconds = config.scrape.refresh_interval_seconds,
        "Starting JSON exporter"
    );

    // Value labels are resolved here, before the listener accepts scrapes
    let exporter = Exporter::from_config(&config).await?;
    let state = AppState::new(Arc::new(exporter), &config.server.metrics_path);
    let app = handlers::app(state);

    let addr: SocketAddr = config.server.listen_address.parse().map_err(|e| {
        AppError::Config(format!(
            "Invalid listen address '{}': {}",
            config.server.listen_address, e
        ))
    })?;

    tracing::info!("Listening on {}", addr);
    tracing::info!(
        "Metrics available at http://{}{}",
        addr,
        config.server.metrics_path
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
