//! Takeoff CLI: stream an AI-generated construction estimate to the terminal.
//!
//! Usage:
//!   TAKEOFF_ACCESS_TOKEN=... takeoff <project description>
//!
//! The base URL defaults to http://localhost:3000/api and can be overridden
//! with TAKEOFF_API_BASE_URL. Ctrl+C cancels the active stream.

use std::sync::Arc;

use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use takeoff::config::Config;
use takeoff::error::StreamError;
use takeoff::models::EstimateRequest;
use takeoff::stream::{parse_action_items, EventKind, StreamingEstimateService};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let description = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if description.trim().is_empty() {
        eprintln!("usage: takeoff <project description>");
        std::process::exit(2);
    }

    let config = Config::from_env();
    let token = config.require_token()?.to_string();

    let service = Arc::new(StreamingEstimateService::with_base_url(
        config.api_base_url.clone(),
    ));

    service.on(EventKind::StreamStart, |_| {
        eprintln!("connected, generating estimate...");
    });
    service.on(EventKind::AiChunk, |event| {
        if let Some(text) = event.text() {
            for item in parse_action_items(text) {
                println!("  {} = {}", item.field, item.value);
            }
        }
    });
    service.on(EventKind::Error, |event| {
        let detail = event
            .text()
            .map(str::to_string)
            .or_else(|| event.data.as_ref().map(|d| d.to_string()))
            .unwrap_or_else(|| "unknown error".to_string());
        eprintln!("stream error: {}", detail);
    });
    service.on(EventKind::ParseError, |_| {
        eprintln!("skipped a malformed stream line");
    });

    // Ctrl+C aborts the stream; the service unwinds through the cancelled path.
    let canceller = Arc::clone(&service);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    let request = EstimateRequest::new(description).with_default_structure();
    match service.start_streaming(&request, &token).await {
        Ok(Some(project_id)) => {
            println!("project created: {}", project_id);
            Ok(())
        }
        Ok(None) => {
            println!("stream ended without a project id");
            Ok(())
        }
        Err(StreamError::Cancelled) => {
            eprintln!("cancelled");
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err.user_message());
            Err(err.into())
        }
    }
}
