use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chartbridge::{Cli, Commands, Container, PromptRequest, RateLimitPolicy, Router};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "chartbridge=debug,tower_http=debug"
    } else {
        "chartbridge=info,tower_http=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let mut config = cli.container_config();
    if config.openai_api_key.is_none() && !config.mock_provider {
        error!("OPENAI_API_KEY is not set");
        bail!("Server configuration error: OpenAI API key is missing. Set OPENAI_API_KEY or pass --openai-api-key.");
    }

    match cli.command {
        Commands::Serve {
            port,
            public,
            allowed_origin,
            rate_limit_window_secs,
            rate_limit_max,
        } => {
            config.allowed_origin = allowed_origin;
            config.rate_limit =
                RateLimitPolicy::new(Duration::from_secs(rate_limit_window_secs), rate_limit_max);

            info!(
                "Starting chartbridge v{} (model {}, {} requests per {}s per client, origin {})",
                env!("CARGO_PKG_VERSION"),
                config.model,
                rate_limit_max,
                rate_limit_window_secs,
                config.allowed_origin
            );

            let container = Arc::new(Container::new(config)?);
            let host = if public { [0, 0, 0, 0] } else { [127, 0, 0, 1] };
            let addr = SocketAddr::from((host, port));
            let listener = tokio::net::TcpListener::bind(addr).await?;

            Router::serve(listener, container, shutdown_signal()).await?;
            info!("Server stopped");
        }

        Commands::Ask { prompt, fields } => {
            let container = Container::new(config)?;

            let mut request = PromptRequest::new(prompt);
            if let Some(fields) = fields {
                request = request.with_fields(fields);
            }

            let reply = container.generate_chart_use_case().execute(request).await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
