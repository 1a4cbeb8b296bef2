use clap::Parser;
use linetrack::{Application, Config, config::Args, telemetry};

/// Resolves with the name of the first termination signal received.
///
/// A handler that cannot be installed is logged and never fires, so the remaining one still
/// stops the server.
async fn termination() -> &'static str {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Ctrl+C handler unavailable: {e}");
            std::future::pending::<()>().await;
        }
        "Ctrl+C"
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {e}");
                std::future::pending::<()>().await;
            }
        }
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}

/// `--validate`: report what the loaded configuration would do without touching the database
fn report_valid(config: &Config) {
    println!("Configuration is valid.");
    println!("  listen:   {}", config.bind_address());
    println!(
        "  pool:     {}..{} connections",
        config.pool.min_connections, config.pool.max_connections
    );
    println!("  metrics:  {}", if config.enable_metrics { "on" } else { "off" });
    println!("  otlp:     {}", if config.enable_otel_export { "on" } else { "off" });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // sqlx and the OTLP exporter both open TLS connections
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("a rustls crypto provider is already installed"))?;

    let args = Args::parse();
    let config = Config::load(&args)?;

    if args.validate {
        report_valid(&config);
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export, config.log_format)?;
    tracing::debug!(config_file = %args.config, "Loaded configuration");

    let app = Application::new(config).await?;
    app.serve(async {
        let signal = termination().await;
        tracing::info!("Received {signal}, draining connections");
    })
    .await
}
