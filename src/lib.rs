pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;
pub mod util;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};
pub use config::Config;
use state::SharedState;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    run_with_config(config).await
}

pub async fn run_with_config(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let _prometheus_handle = init_prometheus(&config)?;
    init_logging(&config)?;

    let cli = Cli::parse();
    execute_command(cli, config).await
}

fn init_prometheus(config: &Config) -> anyhow::Result<Option<metrics_exporter_prometheus::PrometheusHandle>> {
    if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder.install_recorder().context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Ok(Some(handle))
    } else {
        Ok(None)
    }
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",reqwest::retry=off,hyper_util=off");
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let use_json = config.observability.loki_enabled || std::env::var("LOG_FORMAT").unwrap_or_default() == "json";

    if use_json {
        let fmt_layer = tracing_subscriber::fmt::layer().json().flatten_event(true).with_current_span(true).with_span_list(false);

        if config.observability.loki_enabled {
            let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

            let (loki_layer, task) = tracing_loki::builder()
                .label("app", "meguru")?
                .extra_field("env", "production")?
                .extra_field("version", env!("CARGO_PKG_VERSION"))?
                .build_url(url)?;

            tokio::spawn(task);
            registry.with(fmt_layer).with(loki_layer).init();
            info!("Loki logging initialized at {}", config.observability.loki_url);
        } else {
            registry.with(fmt_layer).init();
        }
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer().pretty();
        registry.with(fmt_layer).init();
    }
    Ok(())
}

async fn execute_command(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command {
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(())
        }

        Some(Commands::Serve) => run_server(config).await,

        Some(Commands::Init) => {
            Config::create_default_if_missing()?;
            println!("Config file created. Edit config.toml and run again.");
            Ok(())
        }

        Some(Commands::Refresh { failure_threshold }) => cli::cmd_refresh_stale(&config, failure_threshold).await,

        Some(Commands::TaskStatus { limit }) => cli::cmd_task_status(&config, limit).await,
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("meguru v{} starting...", env!("CARGO_PKG_VERSION"));

    let shared = Arc::new(SharedState::new(config.clone()).await?);

    if !config.server.enabled {
        info!("server.enabled is false, nothing to run; exiting");
        return Ok(());
    }

    let port = config.server.port;
    let app = api::router(Arc::clone(&shared)).await;
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("web server listening on http://{}", addr);
        let make_service = app.into_make_service_with_connect_info::<std::net::SocketAddr>();
        if let Err(e) = axum::serve(listener, make_service).await {
            error!("web server error: {}", e);
        }
    });

    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => error!("error listening for shutdown: {}", e),
    }

    server_handle.abort();
    info!("meguru stopped");

    Ok(())
}
