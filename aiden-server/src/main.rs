use std::{net::SocketAddr, sync::Arc, time::Duration};

use aiden_core::database::{PoolSettings, PostgresDatabase, Repositories};
use aiden_core::orchestration::WorkerPool;
use aiden_server::{Config, ServiceDeps, build_app_state, create_app};
use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const WORKER_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "aiden-server")]
#[command(
    about = "Consent-gated OSINT scans and phishing-awareness simulations"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_runtime_config(&cli.serve)?;

    if let Some(Command::Db(DbCommand::Migrate)) = cli.command {
        return run_db_migrate(&config).await;
    }

    run_server(config).await
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let mut config =
        Config::from_env().context("failed to load configuration")?;
    if let Some(port) = args.port {
        config.server_port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server_host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                |_| {
                    // Override via RUST_LOG.
                    "info,aiden::scan=info,tower_http=warn".into()
                },
            ),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(config)
}

async fn connect_database(config: &Config) -> anyhow::Result<PostgresDatabase> {
    let url = config.require_database_url()?;
    let database = PostgresDatabase::connect(url, PoolSettings::default())
        .await
        .context("failed to connect to PostgreSQL")?;
    database.migrate().await.context("database migration failed")?;
    Ok(database)
}

async fn run_db_migrate(config: &Config) -> anyhow::Result<()> {
    connect_database(config).await?;
    info!("Database migrations applied successfully");
    Ok(())
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let config = Arc::new(config);
    info!(?config, "configuration loaded");

    let database = connect_database(&config).await?;
    let deps =
        ServiceDeps::production(&config, Repositories::postgres(&database))?;
    let state = build_app_state(Arc::clone(&config), deps);

    let workers = WorkerPool::spawn(Arc::clone(&state.orchestrator));
    let orchestrator = Arc::clone(&state.orchestrator);
    let recovered = orchestrator
        .recover()
        .await
        .context("failed to recover unfinished scans")?;
    info!(
        requeued = recovered.requeued.len(),
        interrupted = recovered.interrupted.len(),
        "startup recovery complete"
    );

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("invalid SERVER_HOST/SERVER_PORT")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Starting Aiden server on {addr}");

    let router = create_app(state);
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    orchestrator.queue().close();
    workers.shutdown(WORKER_SHUTDOWN_GRACE).await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
    }
    info!("shutdown signal received");
}
