use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tagwatch::config::{Config, DEFAULT_CONFIG_PATH};
use tagwatch::feed::FeedBuilder;
use tagwatch::logging::{self, LogOptions};
use tagwatch::server::{self, FeedServer};

#[derive(Parser)]
#[command(name = "tagwatch")]
#[command(version, about = "RSS feed of container registry tag and digest changes")]
struct Cli {
    /// Path to the YAML configuration
    #[arg(short, long, env = "TAGWATCH_CONF", default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    /// Log as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the feed over HTTP, refreshing it periodically
    Serve,
    /// Build the feed once and print it to stdout
    Run,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(&LogOptions {
        json: cli.log_json,
        file: cli.log_file.clone(),
    })?;

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    match cli.command {
        Command::Serve => runtime.block_on(serve(config)),
        Command::Run => runtime.block_on(run_once(config)),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let builder = FeedBuilder::from_config(&config)?;
    let server = Arc::new(FeedServer::new(builder));
    server::run(server, &config.server)
        .await
        .with_context(|| format!("feed server on {} failed", config.server.listen_addr()))
}

async fn run_once(config: Config) -> anyhow::Result<()> {
    let builder = FeedBuilder::from_config(&config)?;
    let feed = builder.make_feed().await;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&feed)?;
    stdout.write_all(b"\n")?;
    Ok(())
}
