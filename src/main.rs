use clap::Parser;
use tracing::info;

use docuhuman::cli::{process::run_process, whoami::run_whoami, Cli, Commands};
use docuhuman::{config::Config, utils::init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration, then let flags win over the environment
    let mut config = Config::from_env()?;
    cli.apply(&mut config);

    init_logger(&config.logging.filter);
    info!(endpoint = %config.endpoint.url, "Configuration loaded");

    match &cli.command {
        Commands::Process(args) => run_process(args, config).await,
        Commands::Whoami => run_whoami(&config),
    }
}
