use clap::Parser;
use tracing::debug;

use itax_cli::{Cli, Config, app, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging("info");

    let config = Config::load(cli.config.as_deref())?.apply(cli.overrides());
    logging::configure(&config.log_level, config.log_file.as_deref(), cli.quiet)?;
    debug!(?config, "resolved settings");

    let output = app::execute(&cli.command, &config).await?;
    print!("{output}");

    Ok(())
}
