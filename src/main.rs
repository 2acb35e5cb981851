mod app;

use anyhow::{Context, Result};
use app::Cli;
use clap::Parser;
use learnsphere_review::config::Config;
use learnsphere_review::database::db;
use learnsphere_review::telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    telemetry::init_tracing(&config.logging);

    let conn = db::init_database(&config.database_path).with_context(|| {
        format!("opening database {}", config.database_path.display())
    })?;

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout().lock();
    app::run(cli.command, &config, conn, &mut input, &mut out)
}
