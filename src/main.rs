use clap::Parser;
use kurly_store::cli::Cli;
use kurly_store::logging;

fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (ignore errors if missing)
    dotenvy::dotenv().ok();

    let _log_guard = logging::init_from_env()?;

    let cli = Cli::parse();
    cli.run()
}
