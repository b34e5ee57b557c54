use adaptable_notify::Settings;
use adaptable_notify::cli::{Cli, Commands, commands};
use adaptable_notify::logging;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };
    logging::init_with_config(&settings.logging);

    match &cli.command {
        Commands::Init { force } => commands::init::run_init(*force),
        Commands::Config => commands::init::run_config(&settings),
        Commands::Translate(args) => commands::translate::run_translate(&settings, args),
        Commands::Watch(args) => commands::watch::run_watch(&settings, args).await,
    }
}
