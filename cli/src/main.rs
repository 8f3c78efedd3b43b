mod update;

use clap::{Parser, Subcommand};
use eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt,
    prelude::*,
};

use base::setting::{load, print, Settings};
use base::CLI_NAME;

#[derive(Parser)]
#[command(name = CLI_NAME, author, version, about, long_about = None)]
#[command(next_line_help = true)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Overrides the site root from the config
    #[arg(short, long, value_name = "DIR")]
    root: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch, reconcile and publish every release (default)
    Update,
    /// Fetch and reconcile, writing only the text dumps
    Fetch,
    /// Print the default configuration as TOML
    DefaultConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    color_eyre::install()?;
    let tracing_builder = tracing_subscriber::registry().with(fmt::layer());
    if std::env::var(base::DISCOG_LOGLEVEL).is_ok() {
        tracing_builder.with(EnvFilter::from_env(base::DISCOG_LOGLEVEL))
    } else {
        tracing_builder.with(EnvFilter::default().add_directive(LevelFilter::INFO.into()))
    }
    .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Update);
    if let Command::DefaultConfig = command {
        println!("{}", print(&Settings::default())?);
        return Ok(());
    }

    let mut settings = load(cli.config)?;
    if let Some(root) = cli.root {
        settings.site.root = root;
    }
    match command {
        Command::Fetch => update::update(&settings, false).await,
        _ => update::update(&settings, true).await,
    }
}
