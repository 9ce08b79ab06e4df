mod app;
mod cache;
mod commands;
mod config;
mod country;
mod error;
mod logging;
mod query;
mod render;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "countries")]
#[command(about = "Browse countries from REST Countries with an offline cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./countries.yaml or $XDG_CONFIG_HOME/countries/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Only use the local cache
  #[arg(long, global = true)]
  offline: bool,

  /// Log at debug level
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  action: app::Action,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Keep the guard alive so buffered log lines are flushed on exit
  let _log_guard = logging::init(&config.logging, args.verbose)?;

  app::run(config, args.offline, args.action).await
}
