//! Room chat daemon - Main binary

use clap::{Parser, Subcommand, ValueEnum};
use roomchatd_core::{Config, Environment, MotdManager, Router, Server};
use roomchatd_modules::register_default_modules;
use std::path::PathBuf;
use tracing::info;

/// Room chat daemon - a multi-room, line-oriented chat server
#[derive(Parser)]
#[command(name = "roomchatd")]
#[command(about = "A multi-room line-oriented chat server")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Environment, picks the default listen port
    #[arg(short, long, value_enum, default_value_t = EnvArg::Dev)]
    env: EnvArg,

    /// Test configuration and exit
    #[arg(long)]
    test_config: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EnvArg {
    Dev,
    Prod,
}

impl From<EnvArg> for Environment {
    fn from(arg: EnvArg) -> Self {
        match arg {
            EnvArg::Dev => Environment::Dev,
            EnvArg::Prod => Environment::Prod,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a default configuration file
    Config {
        /// Output file path
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
    /// Show server information
    Info,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    if let Some(command) = cli.command {
        match command {
            Commands::Config { output } => {
                generate_config(&output)?;
                return Ok(());
            }
            Commands::Info => {
                show_info();
                return Ok(());
            }
            Commands::Version => {
                show_version();
                return Ok(());
            }
        }
    }

    info!("Initializing environment...");
    let environment = Environment::from(cli.env);

    let config = if cli.config.exists() {
        info!("Loading configuration from {:?}", cli.config);
        Config::from_file(&cli.config)?
    } else {
        info!("Configuration file not found, using defaults");
        Config::default()
    };

    if cli.test_config {
        config.validate()?;
        info!("Configuration is valid");
        return Ok(());
    }

    config.validate()?;

    let motd = MotdManager::from_config(&config.server)?;
    info!("MOTD ready ({} lines)", motd.line_count());
    let mut router = Router::new();
    register_default_modules(&mut router, motd);

    let server = Server::new(config, router);
    info!(
        "Starting {} v{} in {:?} mode...",
        server.config().server.name,
        server.config().server.version,
        environment
    );
    server.start(environment).await?;

    Ok(())
}

/// Initialize logging
fn init_logging(level: &str) -> anyhow::Result<()> {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .init();

    Ok(())
}

/// Generate default configuration file
fn generate_config(output: &PathBuf) -> anyhow::Result<()> {
    let config = Config::default();
    config.to_file(output)?;
    println!("Generated default configuration file: {:?}", output);
    Ok(())
}

/// Show server information
fn show_info() {
    println!("Room Chat Daemon");
    println!("================");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Description: {}", env!("CARGO_PKG_DESCRIPTION"));
    println!("Repository: {}", env!("CARGO_PKG_REPOSITORY"));
    println!("License: {}", env!("CARGO_PKG_LICENSE"));
    println!();
    println!("Default ports:");
    println!("  - dev:  {}", Environment::Dev.default_port());
    println!("  - prod: {}", Environment::Prod.default_port());
    println!();
    println!("Commands:");
    for topic in roomchatd_modules::HelpModule::topics_reference() {
        println!("  {:<28}{}", topic.syntax, topic.description);
    }
}

/// Show version information
fn show_version() {
    println!("roomchatd {}", env!("CARGO_PKG_VERSION"));
}
