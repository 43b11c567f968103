use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use catalog_assets::{AssetStore, Config, FtpsConnector, StoreContext};

/// Operator commands for the catalog image store.
#[derive(Debug, Parser)]
#[command(name = "catalog-assets", version, about)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Connect to the server and list the image directory.
    Check,
    /// Upload a local file (and its thumbnail, for images).
    Upload { local: PathBuf, remote: String },
    /// Download a remote file to a local path.
    Download { remote: String, local: PathBuf },
    /// Delete a remote file.
    Delete { remote: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load_with_env(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config.display());
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = catalog_assets::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        catalog_assets::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    let connector = match FtpsConnector::new(config.ftp.clone()) {
        Ok(connector) => connector,
        Err(e) => {
            error!(error = %e, "could not set up TLS");
            return ExitCode::FAILURE;
        }
    };
    let store = AssetStore::new(connector, config.assets.clone());
    let mut ctx = StoreContext::new();

    let ok = run(&store, &mut ctx, cli.command);
    ctx.release();

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(store: &AssetStore<FtpsConnector>, ctx: &mut StoreContext, command: Command) -> bool {
    match command {
        Command::Check => {
            let dir = store.config().image_base_dir.clone();
            match store.list(ctx, &dir) {
                Some(names) if names.is_empty() => {
                    println!("{dir} is empty");
                    true
                }
                Some(names) => {
                    for name in names {
                        println!("- {name}");
                    }
                    true
                }
                None => false,
            }
        }
        Command::Upload { local, remote } => {
            let bytes = match std::fs::read(&local) {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!(path = %local.display(), error = %e, "cannot read local file");
                    return false;
                }
            };
            let outcome = store.upload(ctx, &bytes, &remote);
            match outcome.original {
                Some(original) => {
                    println!("original:  {}", store.public_url(&original));
                    if let Some(thumbnail) = outcome.thumbnail {
                        println!("thumbnail: {}", store.public_url(&thumbnail));
                    }
                    true
                }
                None => false,
            }
        }
        Command::Download { remote, local } => match store.download(ctx, &remote) {
            Some(bytes) => match std::fs::write(&local, &bytes) {
                Ok(()) => {
                    info!(path = %local.display(), bytes = bytes.len(), "saved");
                    true
                }
                Err(e) => {
                    error!(path = %local.display(), error = %e, "cannot write local file");
                    false
                }
            },
            None => false,
        },
        Command::Delete { remote } => store.delete(ctx, &remote),
    }
}
