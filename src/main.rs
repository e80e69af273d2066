mod cli;
mod handlers;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use seedr_client::ConfigManager;
use std::path::PathBuf;
use std::process;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Validate CLI arguments first
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    // Initialize logging based on verbosity
    if args.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .init();
    }

    let config_manager = match &args.config {
        Some(dir) => ConfigManager::with_dir(PathBuf::from(dir))?,
        None => ConfigManager::new()?,
    };

    if let Err(e) = config_manager.validate() {
        eprintln!("Configuration validation failed: {}", e);
        eprintln!(
            "Edit {} and try again",
            config_manager.config_file().display()
        );
        process::exit(1);
    }

    // Handle commands
    match args.command {
        Commands::Drive => handlers::handle_drive(&config_manager).await?,
        Commands::Folder { id } => handlers::handle_folder(&config_manager, id).await?,
        Commands::Add {
            source,
            wishlist,
            folder,
        } => handlers::handle_add(&config_manager, source, wishlist, folder).await?,
        Commands::Download {
            folder_id,
            list_only,
            direct,
        } => handlers::handle_download(&config_manager, folder_id, list_only, direct).await?,
        Commands::Delete { kind, id } => {
            handlers::handle_delete(&config_manager, kind, id).await?
        }
        Commands::Wipe { yes } => handlers::handle_wipe(&config_manager, yes).await?,
        Commands::Config { action } => handlers::handle_config(&config_manager, action).await?,
    }

    Ok(())
}
