pub mod add;
pub mod config;
pub mod delete;
pub mod download;
pub mod drive;
pub mod folder;
pub mod wipe;

use anyhow::{Context, Result};
use dialoguer::Password;
use seedr_client::{ConfigManager, SeedrSession};

// Re-export all handlers
pub use add::handle_add;
pub use config::handle_config;
pub use delete::handle_delete;
pub use download::handle_download;
pub use drive::handle_drive;
pub use folder::handle_folder;
pub use wipe::handle_wipe;

/// Build an authenticated session from the config file and environment,
/// prompting for the password when only an email is configured.
pub async fn open_session(manager: &ConfigManager) -> Result<SeedrSession> {
    let mut config = manager.config().clone();
    config.apply_env();

    if config.auth.access_token.is_none()
        && config.auth.email.is_some()
        && config.auth.password.is_none()
    {
        let password = Password::new().with_prompt("Seedr password").interact()?;
        config.auth.password = Some(password);
    }

    SeedrSession::connect(config)
        .await
        .context("Failed to open Seedr session")
}
