use anyhow::{Context, Result};
use seedr_client::ConfigManager;

use crate::cli::ConfigAction;

pub async fn handle_config(config_manager: &ConfigManager, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let rendered = toml::to_string_pretty(config_manager.config())
                .context("Failed to render configuration")?;
            print!("{}", rendered);
        }
        ConfigAction::Path => {
            println!("{}", config_manager.config_file().display());
        }
    }
    Ok(())
}
