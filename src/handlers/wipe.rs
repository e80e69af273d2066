use anyhow::Result;
use console::style;
use dialoguer::Confirm;
use seedr_client::ConfigManager;

use super::open_session;

pub async fn handle_wipe(config_manager: &ConfigManager, yes: bool) -> Result<()> {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Delete every folder, file and torrent on the drive?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted");
            return Ok(());
        }
    }

    let mut session = open_session(config_manager).await?;
    if session.delete_all().await? {
        println!("{} Drive wiped", style("✓").green());
        Ok(())
    } else {
        anyhow::bail!("Drive still reports used space after deleting everything")
    }
}
