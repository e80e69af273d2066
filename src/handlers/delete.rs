use anyhow::Result;
use console::style;
use seedr_client::ConfigManager;

use super::open_session;
use crate::cli::ResourceKind;

pub async fn handle_delete(
    config_manager: &ConfigManager,
    kind: ResourceKind,
    id: u64,
) -> Result<()> {
    let session = open_session(config_manager).await?;

    let deleted = match kind {
        ResourceKind::Folder => session.delete_folder(id).await?,
        ResourceKind::File => session.delete_file(id).await?,
        ResourceKind::Torrent => session.delete_torrent(id).await?,
    };

    if deleted {
        println!("{} Deleted {:?} {}", style("✓").green(), kind, id);
    } else {
        anyhow::bail!("The service did not confirm the deletion of {:?} {}", kind, id);
    }

    Ok(())
}
