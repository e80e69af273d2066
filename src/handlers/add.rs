use anyhow::Result;
use console::style;
use seedr_client::{AddTorrentRequest, ConfigManager};

use super::open_session;

pub async fn handle_add(
    config_manager: &ConfigManager,
    source: Option<String>,
    wishlist: Option<u64>,
    folder: i64,
) -> Result<()> {
    let mut session = open_session(config_manager).await?;

    let request = match (source, wishlist) {
        (Some(source), None) => AddTorrentRequest::from_source(source),
        (None, Some(id)) => AddTorrentRequest::from_wishlist(id),
        // The CLI validator rejects the other combinations up front; let the
        // library report them if something slips through.
        (source, wishlist) => AddTorrentRequest {
            torrent: source,
            wishlist_id: wishlist,
            folder_id: folder,
        },
    }
    .into_folder(folder);

    let added = session.add_torrent(request).await?;
    println!(
        "{} Leeching '{}' (torrent id {})",
        style("✓").green(),
        added.title,
        added.torrent_id
    );

    Ok(())
}
