use anyhow::Result;
use console::style;
use seedr_client::ConfigManager;

use super::open_session;

pub async fn handle_drive(config_manager: &ConfigManager) -> Result<()> {
    let mut session = open_session(config_manager).await?;
    let drive = session.get_drive().await?;

    println!(
        "💾 {} used of {}",
        style(drive.space.used_display()).cyan(),
        style(drive.space.total_display()).cyan()
    );

    if !drive.torrents.is_empty() {
        println!("\nActive torrents:");
        for torrent in &drive.torrents {
            println!(
                "  {:>10}  {:>5.1}%  {}",
                torrent.torrent_id, torrent.progress, torrent.name
            );
        }
    }

    if !drive.folders.is_empty() {
        println!("\nFolders:");
        for folder in &drive.folders {
            println!(
                "  {:>10}  {:>10}  {}",
                folder.folder_id,
                folder.size_display(),
                folder.name
            );
        }
    }

    if !drive.files.is_empty() {
        println!("\nFiles:");
        for file in &drive.files {
            println!(
                "  {:>10}  {:>10}  {}",
                file.folder_file_id,
                file.size_display(),
                file.name
            );
        }
    }

    Ok(())
}
