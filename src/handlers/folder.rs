use anyhow::Result;
use console::style;
use seedr_client::ConfigManager;

use super::open_session;

pub async fn handle_folder(config_manager: &ConfigManager, id: u64) -> Result<()> {
    let session = open_session(config_manager).await?;
    let listing = session.get_folder(id).await?;

    println!("📁 {}", style(&listing.name).bold());

    for folder in &listing.folders {
        println!(
            "  {:>10}  {:>10}  {}/",
            folder.folder_id,
            folder.size_display(),
            folder.name
        );
    }
    for file in &listing.files {
        println!(
            "  {:>10}  {:>10}  {}",
            file.folder_file_id,
            file.size_display(),
            file.name
        );
    }

    if listing.folders.is_empty() && listing.files.is_empty() {
        println!("  (empty)");
    }

    Ok(())
}
