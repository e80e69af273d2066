use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use seedr_client::{ConfigManager, Fetcher, human_size};

use super::open_session;

pub async fn handle_download(
    config_manager: &ConfigManager,
    folder_id: u64,
    list_only: bool,
    direct: bool,
) -> Result<()> {
    let mut session = open_session(config_manager).await?;

    if list_only {
        let items = session.download_folder(folder_id, false).await?;
        for item in &items {
            println!(
                "{:>10}  {:>10}  {}  {}",
                item.folder_file_id,
                human_size(item.size),
                item.directory.display(),
                item.download_url
            );
        }
        println!("{} file(s) resolved", items.len());
        return Ok(());
    }

    if direct {
        let items = session.download_folder(folder_id, false).await?;
        let fetcher = Fetcher::new()?;

        for item in &items {
            let bar = ProgressBar::new(item.size);
            bar.set_style(ProgressStyle::with_template(
                "{msg:30!} {bar:40.cyan/blue} {bytes}/{total_bytes}",
            )?);
            bar.set_message(item.name.clone());

            fetcher
                .fetch(item, |downloaded, total| {
                    bar.set_length(total);
                    bar.set_position(downloaded);
                })
                .await?;
            bar.finish();
        }

        println!("{} Downloaded {} file(s)", style("✓").green(), items.len());
        return Ok(());
    }

    // Builtin path: the session enqueues everything with the aria2 daemon and
    // only returns once the queue drains.
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Waiting for the download queue to drain...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));

    let items = session.download_folder(folder_id, true).await?;

    spinner.finish_and_clear();
    println!(
        "{} Queue drained, {} file(s) downloaded",
        style("✓").green(),
        items.len()
    );

    Ok(())
}
