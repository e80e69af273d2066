//! Direct sequential download of resolved items, for callers that skip the
//! download daemon.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tracing::debug;

use crate::error::Result;
use crate::types::DownloadItem;

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0")
            .build()?;
        Ok(Self { client })
    }

    /// Stream one item to `directory/name`, reporting `(downloaded, total)`
    /// after each chunk. Returns the path written.
    pub async fn fetch(
        &self,
        item: &DownloadItem,
        mut on_progress: impl FnMut(u64, u64),
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&item.directory)?;
        let output_path = item.directory.join(&item.name);

        let response = self
            .client
            .get(&item.download_url)
            .send()
            .await?
            .error_for_status()?;
        let total = response.content_length().unwrap_or(item.size);

        let mut file = File::create(&output_path)?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            on_progress(downloaded, total);
        }

        file.flush()?;
        debug!(path = %output_path.display(), downloaded, "file fetched");
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_writes_the_body_and_reports_progress() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/dl/episode.mkv");
            then.status(200).body(b"0123456789");
        });

        let dir = tempfile::tempdir().unwrap();
        let item = DownloadItem {
            folder_file_id: 1,
            name: "episode.mkv".to_string(),
            size: 10,
            directory: dir.path().join("shows"),
            download_url: server.url("/dl/episode.mkv"),
        };

        let fetcher = Fetcher::new().unwrap();
        let mut last_progress = (0, 0);
        let path = fetcher
            .fetch(&item, |downloaded, total| last_progress = (downloaded, total))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"0123456789");
        assert_eq!(last_progress, (10, 10));
    }

    #[tokio::test]
    async fn test_http_failure_propagates() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/dl/gone.mkv");
            then.status(404);
        });

        let dir = tempfile::tempdir().unwrap();
        let item = DownloadItem {
            folder_file_id: 2,
            name: "gone.mkv".to_string(),
            size: 0,
            directory: dir.path().to_path_buf(),
            download_url: server.url("/dl/gone.mkv"),
        };

        let fetcher = Fetcher::new().unwrap();
        let result = fetcher.fetch(&item, |_, _| {}).await;
        assert!(result.is_err());
    }
}
