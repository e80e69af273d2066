//! The drive session handler: one authenticated session against the Seedr
//! service, exposing folder/file/torrent operations and the bulk download
//! routine.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::daemon::DaemonClient;
use crate::error::{Resource, Result, SeedrError};
use crate::time::{Sleeper, TokioSleeper};
use crate::torrent;
use crate::types::{
    AddTorrentResponse, AddedTorrent, DeleteEntry, Drive, DriveSpace, DownloadItem,
    FetchFileResponse, FileLink, FolderListing, FolderResponse, OpResponse, TokenResponse,
    is_truthy,
};

/// The client id the service hands to its own browser extension; the password
/// grant is only accepted for known client ids.
const CLIENT_ID: &str = "seedr_chrome";

static MAGNET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"magnet:\?xt=urn:[a-z0-9]+:[a-zA-Z0-9]{32}").expect("magnet pattern compiles")
});
static TORRENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.torrent$").expect("torrent pattern compiles"));

/// What to submit for remote download: a torrent file path or magnet URI, or
/// a wishlist id, plus the destination folder.
#[derive(Debug, Clone)]
pub struct AddTorrentRequest {
    pub torrent: Option<String>,
    pub wishlist_id: Option<u64>,
    /// Destination folder id; `-1` targets the drive root.
    pub folder_id: i64,
}

impl Default for AddTorrentRequest {
    fn default() -> Self {
        Self {
            torrent: None,
            wishlist_id: None,
            folder_id: -1,
        }
    }
}

impl AddTorrentRequest {
    /// Submit a `.torrent` file path or a magnet URI.
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            torrent: Some(source.into()),
            ..Self::default()
        }
    }

    /// Submit an entry from the account's wishlist.
    pub fn from_wishlist(wishlist_id: u64) -> Self {
        Self {
            wishlist_id: Some(wishlist_id),
            ..Self::default()
        }
    }

    /// Download into a specific folder instead of the drive root.
    pub fn into_folder(mut self, folder_id: i64) -> Self {
        self.folder_id = folder_id;
        self
    }
}

/// One authenticated session. Not `Clone` and not meant for concurrent
/// callers; every remote call blocks the session until it answers.
pub struct SeedrSession {
    client: Client,
    config: SessionConfig,
    access_token: String,
    drive_size: u64,
    excluded_extensions: HashSet<String>,
    daemon: Option<DaemonClient>,
    sleeper: Arc<dyn Sleeper>,
}

impl SeedrSession {
    /// Authenticate and open a session.
    ///
    /// Construction finishes with a drive fetch so the torrent-size pre-check
    /// in [`SeedrSession::add_torrent`] always has a capacity to compare
    /// against.
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        Self::connect_with_sleeper(config, Arc::new(TokioSleeper)).await
    }

    /// Like [`SeedrSession::connect`] with an explicit sleeper, so tests can
    /// drive the throttle and poll loops without real waiting.
    pub async fn connect_with_sleeper(
        config: SessionConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("seedr-client/0.1.0")
            .build()?;

        let access_token = authenticate(&client, &config).await?;
        let excluded_extensions = config
            .transfers
            .excluded_extensions
            .iter()
            .cloned()
            .collect();

        let mut session = Self {
            client,
            config,
            access_token,
            drive_size: 0,
            excluded_extensions,
            daemon: None,
            sleeper,
        };
        session.get_drive().await?;
        session.throttle().await;
        Ok(session)
    }

    /// The access token the session operates with.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Drive capacity in bytes as of the most recent drive fetch.
    pub fn drive_size(&self) -> u64 {
        self.drive_size
    }

    /// Fetch root-level drive state: space, active torrents, top-level
    /// folders and files. Refreshes the session's known drive size.
    pub async fn get_drive(&mut self) -> Result<Drive> {
        let text = self
            .client
            .get(self.folder_url(None))
            .send()
            .await?
            .text()
            .await?;
        if contains_bad_token(&text) {
            return Err(SeedrError::InvalidOrExpiredToken);
        }

        let response: FolderResponse = serde_json::from_str(&text)?;
        self.drive_size = response.space_max;
        debug!(
            total = response.space_max,
            used = response.space_used,
            "drive fetched"
        );

        Ok(Drive {
            space: DriveSpace {
                total: response.space_max,
                used: response.space_used,
            },
            parent_folder_id: (response.parent == -1).then_some(response.folder_id),
            torrents: response.torrents(),
            folders: response.folder_summaries(),
            files: response.file_summaries(),
        })
    }

    /// Fetch one folder's children by id.
    pub async fn get_folder(&self, folder_id: u64) -> Result<FolderListing> {
        let text = self
            .client
            .get(self.folder_url(Some(folder_id)))
            .send()
            .await?
            .text()
            .await?;
        check_response(&text, Resource::Folder)?;

        let response: FolderResponse = serde_json::from_str(&text)?;
        // Guard against a misbehaving or stale backend answering for a
        // different folder.
        if response.folder_id != folder_id {
            warn!(
                requested = folder_id,
                received = response.folder_id,
                "folder id mismatch"
            );
            return Err(SeedrError::FolderMismatch {
                requested: folder_id,
                received: response.folder_id,
            });
        }

        Ok(FolderListing {
            folder_id,
            name: response.fullname.clone(),
            folders: response.folder_summaries(),
            files: response.file_summaries(),
        })
    }

    /// Resolve a file id to its name and direct download URL.
    pub async fn get_file(&self, folder_file_id: u64) -> Result<FileLink> {
        let id = folder_file_id.to_string();
        let form = [
            ("access_token", self.access_token.as_str()),
            ("func", "fetch_file"),
            ("folder_file_id", id.as_str()),
        ];
        let text = self
            .client
            .post(self.resource_url())
            .form(&form)
            .send()
            .await?
            .text()
            .await?;
        check_response(&text, Resource::File)?;

        let response: FetchFileResponse = serde_json::from_str(&text)?;
        Ok(FileLink {
            name: response.name,
            download_url: response.url,
        })
    }

    /// Submit a torrent, magnet or wishlist entry for remote download.
    ///
    /// Torrent files and magnets are sized up locally first and rejected with
    /// [`SeedrError::DriveLimitExceeded`] before any submission call when they
    /// cannot fit the drive. Magnets are converted to a torrent file by the
    /// external tool because sizing needs full metadata; magnets with few
    /// peers or no active seeders can fail that conversion even though the
    /// service itself might have accepted them.
    pub async fn add_torrent(&mut self, request: AddTorrentRequest) -> Result<AddedTorrent> {
        let magnet_uri = match (&request.torrent, request.wishlist_id) {
            (Some(_), Some(_)) | (None, None) => return Err(SeedrError::MissingArgument),
            (Some(source), None) => Some(self.resolve_torrent_source(source).await?),
            (None, Some(_)) => None,
        };

        let folder_id = request.folder_id.to_string();
        let mut form = vec![
            ("access_token", self.access_token.clone()),
            ("func", "add_torrent".to_string()),
            ("folder_id", folder_id),
        ];
        if let Some(magnet) = &magnet_uri {
            form.push(("torrent_magnet", magnet.clone()));
        }
        if let Some(wishlist_id) = request.wishlist_id {
            form.push(("wishlist_id", wishlist_id.to_string()));
        }

        let text = self
            .client
            .post(self.resource_url())
            .form(&form)
            .send()
            .await?
            .text()
            .await?;
        if contains_bad_token(&text) {
            return Err(SeedrError::InvalidOrExpiredToken);
        }

        let response: AddTorrentResponse = serde_json::from_str(&text)?;
        if !is_truthy(&response.result) {
            let payload = serde_json::json!({
                "func": "add_torrent",
                "torrent_magnet": magnet_uri,
                "wishlist_id": request.wishlist_id,
                "folder_id": request.folder_id,
            });
            return Err(SeedrError::SubmissionRejected {
                payload: payload.to_string(),
            });
        }

        let added = AddedTorrent {
            torrent_id: response.user_torrent_id.unwrap_or_default(),
            title: response.title.unwrap_or_default(),
        };
        info!(torrent_id = added.torrent_id, title = %added.title, "torrent accepted");
        Ok(added)
    }

    /// Classify a torrent source, obtain a local `.torrent` for it, and run
    /// the drive-size pre-check. Returns the magnet URI to submit.
    async fn resolve_torrent_source(&mut self, source: &str) -> Result<String> {
        let path = if TORRENT_RE.is_match(source) {
            PathBuf::from(source)
        } else if MAGNET_RE.is_match(source) {
            let tool = self
                .config
                .transfers
                .magnet_tool
                .clone()
                .unwrap_or_else(|| torrent::default_magnet_tool().to_string());
            let timeout = Duration::from_secs(self.config.transfers.magnet_timeout_secs);
            torrent::magnet_to_torrent(source, &tool, timeout).await?
        } else {
            return Err(SeedrError::InvalidTorrent {
                input: source.to_string(),
            });
        };

        let summary = torrent::read_torrent_file(&path)?;
        if summary.total_size > self.drive_size {
            return Err(SeedrError::DriveLimitExceeded {
                torrent_size: summary.total_size,
                drive_size: self.drive_size,
            });
        }
        Ok(summary.magnet_uri)
    }

    /// Collect every downloadable file under a folder, breadth first, and
    /// resolve each one's download URL.
    ///
    /// With `use_builtin_downloader` the resolved list is sorted ascending by
    /// size (quick wins first on a congested shared queue), handed to the
    /// download daemon in that order, and the call returns once the daemon
    /// reports every item complete. Without it the resolved list is returned
    /// for the caller to fetch.
    pub async fn download_folder(
        &mut self,
        folder_id: u64,
        use_builtin_downloader: bool,
    ) -> Result<Vec<DownloadItem>> {
        let root = self.get_folder(folder_id).await?;
        self.throttle().await;

        let mut files = root.files;
        let mut worklist: VecDeque<_> = root.folders.into();
        while let Some(folder) = worklist.pop_front() {
            let listing = self.get_folder(folder.folder_id).await?;
            self.throttle().await;
            worklist.extend(listing.folders);
            files.extend(listing.files);
        }
        debug!(count = files.len(), "traversal finished");

        let mut kept = Vec::new();
        for file in files {
            if excluded(&self.excluded_extensions, &file.name) {
                debug!(name = %file.name, "skipping excluded file");
                continue;
            }
            let directory =
                local_directory(&self.config.transfers.download_directory, &file.folder_path);
            kept.push((file, directory));
        }

        let mut resolved = Vec::with_capacity(kept.len());
        for (file, directory) in kept {
            let link = self.get_file(file.folder_file_id).await?;
            self.throttle().await;
            resolved.push(DownloadItem {
                folder_file_id: file.folder_file_id,
                name: file.name,
                size: file.size,
                directory,
                download_url: link.download_url,
            });
        }

        if !use_builtin_downloader {
            return Ok(resolved);
        }

        resolved.sort_by_key(|item| item.size);

        let daemon = self.daemon.get_or_insert_with(|| {
            DaemonClient::new(
                &self.config.daemon.host,
                self.config.daemon.port,
                self.config.daemon.secret.clone(),
            )
        });

        let mut pending = Vec::with_capacity(resolved.len());
        for (position, item) in resolved.iter().enumerate() {
            let gid = daemon.add_uri(&item.download_url, &item.directory, position).await?;
            pending.push(gid);
        }

        let poll_interval = Duration::from_secs(self.config.transfers.poll_interval_secs);
        loop {
            let mut still_pending = Vec::with_capacity(pending.len());
            for gid in pending {
                if !daemon.is_complete(&gid).await? {
                    still_pending.push(gid);
                }
            }
            pending = still_pending;
            if pending.is_empty() {
                break;
            }
            self.sleeper.sleep(poll_interval).await;
        }

        info!(count = resolved.len(), "download queue drained");
        Ok(resolved)
    }

    /// Delete a folder. Returns whether the service confirmed the operation.
    pub async fn delete_folder(&self, folder_id: u64) -> Result<bool> {
        self.delete_resource(Resource::Folder, folder_id).await
    }

    /// Delete a file.
    pub async fn delete_file(&self, folder_file_id: u64) -> Result<bool> {
        self.delete_resource(Resource::File, folder_file_id).await
    }

    /// Delete an active torrent.
    pub async fn delete_torrent(&self, torrent_id: u64) -> Result<bool> {
        self.delete_resource(Resource::Torrent, torrent_id).await
    }

    async fn delete_resource(&self, resource: Resource, id: u64) -> Result<bool> {
        let delete_arr = serde_json::to_string(&[DeleteEntry {
            kind: resource.as_str(),
            id,
        }])?;
        let form = [
            ("access_token", self.access_token.as_str()),
            ("func", "delete"),
            ("delete_arr", delete_arr.as_str()),
        ];
        let text = self
            .client
            .post(self.resource_url())
            .form(&form)
            .send()
            .await?
            .text()
            .await?;
        check_response(&text, resource)?;

        let response: OpResponse = serde_json::from_str(&text)?;
        Ok(is_truthy(&response.result))
    }

    /// Delete everything on the drive: folders, files, and active torrents.
    ///
    /// Succeeds only when a fresh drive fetch afterwards reports zero used
    /// bytes; the service's individual delete responses are not taken as
    /// proof of the final state.
    pub async fn delete_all(&mut self) -> Result<bool> {
        let drive = self.get_drive().await?;
        for folder in &drive.folders {
            self.delete_folder(folder.folder_id).await?;
            self.throttle().await;
        }
        for file in &drive.files {
            self.delete_file(file.folder_file_id).await?;
            self.throttle().await;
        }
        for torrent in &drive.torrents {
            self.delete_torrent(torrent.torrent_id).await?;
            self.throttle().await;
        }

        let drive = self.get_drive().await?;
        if drive.space.used != 0 {
            warn!(used = drive.space.used, "drive not empty after delete_all");
        }
        Ok(drive.space.used == 0)
    }

    fn folder_url(&self, folder_id: Option<u64>) -> String {
        let base = &self.config.service.folder_url;
        match folder_id {
            Some(id) => format!("{}/{}?access_token={}", base, id, self.access_token),
            None => format!("{}?access_token={}", base, self.access_token),
        }
    }

    fn resource_url(&self) -> String {
        format!("{}/resource.php", self.config.service.oauth_url)
    }

    async fn throttle(&self) {
        let delay = Duration::from_secs(self.config.transfers.rate_limit_secs);
        self.sleeper.sleep(delay).await;
    }
}

async fn authenticate(client: &Client, config: &SessionConfig) -> Result<String> {
    let auth = &config.auth;
    if let (Some(email), Some(password)) = (&auth.email, &auth.password) {
        let form = [
            ("grant_type", "password"),
            ("client_id", CLIENT_ID),
            ("type", "login"),
            ("username", email.as_str()),
            ("password", password.as_str()),
        ];
        let text = client
            .post(format!("{}/token.php", config.service.oauth_url))
            .form(&form)
            .send()
            .await?
            .text()
            .await?;

        let token: TokenResponse =
            serde_json::from_str(&text).unwrap_or(TokenResponse { access_token: None });
        match token.access_token {
            Some(token) => {
                info!("authenticated via password grant");
                Ok(token)
            }
            None => Err(SeedrError::InvalidCredentials),
        }
    } else if let Some(token) = &auth.access_token {
        // Lightweight probe: a root listing answers with the token markers
        // when the token is no longer usable.
        let text = client
            .get(format!(
                "{}?access_token={}",
                config.service.folder_url, token
            ))
            .send()
            .await?
            .text()
            .await?;
        if contains_bad_token(&text) {
            return Err(SeedrError::InvalidOrExpiredToken);
        }
        debug!("existing access token validated");
        Ok(token.clone())
    } else {
        Err(SeedrError::LoginRequired)
    }
}

fn contains_bad_token(text: &str) -> bool {
    ["invalid_token", "expired_token"]
        .iter()
        .any(|marker| text.contains(marker))
}

/// Map the service's in-band failure markers before attempting to decode.
fn check_response(text: &str, resource: Resource) -> Result<()> {
    if text.contains("access_denied") {
        return Err(SeedrError::NotFound { resource });
    }
    if contains_bad_token(text) {
        return Err(SeedrError::InvalidOrExpiredToken);
    }
    Ok(())
}

fn excluded(extensions: &HashSet<String>, name: &str) -> bool {
    let extension = name.rsplit('.').next().unwrap_or(name);
    extensions.contains(extension)
}

fn local_directory(base: &Path, folder_path: &str) -> PathBuf {
    let mut directory = base.to_path_buf();
    for part in folder_path.split('/').filter(|part| !part.is_empty()) {
        directory.push(part);
    }
    directory
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extension_set(extensions: &[&str]) -> HashSet<String> {
        extensions.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_exclusion_uses_the_final_extension() {
        let set = extension_set(&["jpg", "exe"]);
        assert!(excluded(&set, "poster.jpg"));
        assert!(excluded(&set, "setup.tar.exe"));
        assert!(!excluded(&set, "episode.mkv"));
        assert!(!excluded(&set, "no_extension"));
    }

    #[test]
    fn test_local_directory_joins_remote_path_segments() {
        let directory = local_directory(Path::new("/data"), "shows/archive/s01");
        assert_eq!(directory, PathBuf::from("/data/shows/archive/s01"));

        let directory = local_directory(Path::new("."), "");
        assert_eq!(directory, PathBuf::from("."));
    }

    #[test]
    fn test_source_patterns() {
        assert!(TORRENT_RE.is_match("/tmp/ubuntu.torrent"));
        assert!(!TORRENT_RE.is_match("/tmp/ubuntu.torrent.bak"));
        assert!(MAGNET_RE.is_match(
            "magnet:?xt=urn:btih:abcdefabcdefabcdefabcdefabcdefab&dn=something"
        ));
        assert!(!MAGNET_RE.is_match("https://example.com/file.iso"));
    }

    #[test]
    fn test_bad_token_markers() {
        assert!(contains_bad_token(r#"{"error":"invalid_token"}"#));
        assert!(contains_bad_token(r#"{"error":"expired_token"}"#));
        assert!(!contains_bad_token(r#"{"folders":[]}"#));
    }

    #[test]
    fn test_add_torrent_request_builders() {
        let request = AddTorrentRequest::from_source("x.torrent").into_folder(7);
        assert_eq!(request.torrent.as_deref(), Some("x.torrent"));
        assert_eq!(request.folder_id, 7);
        assert_eq!(request.wishlist_id, None);

        let request = AddTorrentRequest::from_wishlist(12);
        assert_eq!(request.wishlist_id, Some(12));
        assert_eq!(request.folder_id, -1);
    }
}
