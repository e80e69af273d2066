//! Response types for the Seedr API and the models exposed to callers.
//!
//! The wire structs mirror the service's JSON verbatim; the public models are
//! what the session hands back. Listings keep the raw byte counts so callers
//! can sort and sum, with [`human_size`] for display.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

/// Convert a byte count to a human string: megabytes below 1024 MB, else
/// gigabytes, two decimals either way.
pub fn human_size(bytes: u64) -> String {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb >= 1024.0 {
        format!("{:.2} GB", mb / 1024.0)
    } else {
        format!("{:.2} MB", mb)
    }
}

/// Truthiness of the `result` field in resource-endpoint responses.
///
/// The service answers with `true`, `"success"`, or an id depending on the
/// operation, and `false`/`null` on refusal.
pub(crate) fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}

/// Total and used drive space in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveSpace {
    pub total: u64,
    pub used: u64,
}

impl DriveSpace {
    pub fn total_display(&self) -> String {
        human_size(self.total)
    }

    pub fn used_display(&self) -> String {
        human_size(self.used)
    }
}

/// A folder as it appears in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSummary {
    pub folder_id: u64,
    pub name: String,
    pub size: u64,
}

impl FolderSummary {
    pub fn size_display(&self) -> String {
        human_size(self.size)
    }
}

/// A file as it appears in a listing, with the path of the folder that
/// contains it. The download URL is not part of listings; resolve it with
/// `get_file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub folder_file_id: u64,
    pub name: String,
    pub size: u64,
    pub folder_path: String,
}

impl FileSummary {
    pub fn size_display(&self) -> String {
        human_size(self.size)
    }
}

/// An in-progress remote leech, distinct from already-downloaded files.
#[derive(Debug, Clone, PartialEq)]
pub struct Torrent {
    pub torrent_id: u64,
    pub name: String,
    pub progress: f64,
    pub progress_url: Option<String>,
}

/// Root-level drive state.
#[derive(Debug, Clone)]
pub struct Drive {
    pub space: DriveSpace,
    pub parent_folder_id: Option<u64>,
    pub torrents: Vec<Torrent>,
    pub folders: Vec<FolderSummary>,
    pub files: Vec<FileSummary>,
}

/// One folder's children.
#[derive(Debug, Clone)]
pub struct FolderListing {
    pub folder_id: u64,
    pub name: String,
    pub folders: Vec<FolderSummary>,
    pub files: Vec<FileSummary>,
}

/// A file id resolved to its name and direct download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLink {
    pub name: String,
    pub download_url: String,
}

/// Identity of a torrent accepted for remote download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedTorrent {
    pub torrent_id: u64,
    pub title: String,
}

/// One entry of the list built by `download_folder`: a file joined with its
/// resolved target directory and download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    pub folder_file_id: u64,
    pub name: String,
    pub size: u64,
    pub directory: PathBuf,
    pub download_url: String,
}

// ---- wire structs ----------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct WireFolder {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireFile {
    pub folder_file_id: u64,
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireTorrent {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_fraction")]
    pub progress: f64,
    #[serde(default)]
    pub progress_url: Option<String>,
}

/// Shape of both the root listing and per-folder listings. The root carries
/// the space fields and torrent list; subfolder responses omit them.
#[derive(Debug, Deserialize)]
pub(crate) struct FolderResponse {
    pub folder_id: u64,
    #[serde(default)]
    pub parent: i64,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub space_max: u64,
    #[serde(default)]
    pub space_used: u64,
    #[serde(default)]
    pub folders: Vec<WireFolder>,
    #[serde(default)]
    pub files: Vec<WireFile>,
    #[serde(default)]
    pub torrents: Vec<WireTorrent>,
}

impl FolderResponse {
    pub(crate) fn folder_summaries(&self) -> Vec<FolderSummary> {
        self.folders
            .iter()
            .map(|folder| FolderSummary {
                folder_id: folder.id,
                name: folder.name.clone(),
                size: folder.size,
            })
            .collect()
    }

    pub(crate) fn file_summaries(&self) -> Vec<FileSummary> {
        self.files
            .iter()
            .map(|file| FileSummary {
                folder_file_id: file.folder_file_id,
                name: file.name.clone(),
                size: file.size,
                folder_path: self.fullname.clone(),
            })
            .collect()
    }

    pub(crate) fn torrents(&self) -> Vec<Torrent> {
        self.torrents
            .iter()
            .map(|torrent| Torrent {
                torrent_id: torrent.id,
                name: torrent.name.clone(),
                progress: torrent.progress,
                progress_url: torrent.progress_url.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FetchFileResponse {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddTorrentResponse {
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default)]
    pub user_torrent_id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpResponse {
    #[serde(default)]
    pub result: serde_json::Value,
}

/// One element of the `delete_arr` payload.
#[derive(Debug, Serialize)]
pub(crate) struct DeleteEntry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: u64,
}

/// The service reports torrent progress either as a number or as a numeric
/// string; accept both.
fn lenient_fraction<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse::<f64>().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size_below_gigabyte_is_megabytes() {
        assert_eq!(human_size(0), "0.00 MB");
        assert_eq!(human_size(52_428_800), "50.00 MB");
        assert_eq!(human_size(1024 * 1024 * 1024 - 1), "1024.00 MB");
    }

    #[test]
    fn test_human_size_crosses_to_gigabytes_at_boundary() {
        // Exactly 1024 MB must already render as GB.
        assert_eq!(human_size(1024 * 1024 * 1024), "1.00 GB");
        assert_eq!(human_size(1_572_864_000), "1.46 GB");
    }

    #[test]
    fn test_truthiness_follows_the_service_conventions() {
        assert!(is_truthy(&serde_json::json!(true)));
        assert!(is_truthy(&serde_json::json!("success")));
        assert!(is_truthy(&serde_json::json!(7)));
        assert!(!is_truthy(&serde_json::json!(false)));
        assert!(!is_truthy(&serde_json::json!(null)));
        assert!(!is_truthy(&serde_json::json!("")));
        assert!(!is_truthy(&serde_json::json!(0)));
    }

    #[test]
    fn test_folder_response_projects_paths_onto_files() {
        let response: FolderResponse = serde_json::from_value(serde_json::json!({
            "folder_id": 9,
            "fullname": "shows/archive",
            "folders": [{"id": 10, "name": "inner", "size": 2048}],
            "files": [{"folder_file_id": 77, "name": "episode.mkv", "size": 1024}],
        }))
        .unwrap();

        let files = response.file_summaries();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].folder_path, "shows/archive");
        assert_eq!(files[0].size, 1024);

        let folders = response.folder_summaries();
        assert_eq!(folders[0].folder_id, 10);
    }

    #[test]
    fn test_torrent_progress_accepts_number_or_string() {
        let response: FolderResponse = serde_json::from_value(serde_json::json!({
            "folder_id": 0,
            "torrents": [
                {"id": 1, "name": "a", "progress": 42.5},
                {"id": 2, "name": "b", "progress": "99"},
            ],
        }))
        .unwrap();

        let torrents = response.torrents();
        assert_eq!(torrents[0].progress, 42.5);
        assert_eq!(torrents[1].progress, 99.0);
    }
}
