//! Local torrent metadata handling: reading total size and a magnet link out
//! of a `.torrent` file, and converting a magnet URI into one by running the
//! external `ih2torrent` tool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use librqbit::{ByteBuf, torrent_from_bytes};
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, SeedrError};

/// What the submission pre-check needs from a torrent file.
#[derive(Debug, Clone)]
pub struct TorrentSummary {
    pub name: Option<String>,
    pub total_size: u64,
    pub magnet_uri: String,
}

/// The conversion tool binary for this platform, unless config overrides it.
pub fn default_magnet_tool() -> &'static str {
    if cfg!(windows) {
        "ih2torrent.exe"
    } else {
        "ih2torrent"
    }
}

/// Read a `.torrent` file and summarize it for the drive-size pre-check.
pub fn read_torrent_file(path: &Path) -> Result<TorrentSummary> {
    let bytes = std::fs::read(path)?;
    summarize(&bytes)
}

fn summarize(bytes: &[u8]) -> Result<TorrentSummary> {
    let meta = torrent_from_bytes::<ByteBuf>(bytes).map_err(|err| SeedrError::TorrentMetadata {
        reason: err.to_string(),
    })?;
    let info = &meta.info;

    // Single-file torrents carry `length`; multi-file torrents a `files` list.
    let total_size: u64 = if let Some(files) = &info.files {
        files.iter().map(|file| file.length).sum()
    } else {
        info.length.unwrap_or(0)
    };

    let name = info
        .name
        .as_ref()
        .map(|name| String::from_utf8_lossy(name.0).into_owned());
    let magnet_uri = format!("magnet:?xt=urn:btih:{}", meta.info_hash.as_string());

    Ok(TorrentSummary {
        name,
        total_size,
        magnet_uri,
    })
}

/// Convert a magnet URI into a `.torrent` file in the system temp directory.
///
/// The tool resolves the magnet against the torrent network, so magnets with
/// few peers or no active seeders may never produce metadata; the timeout
/// kills the child rather than hanging the session.
pub async fn magnet_to_torrent(magnet: &str, tool: &str, timeout: Duration) -> Result<PathBuf> {
    let output_path = std::env::temp_dir().join(format!("seedr-{}.torrent", Uuid::new_v4()));

    let mut command = Command::new(tool);
    command
        .arg("--file")
        .arg(&output_path)
        .arg(magnet)
        .kill_on_drop(true);

    debug!(%magnet, tool, "converting magnet to torrent file");

    match tokio::time::timeout(timeout, command.status()).await {
        Err(_) => Err(SeedrError::MagnetConversion {
            reason: format!(
                "{} did not resolve the magnet within {}s",
                tool,
                timeout.as_secs()
            ),
        }),
        Ok(Err(err)) => Err(SeedrError::MagnetConversion {
            reason: format!("could not run {}: {}", tool, err),
        }),
        Ok(Ok(status)) if !status.success() => Err(SeedrError::MagnetConversion {
            reason: format!("{} exited with {}", tool, status),
        }),
        Ok(Ok(_)) if !output_path.exists() => Err(SeedrError::MagnetConversion {
            reason: format!("{} exited cleanly but produced no torrent file", tool),
        }),
        Ok(Ok(_)) => Ok(output_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn single_file_torrent(length: u64) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"d4:infod");
        bytes.extend_from_slice(format!("6:lengthi{}e", length).as_bytes());
        bytes.extend_from_slice(b"4:name8:test.bin");
        bytes.extend_from_slice(b"12:piece lengthi16384e");
        bytes.extend_from_slice(b"6:pieces20:aaaaaaaaaaaaaaaaaaaa");
        bytes.extend_from_slice(b"ee");
        bytes
    }

    fn multi_file_torrent(lengths: &[u64]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"d4:infod5:filesl");
        for (index, length) in lengths.iter().enumerate() {
            bytes.extend_from_slice(
                format!("d6:lengthi{}e4:pathl1:{}ee", length, (b'a' + index as u8) as char)
                    .as_bytes(),
            );
        }
        bytes.extend_from_slice(b"e4:name4:pack");
        bytes.extend_from_slice(b"12:piece lengthi16384e");
        bytes.extend_from_slice(b"6:pieces20:aaaaaaaaaaaaaaaaaaaa");
        bytes.extend_from_slice(b"ee");
        bytes
    }

    #[test]
    fn test_single_file_size_and_magnet() {
        let summary = summarize(&single_file_torrent(2048)).unwrap();
        assert_eq!(summary.total_size, 2048);
        assert_eq!(summary.name.as_deref(), Some("test.bin"));
        assert!(summary.magnet_uri.starts_with("magnet:?xt=urn:btih:"));
        // btih is a 40-char hex info hash
        assert_eq!(summary.magnet_uri.len(), "magnet:?xt=urn:btih:".len() + 40);
    }

    #[test]
    fn test_multi_file_sizes_are_summed() {
        let summary = summarize(&multi_file_torrent(&[100, 200, 300])).unwrap();
        assert_eq!(summary.total_size, 600);
        assert_eq!(summary.name.as_deref(), Some("pack"));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let result = summarize(b"this is not bencode");
        assert!(matches!(
            result,
            Err(SeedrError::TorrentMetadata { .. })
        ));
    }

    #[test]
    fn test_read_torrent_file_from_disk() {
        let mut file = tempfile::NamedTempFile::with_suffix(".torrent").unwrap();
        file.write_all(&single_file_torrent(4096)).unwrap();

        let summary = read_torrent_file(file.path()).unwrap();
        assert_eq!(summary.total_size, 4096);
    }

    #[tokio::test]
    async fn test_missing_tool_reports_conversion_failure() {
        let result = magnet_to_torrent(
            "magnet:?xt=urn:btih:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "definitely-not-a-real-binary",
            Duration::from_secs(5),
        )
        .await;

        assert!(matches!(result, Err(SeedrError::MagnetConversion { .. })));
    }
}
