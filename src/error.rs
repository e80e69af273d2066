//! Error types for Seedr session operations.

use thiserror::Error;

/// What kind of remote resource an operation was acting on.
///
/// Only used to make not-found errors readable; the service reports the same
/// `access_denied` marker for all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Folder,
    File,
    Torrent,
}

impl Resource {
    /// The resource tag the service expects in `delete_arr` entries.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Resource::Folder => "folder",
            Resource::File => "file",
            Resource::Torrent => "torrent",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary error type for all session operations.
///
/// Every failure is terminal: the session never retries on its own, so a
/// caller seeing `InvalidOrExpiredToken` must build a fresh session.
#[derive(Debug, Error)]
pub enum SeedrError {
    /// Password grant was rejected by the token endpoint.
    #[error("invalid email and password combination")]
    InvalidCredentials,

    /// The service flagged the access token as invalid or expired.
    #[error("invalid or expired access token")]
    InvalidOrExpiredToken,

    /// Neither credentials nor an access token were supplied.
    #[error("account login or access token is required")]
    LoginRequired,

    /// The service reported the resource as absent or inaccessible.
    #[error("{resource} not found in drive")]
    NotFound { resource: Resource },

    /// The service answered a folder request with a different folder id.
    #[error("requested folder {requested} but the service returned folder {received}")]
    FolderMismatch { requested: u64, received: u64 },

    /// The supplied string is neither a torrent file path nor a magnet URI.
    #[error("not a torrent file or magnet URI: {input}")]
    InvalidTorrent { input: String },

    /// The torrent's declared size exceeds the drive's capacity.
    #[error("torrent is {torrent_size} bytes but the drive holds {drive_size} bytes")]
    DriveLimitExceeded { torrent_size: u64, drive_size: u64 },

    /// `add_torrent` needs exactly one of a torrent source or a wishlist id.
    #[error("exactly one of a torrent/magnet or a wishlist id must be supplied")]
    MissingArgument,

    /// The service returned a falsy result for a submission.
    #[error("the service refused to leech the torrent (payload: {payload})")]
    SubmissionRejected { payload: String },

    /// Converting a magnet to a torrent file failed or timed out.
    #[error("magnet conversion failed: {reason}")]
    MagnetConversion { reason: String },

    /// Reading or interpreting a local torrent file failed.
    #[error("could not read torrent metadata: {reason}")]
    TorrentMetadata { reason: String },

    /// The download-queue daemon rejected or garbled an RPC call.
    #[error("download daemon error: {reason}")]
    Daemon { reason: String },

    /// The service answered with a body that does not decode as expected.
    #[error("unexpected response from the service: {0}")]
    Api(#[from] serde_json::Error),

    /// Transport-level failure talking to the service.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Local filesystem failure (temp torrent files, download directories).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias for session operation results.
pub type Result<T> = std::result::Result<T, SeedrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_names_the_resource() {
        let error = SeedrError::NotFound {
            resource: Resource::Folder,
        };
        assert_eq!(error.to_string(), "folder not found in drive");
    }

    #[test]
    fn test_mismatch_display_carries_both_ids() {
        let error = SeedrError::FolderMismatch {
            requested: 11,
            received: 42,
        };
        assert!(error.to_string().contains("11"));
        assert!(error.to_string().contains("42"));
    }
}
