pub mod config;
pub mod daemon;
pub mod error;
pub mod fetch;
pub mod session;
pub mod time;
pub mod torrent;
pub mod types;

// Re-export commonly used types for easier access in tests
pub use config::{ConfigManager, SessionConfig};
pub use error::{Resource, SeedrError};
pub use fetch::Fetcher;
pub use session::{AddTorrentRequest, SeedrSession};
pub use time::{Sleeper, TokioSleeper};
pub use types::{
    AddedTorrent, DownloadItem, Drive, DriveSpace, FileLink, FileSummary, FolderListing,
    FolderSummary, Torrent, human_size,
};
