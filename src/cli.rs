use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "seedr")]
#[command(about = "Manage a Seedr drive from the command line")]
#[command(long_about = "
seedr is a command-line client for the Seedr drive/leech service. It lists the
drive, submits torrents and magnets for remote download, and pulls finished
files down, either through a local aria2 daemon or directly.

Examples:
  seedr drive                        # Show space, torrents and root content
  seedr add ubuntu-24.04.torrent     # Leech a torrent into the drive root
  seedr add 'magnet:?xt=...' --folder 1234
  seedr download 1234                # Fetch a folder through the aria2 daemon
  seedr download 1234 --list-only    # Just print the resolved URLs
")]
#[command(version)]
pub struct Cli {
    /// Override config directory path
    #[arg(short, long, global = true, value_name = "DIR")]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show drive space, active torrents and root content
    #[command(visible_alias = "d")]
    Drive,

    /// List a folder's content
    #[command(visible_alias = "ls")]
    Folder {
        /// Folder id to list
        id: u64,
    },

    /// Submit a torrent, magnet or wishlist entry for remote download
    #[command(visible_alias = "a")]
    Add {
        /// Path to a .torrent file, or a magnet URI
        source: Option<String>,

        /// Submit a wishlist entry instead of a torrent
        #[arg(short, long, value_name = "ID")]
        wishlist: Option<u64>,

        /// Destination folder id (defaults to the drive root)
        #[arg(short, long, value_name = "ID", default_value = "-1")]
        folder: i64,
    },

    /// Download a folder's files recursively
    #[command(visible_alias = "dl")]
    Download {
        /// Folder id to download
        folder_id: u64,

        /// Resolve and print the download list without fetching anything
        #[arg(long)]
        list_only: bool,

        /// Fetch files in-process instead of through the aria2 daemon
        #[arg(long)]
        direct: bool,
    },

    /// Delete a folder, file or torrent
    #[command(visible_alias = "rm")]
    Delete {
        /// What to delete
        kind: ResourceKind,

        /// Id of the resource
        id: u64,
    },

    /// Delete everything on the drive
    Wipe {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage configuration
    #[command(visible_alias = "cfg")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Folder,
    File,
    Torrent,
}

// Helper functions for CLI validation and parsing
impl Cli {
    /// Validate CLI arguments and show helpful error messages
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Commands::Add {
                source, wishlist, ..
            } => {
                if source.is_none() && wishlist.is_none() {
                    return Err(
                        "Pass a torrent file, a magnet URI, or --wishlist <id>".to_string()
                    );
                }
                if source.is_some() && wishlist.is_some() {
                    return Err("Pass either a torrent/magnet or --wishlist, not both".to_string());
                }
            }
            Commands::Download {
                list_only, direct, ..
            } => {
                if *list_only && *direct {
                    return Err("--list-only and --direct are mutually exclusive".to_string());
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["seedr", "drive"]).unwrap();
        assert!(matches!(cli.command, Commands::Drive));

        let cli = Cli::try_parse_from(["seedr", "folder", "42"]).unwrap();
        assert!(matches!(cli.command, Commands::Folder { id: 42 }));
    }

    #[test]
    fn test_add_command_options() {
        let cli = Cli::try_parse_from(["seedr", "add", "x.torrent", "--folder", "9"]).unwrap();

        if let Commands::Add {
            source,
            wishlist,
            folder,
        } = cli.command
        {
            assert_eq!(source, Some("x.torrent".to_string()));
            assert_eq!(wishlist, None);
            assert_eq!(folder, 9);
        } else {
            panic!("Expected Add command");
        }
    }

    #[test]
    fn test_delete_kind_parsing() {
        let cli = Cli::try_parse_from(["seedr", "delete", "torrent", "7"]).unwrap();
        if let Commands::Delete { kind, id } = cli.command {
            assert_eq!(kind, ResourceKind::Torrent);
            assert_eq!(id, 7);
        } else {
            panic!("Expected Delete command");
        }
    }

    #[test]
    fn test_validation() {
        let cli = Cli::try_parse_from(["seedr", "add", "x.torrent"]).unwrap();
        assert!(cli.validate().is_ok());

        let cli = Cli::try_parse_from(["seedr", "add"]).unwrap();
        assert!(cli.validate().is_err());

        let cli = Cli::try_parse_from(["seedr", "add", "x.torrent", "--wishlist", "1"]).unwrap();
        assert!(cli.validate().is_err());

        let cli =
            Cli::try_parse_from(["seedr", "download", "1", "--list-only", "--direct"]).unwrap();
        assert!(cli.validate().is_err());
    }
}
