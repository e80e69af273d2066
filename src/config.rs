use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub transfers: TransfersConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

/// Credentials for the session: either email + password or a pre-existing
/// access token. Environment variables override the file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransfersConfig {
    /// Unconditional delay after each service call during traversal and bulk
    /// deletion, to stay under the API's abuse threshold.
    #[serde(default = "default_rate_limit_secs")]
    pub rate_limit_secs: u64,
    #[serde(default = "default_download_directory")]
    pub download_directory: PathBuf,
    /// File extensions never downloaded by `download_folder`.
    #[serde(default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,
    /// How long the magnet-to-torrent conversion tool may run before it is
    /// killed. Seederless magnets routinely hit this.
    #[serde(default = "default_magnet_timeout_secs")]
    pub magnet_timeout_secs: u64,
    /// Interval between completion polls while the daemon drains the queue.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Override for the magnet conversion tool binary.
    #[serde(default)]
    pub magnet_tool: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_daemon_host")]
    pub host: String,
    #[serde(default = "default_daemon_port")]
    pub port: u16,
    #[serde(default)]
    pub secret: Option<String>,
}

/// Service endpoints. Only tests should need to change these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_folder_url")]
    pub folder_url: String,
    #[serde(default = "default_oauth_url")]
    pub oauth_url: String,
}

// Default value functions
fn default_rate_limit_secs() -> u64 {
    1
}
fn default_download_directory() -> PathBuf {
    PathBuf::from(".")
}
fn default_excluded_extensions() -> Vec<String> {
    ["jpg", "png", "txt", "exe"]
        .into_iter()
        .map(str::to_string)
        .collect()
}
fn default_magnet_timeout_secs() -> u64 {
    60
}
fn default_poll_interval_secs() -> u64 {
    5
}
fn default_daemon_host() -> String {
    "http://localhost".to_string()
}
fn default_daemon_port() -> u16 {
    6800
}
fn default_folder_url() -> String {
    "https://www.seedr.cc/api/folder".to_string()
}
fn default_oauth_url() -> String {
    "https://www.seedr.cc/oauth_test".to_string()
}

impl Default for TransfersConfig {
    fn default() -> Self {
        Self {
            rate_limit_secs: default_rate_limit_secs(),
            download_directory: default_download_directory(),
            excluded_extensions: default_excluded_extensions(),
            magnet_timeout_secs: default_magnet_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            magnet_tool: None,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: default_daemon_host(),
            port: default_daemon_port(),
            secret: None,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            folder_url: default_folder_url(),
            oauth_url: default_oauth_url(),
        }
    }
}

impl SessionConfig {
    /// Overlay credentials from `SEEDR_EMAIL`, `SEEDR_PASSWORD` and
    /// `SEEDR_ACCESS_TOKEN` on top of whatever the file provided.
    pub fn apply_env(&mut self) {
        if let Ok(email) = std::env::var("SEEDR_EMAIL") {
            self.auth.email = Some(email);
        }
        if let Ok(password) = std::env::var("SEEDR_PASSWORD") {
            self.auth.password = Some(password);
        }
        if let Ok(token) = std::env::var("SEEDR_ACCESS_TOKEN") {
            self.auth.access_token = Some(token);
        }
    }
}

pub struct ConfigManager {
    config_dir: PathBuf,
    config_file: PathBuf,
    config: SessionConfig,
}

impl ConfigManager {
    /// Create a new ConfigManager and load existing config or create default
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("", "", "seedr").context("Failed to determine config directory")?;
        Self::with_dir(project_dirs.config_dir().to_path_buf())
    }

    /// Use an explicit config directory instead of the platform default.
    pub fn with_dir(config_dir: PathBuf) -> Result<Self> {
        let config_file = config_dir.join("config.toml");

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
        }

        let config = if config_file.exists() {
            Self::load_config(&config_file)?
        } else {
            let default_config = SessionConfig::default();
            Self::save_config(&config_file, &default_config)?;
            default_config
        };

        Ok(Self {
            config_dir,
            config_file,
            config,
        })
    }

    /// Get a reference to the current config
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get a mutable reference to the current config
    pub fn config_mut(&mut self) -> &mut SessionConfig {
        &mut self.config
    }

    /// Save the current config to disk
    pub fn save(&self) -> Result<()> {
        Self::save_config(&self.config_file, &self.config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the config file path
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Load config from file
    fn load_config(config_file: &Path) -> Result<SessionConfig> {
        let content = fs::read_to_string(config_file)
            .with_context(|| format!("Failed to read config file: {:?}", config_file))?;

        let config: SessionConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_file))?;

        Ok(config)
    }

    /// Save config to file
    fn save_config(config_file: &Path, config: &SessionConfig) -> Result<()> {
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(config_file, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_file))?;

        Ok(())
    }

    /// Validate the current configuration
    pub fn validate(&self) -> Result<()> {
        if self.config.transfers.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than 0");
        }

        if self.config.transfers.magnet_timeout_secs == 0 {
            anyhow::bail!("magnet_timeout_secs must be greater than 0");
        }

        if self.config.daemon.host.is_empty() {
            anyhow::bail!("daemon host cannot be empty");
        }

        if self.config.service.folder_url.is_empty() || self.config.service.oauth_url.is_empty() {
            anyhow::bail!("service URLs cannot be empty");
        }

        for extension in &self.config.transfers.excluded_extensions {
            if extension.starts_with('.') {
                anyhow::bail!(
                    "excluded extension '{}' must be given without the leading dot",
                    extension
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let config = SessionConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: SessionConfig = toml::from_str(&rendered).unwrap();

        assert_eq!(parsed.transfers.rate_limit_secs, 1);
        assert_eq!(parsed.transfers.poll_interval_secs, 5);
        assert_eq!(parsed.daemon.port, 6800);
        assert_eq!(
            parsed.transfers.excluded_extensions,
            vec!["jpg", "png", "txt", "exe"]
        );
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let parsed: SessionConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.service.folder_url, "https://www.seedr.cc/api/folder");
        assert_eq!(parsed.service.oauth_url, "https://www.seedr.cc/oauth_test");
        assert!(parsed.auth.email.is_none());
    }

    #[test]
    fn test_validate_rejects_dotted_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = ConfigManager::with_dir(dir.path().to_path_buf()).unwrap();
        manager.config_mut().transfers.excluded_extensions = vec![".jpg".to_string()];

        assert!(manager.validate().is_err());
    }
}
