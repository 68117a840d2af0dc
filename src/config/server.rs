use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::reading::DEFAULT_WORDS_PER_MINUTE;
use crate::unlock::DEFAULT_UNLOCK_THRESHOLD;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Progress percentage an item needs before the next item in its grouping unlocks.
    pub unlock_threshold: f64,
    /// Reading speed used for reading-time estimates.
    pub words_per_minute: u32,
}

impl ServerConfig {
    /// Loads a TOML config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.unlock_threshold) {
            return Err(Error::Config(format!(
                "unlock_threshold must be between 0 and 100, got {}",
                self.unlock_threshold
            )));
        }
        if self.words_per_minute == 0 {
            return Err(Error::Config(
                "words_per_minute must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("templo.db")
    }

    #[must_use]
    pub fn admin_token_path(&self) -> PathBuf {
        self.data_dir.join(".admin_token")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            unlock_threshold: DEFAULT_UNLOCK_THRESHOLD,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("templo.toml");
        std::fs::write(&path, "port = 9090\nunlock_threshold = 75.0\n").unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.unlock_threshold, 75.0);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.words_per_minute, DEFAULT_WORDS_PER_MINUTE);
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("templo.toml");
        std::fs::write(&path, "unlock_threshold = 120.0\n").unwrap();

        assert!(matches!(
            ServerConfig::from_file(&path),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("templo.toml");
        std::fs::write(&path, "admin_email = \"root@example.com\"\n").unwrap();

        assert!(ServerConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_db_path() {
        let config = ServerConfig::default();
        assert_eq!(config.db_path(), PathBuf::from("./data/templo.db"));
    }
}
