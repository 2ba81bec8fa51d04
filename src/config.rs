use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://your-readeck-url.com";
pub const DEFAULT_NOTES_FOLDER: &str = "Readeck";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "readeck", "readeck-sync")
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn default_vault_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("READECK_SYNC_VAULT") {
        return PathBuf::from(path);
    }
    current_dir()
}

pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("READECK_SYNC_CONFIG") {
        return PathBuf::from(path);
    }
    if let Some(dirs) = project_dirs() {
        return dirs.config_dir().join("config.toml");
    }
    current_dir().join(".readeck-sync.toml")
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub readeck: ReadeckConfig,
    pub vault: VaultConfig,
    pub sync: SyncConfig,
}

/// Connection settings for the Readeck instance.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReadeckConfig {
    pub api_url: String,
    pub api_token: String,
    pub timeout_seconds: u64,
}

impl Default for ReadeckConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: String::new(),
            timeout_seconds: 30,
        }
    }
}

impl ReadeckConfig {
    /// The configured token, or `READECK_API_TOKEN` when the field is blank.
    pub fn resolve_api_token(&self) -> String {
        if !self.api_token.trim().is_empty() {
            return self.api_token.trim().to_string();
        }
        std::env::var("READECK_API_TOKEN")
            .map(|token| token.trim().to_string())
            .unwrap_or_default()
    }

    pub fn masked_token(&self) -> String {
        let token = self.api_token.trim();
        if token.is_empty() {
            return "(unset)".to_string();
        }
        let skip = token.chars().count().saturating_sub(4);
        let visible: String = token.chars().skip(skip).collect();
        format!("****{visible}")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct VaultConfig {
    pub path: PathBuf,
    pub folder: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: default_vault_dir(),
            folder: DEFAULT_NOTES_FOLDER.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    pub workers: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::load_from_path(&config_path())
    }

    pub fn load_from_path(config_path: &Path) -> Self {
        let mut config = if let Ok(content) = fs::read_to_string(config_path) {
            match toml::from_str::<Config>(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %config_path.display(), error = %e, "failed to parse config, using defaults");
                    Config::default()
                }
            }
        } else {
            Config::default()
        };

        let changed = config.normalize();

        if (changed || !config_path.exists())
            && let Err(e) = config.save_to_path(config_path)
        {
            tracing::warn!(path = %config_path.display(), error = %e, "failed to write config");
        }

        config
    }

    pub fn save_to_path(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)
    }

    fn normalize(&mut self) -> bool {
        let mut changed = false;

        if self.vault.path.as_os_str().is_empty() {
            self.vault.path = default_vault_dir();
            changed = true;
        }

        if self.vault.path.is_relative() {
            self.vault.path = current_dir().join(&self.vault.path);
            changed = true;
        }

        let folder = self.vault.folder.trim().trim_matches('/').to_string();
        if folder != self.vault.folder {
            self.vault.folder = folder;
            changed = true;
        }

        if self.sync.workers == 0 {
            self.sync.workers = 1;
            changed = true;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path() -> PathBuf {
        let mut dir = std::env::temp_dir();
        let stamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        dir.push(format!("readeck-sync-config-{}-{}", std::process::id(), stamp));
        dir.join("config.toml")
    }

    #[test]
    fn missing_config_is_written_with_defaults() {
        let path = temp_config_path();
        let config = Config::load_from_path(&path);
        assert_eq!(config.readeck.api_url, DEFAULT_API_URL);
        assert_eq!(config.readeck.api_token, "");
        assert_eq!(config.vault.folder, DEFAULT_NOTES_FOLDER);
        assert!(path.exists());

        let reloaded = Config::load_from_path(&path);
        assert_eq!(reloaded, config);
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let path = temp_config_path();
        fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
        fs::write(
            &path,
            "[readeck]\napi_url = \"https://read.example\"\napi_token = \"secret\"\n\n[sync]\nworkers = 0\n",
        )
        .expect("write config");

        let config = Config::load_from_path(&path);
        assert_eq!(config.readeck.api_url, "https://read.example");
        assert_eq!(config.readeck.api_token, "secret");
        assert_eq!(config.readeck.timeout_seconds, 30);
        assert_eq!(config.sync.workers, 1);
        assert!(config.vault.path.is_absolute());
    }

    #[test]
    fn invalid_config_falls_back_to_defaults() {
        let path = temp_config_path();
        fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
        fs::write(&path, "[readeck\napi_url = ").expect("write config");

        let config = Config::load_from_path(&path);
        assert_eq!(config.readeck.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn folder_is_normalized() {
        let mut config = Config::default();
        config.vault.folder = " /Reading/Readeck/ ".to_string();
        assert!(config.normalize());
        assert_eq!(config.vault.folder, "Reading/Readeck");
    }

    #[test]
    fn masked_token_shows_last_characters() {
        let mut readeck = ReadeckConfig::default();
        assert_eq!(readeck.masked_token(), "(unset)");
        readeck.api_token = "abcdefgh".to_string();
        assert_eq!(readeck.masked_token(), "****efgh");
    }
}
