use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

use crate::error::GridError;

pub const CONFIG_FILE_NAME: &str = "steam-grid-ripper.json";
pub const USERDATA_ENV: &str = "STEAM_USERDATA";
pub const DEFAULT_CDN_BASE_URL: &str = "https://steamcdn-a.akamaihd.net";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub userdata: Option<PathBuf>,
    #[serde(default)]
    pub cdn_base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub account: Option<String>,
}

/// Everything the core needs to know about the machine, resolved once.
#[derive(Debug, Clone)]
pub struct Settings {
    pub schema_version: u32,
    pub userdata_base: PathBuf,
    pub cdn_base_url: String,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub account: Option<String>,
}

/// Values from the command line. They win over the file and the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub userdata: Option<PathBuf>,
    pub account: Option<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit `path` must exist; the default location is optional.
    pub fn resolve(path: Option<&str>, overrides: Overrides) -> Result<Settings, GridError> {
        let config = match path {
            Some(path) => Self::read(Path::new(path))?,
            None => match default_config_path() {
                Some(default) if default.exists() => Self::read(&default)?,
                _ => Config::default(),
            },
        };
        let env_userdata = std::env::var_os(USERDATA_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Ok(Self::resolve_config(config, env_userdata, overrides))
    }

    pub fn read(path: &Path) -> Result<Config, GridError> {
        let content =
            fs::read_to_string(path).map_err(|_| GridError::ConfigRead(path.to_path_buf()))?;
        serde_json::from_str(&content).map_err(|err| GridError::ConfigParse(err.to_string()))
    }

    pub fn resolve_config(
        config: Config,
        env_userdata: Option<PathBuf>,
        overrides: Overrides,
    ) -> Settings {
        let userdata_base = overrides
            .userdata
            .or(env_userdata)
            .or(config.userdata)
            .unwrap_or_else(default_userdata_base);
        let cdn_base_url = config
            .cdn_base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_CDN_BASE_URL.to_string());

        Settings {
            schema_version: config.schema_version.unwrap_or(1),
            userdata_base,
            cdn_base_url,
            request_timeout: Duration::from_secs(
                config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            user_agent: format!("steam-grid-ripper/{}", env!("CARGO_PKG_VERSION")),
            account: overrides.account.or(config.account),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "steam-grid-ripper").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

pub fn default_userdata_base() -> PathBuf {
    let home = BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_default();
    platform_userdata_base(&home)
}

#[cfg(target_os = "macos")]
fn platform_userdata_base(home: &Path) -> PathBuf {
    home.join("Library")
        .join("Application Support")
        .join("Steam")
        .join("userdata")
}

#[cfg(target_os = "windows")]
fn platform_userdata_base(_home: &Path) -> PathBuf {
    PathBuf::from(r"C:\Program Files (x86)\Steam\userdata")
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_userdata_base(home: &Path) -> PathBuf {
    let primary = home.join(".local").join("share").join("Steam").join("userdata");
    let legacy = home.join(".steam").join("steam").join("userdata");
    if !primary.exists() && legacy.exists() {
        return legacy;
    }
    primary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_config_is_empty() {
        let settings = ConfigLoader::resolve_config(Config::default(), None, Overrides::default());
        assert_eq!(settings.schema_version, 1);
        assert_eq!(settings.cdn_base_url, DEFAULT_CDN_BASE_URL);
        assert_eq!(settings.request_timeout, Duration::from_secs(15));
        assert!(settings.userdata_base.ends_with("userdata"));
        assert!(settings.user_agent.starts_with("steam-grid-ripper/"));
        assert_eq!(settings.account, None);
    }

    #[test]
    fn flags_beat_env_beat_file() {
        let config = Config {
            userdata: Some(PathBuf::from("/from/file")),
            account: Some("1".to_string()),
            ..Config::default()
        };
        let settings = ConfigLoader::resolve_config(
            config,
            Some(PathBuf::from("/from/env")),
            Overrides::default(),
        );
        assert_eq!(settings.userdata_base, PathBuf::from("/from/env"));
        assert_eq!(settings.account.as_deref(), Some("1"));

        let config = Config {
            userdata: Some(PathBuf::from("/from/file")),
            account: Some("1".to_string()),
            ..Config::default()
        };
        let settings = ConfigLoader::resolve_config(
            config,
            Some(PathBuf::from("/from/env")),
            Overrides {
                userdata: Some(PathBuf::from("/from/flag")),
                account: Some("2".to_string()),
            },
        );
        assert_eq!(settings.userdata_base, PathBuf::from("/from/flag"));
        assert_eq!(settings.account.as_deref(), Some("2"));
    }

    #[test]
    fn trailing_slash_is_trimmed_from_cdn_base() {
        let config = Config {
            cdn_base_url: Some("http://127.0.0.1:8080/".to_string()),
            timeout_secs: Some(3),
            ..Config::default()
        };
        let settings = ConfigLoader::resolve_config(config, None, Overrides::default());
        assert_eq!(settings.cdn_base_url, "http://127.0.0.1:8080");
        assert_eq!(settings.request_timeout, Duration::from_secs(3));
    }
}
