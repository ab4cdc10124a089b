use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GridError {
    #[error("invalid source AppID: {0:?} (expected digits only)")]
    InvalidSourceAppId(String),

    #[error("invalid AppID: {0}")]
    InvalidAppId(String),

    #[error("no Steam userdata account found under {0}")]
    #[diagnostic(help("make sure Steam has run at least once, or pass --userdata"))]
    UserdataNotFound(PathBuf),

    #[error("account {0} not found in userdata")]
    AccountNotFound(String),

    #[error("shortcut not found: {0}")]
    ShortcutNotFound(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read shortcuts registry {path}: {message}")]
    RegistryRead { path: PathBuf, message: String },

    #[error("malformed binary VDF at offset {offset}: {reason}")]
    RegistryParse { offset: usize, reason: String },

    #[error("CDN request failed: {0}")]
    CdnHttp(String),

    #[error("CDN returned status {status} for {url}")]
    CdnStatus { status: u16, url: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
