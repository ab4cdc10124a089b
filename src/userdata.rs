use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::debug;

use crate::domain::is_all_digits;
use crate::error::GridError;

/// One numeric directory under Steam's `userdata`, i.e. one local account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: String,
    pub root: Utf8PathBuf,
}

impl Account {
    pub fn new(id: impl Into<String>, root: Utf8PathBuf) -> Self {
        Self {
            id: id.into(),
            root,
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn config_dir(&self) -> Utf8PathBuf {
        self.root.join("config")
    }

    pub fn shortcuts_path(&self) -> Utf8PathBuf {
        self.config_dir().join("shortcuts.vdf")
    }

    pub fn grid_dir(&self) -> Utf8PathBuf {
        self.config_dir().join("grid")
    }
}

/// Numeric subdirectories of `base`, sorted by name.
pub fn find_accounts(base: &Path) -> Result<Vec<Account>, GridError> {
    let entries = match fs::read_dir(base) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(GridError::Filesystem(format!(
                "read {}: {err}",
                base.display()
            )));
        }
    };

    let mut accounts = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| GridError::Filesystem(err.to_string()))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !is_all_digits(&name) {
            continue;
        }
        let root = utf8_path(path)?;
        accounts.push(Account::new(name, root));
    }
    accounts.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(accounts)
}

/// Picks `preferred` when given, otherwise the first account by name.
pub fn resolve_account(base: &Path, preferred: Option<&str>) -> Result<Account, GridError> {
    let accounts = find_accounts(base)?;
    debug!(base = %base.display(), count = accounts.len(), "found userdata accounts");
    if let Some(preferred) = preferred {
        return accounts
            .into_iter()
            .find(|account| account.id == preferred)
            .ok_or_else(|| GridError::AccountNotFound(preferred.to_string()));
    }
    accounts
        .into_iter()
        .next()
        .ok_or_else(|| GridError::UserdataNotFound(base.to_path_buf()))
}

pub fn ensure_grid_dir(account: &Account) -> Result<Utf8PathBuf, GridError> {
    let grid = account.grid_dir();
    fs::create_dir_all(grid.as_std_path())
        .map_err(|err| GridError::Filesystem(format!("create {grid}: {err}")))?;
    Ok(grid)
}

fn utf8_path(path: PathBuf) -> Result<Utf8PathBuf, GridError> {
    Utf8PathBuf::from_path_buf(path)
        .map_err(|path| GridError::Filesystem(format!("non UTF-8 path {}", path.display())))
}
