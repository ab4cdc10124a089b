use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::GridError;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());

pub fn is_all_digits(value: &str) -> bool {
    DIGITS.is_match(value)
}

/// Canonical identifier: an unsigned 32-bit AppID, rendered in decimal.
///
/// This is also the filename stem Steam uses for everything under
/// `config/grid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(u32);

impl AppId {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AppId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl FromStr for AppId {
    type Err = GridError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if !is_all_digits(trimmed) {
            return Err(GridError::InvalidAppId(value.to_string()));
        }
        trimmed
            .parse::<u32>()
            .map(Self)
            .map_err(|_| GridError::InvalidAppId(value.to_string()))
    }
}

/// AppID typed in by the operator. Only checked for being all digits; it is
/// never looked up against the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceAppId(String);

impl SourceAppId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceAppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SourceAppId {
    type Err = GridError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if !is_all_digits(trimmed) {
            return Err(GridError::InvalidSourceAppId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<AppId> for SourceAppId {
    fn from(value: AppId) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Cover,
    Wide,
    Hero,
    Logo,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Cover,
        AssetKind::Wide,
        AssetKind::Hero,
        AssetKind::Logo,
    ];

    /// File name of the asset on the CDN, under `steam/apps/<appid>/`.
    pub fn remote_file(self) -> &'static str {
        match self {
            AssetKind::Cover => "library_600x900_2x.jpg",
            AssetKind::Wide => "library_411x184.jpg",
            AssetKind::Hero => "library_hero.jpg",
            AssetKind::Logo => "logo.png",
        }
    }

    /// File name Steam looks for in `config/grid`.
    pub fn grid_file(self, target: AppId) -> String {
        match self {
            AssetKind::Cover => format!("{target}p.jpg"),
            AssetKind::Wide => format!("{target}.jpg"),
            AssetKind::Hero => format!("{target}_hero.jpg"),
            AssetKind::Logo => format!("{target}_logo.png"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Cover => "Cover",
            AssetKind::Wide => "Wide",
            AssetKind::Hero => "Hero",
            AssetKind::Logo => "Logo",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortcutRecord {
    pub key: String,
    pub app_id: AppId,
    pub app_name: String,
    pub exe: String,
    pub start_dir: String,
}

impl fmt::Display for ShortcutRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} — {}   [ID: {}]", self.app_name, self.exe, self.app_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtworkRequest {
    pub source: SourceAppId,
    pub target: AppId,
}

/// How the operator points at a shortcut: by its AppID, or by `#<index>`
/// into the listed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSelector {
    AppId(AppId),
    Index(usize),
}

impl FromStr for TargetSelector {
    type Err = GridError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Some(index) = trimmed.strip_prefix('#') {
            return index
                .parse::<usize>()
                .map(TargetSelector::Index)
                .map_err(|_| GridError::InvalidAppId(value.to_string()));
        }
        Ok(TargetSelector::AppId(trimmed.parse()?))
    }
}

pub fn select_target<'a>(
    records: &'a [ShortcutRecord],
    selector: TargetSelector,
) -> Result<&'a ShortcutRecord, GridError> {
    match selector {
        TargetSelector::AppId(id) => records
            .iter()
            .find(|record| record.app_id == id)
            .ok_or_else(|| GridError::ShortcutNotFound(id.to_string())),
        TargetSelector::Index(index) => records
            .get(index)
            .ok_or_else(|| GridError::ShortcutNotFound(format!("#{index}"))),
    }
}
