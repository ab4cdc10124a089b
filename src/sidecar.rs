use std::fs;
use std::io::{Read, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cdn::write_atomic;
use crate::domain::{AppId, SourceAppId};
use crate::error::GridError;

/// Steam's logo placement file, `config/grid/<appid>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoSidecar {
    #[serde(rename = "nVersion")]
    pub version: u32,
    #[serde(rename = "logoPosition")]
    pub logo_position: LogoPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoPosition {
    #[serde(rename = "pinnedPosition")]
    pub pinned_position: String,
    #[serde(rename = "nWidthPct")]
    pub width_pct: f64,
    #[serde(rename = "nHeightPct")]
    pub height_pct: f64,
}

impl Default for LogoSidecar {
    fn default() -> Self {
        Self {
            version: 1,
            logo_position: LogoPosition {
                pinned_position: "CenterCenter".to_string(),
                width_pct: 70.0,
                height_pct: 95.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SidecarStatus {
    Copied,
    WrittenDefault,
    Failed,
}

impl SidecarStatus {
    pub fn label(self) -> &'static str {
        match self {
            SidecarStatus::Copied => "JSON copied",
            SidecarStatus::WrittenDefault => "JSON written (default)",
            SidecarStatus::Failed => "JSON failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SidecarOutcome {
    pub status: SidecarStatus,
    pub path: Utf8PathBuf,
    pub error: Option<String>,
}

pub fn sidecar_path(grid_dir: &Utf8Path, id: &str) -> Utf8PathBuf {
    grid_dir.join(format!("{id}.json"))
}

/// Copies the source app's placement file onto the target, or writes the
/// default placement when the source has none.
pub fn apply_sidecar(grid_dir: &Utf8Path, source: &SourceAppId, target: AppId) -> SidecarOutcome {
    let src = sidecar_path(grid_dir, source.as_str());
    let dst = sidecar_path(grid_dir, &target.to_string());

    let result = if src.as_std_path().is_file() {
        copy_sidecar(&src, &dst).map(|_| SidecarStatus::Copied)
    } else {
        write_default(&dst).map(|_| SidecarStatus::WrittenDefault)
    };

    match result {
        Ok(status) => {
            debug!(%dst, status = status.label(), "sidecar applied");
            SidecarOutcome {
                status,
                path: dst,
                error: None,
            }
        }
        Err(err) => {
            warn!(%dst, error = %err, "sidecar failed");
            SidecarOutcome {
                status: SidecarStatus::Failed,
                path: dst,
                error: Some(err.to_string()),
            }
        }
    }
}

pub fn default_document() -> Result<Vec<u8>, GridError> {
    serde_json::to_vec_pretty(&LogoSidecar::default())
        .map_err(|err| GridError::Filesystem(err.to_string()))
}

fn write_default(dst: &Utf8Path) -> Result<(), GridError> {
    let content = default_document()?;
    write_atomic(dst.as_std_path(), |writer| {
        writer
            .write_all(&content)
            .map_err(|err| GridError::Filesystem(err.to_string()))?;
        Ok(content.len() as u64)
    })?;
    Ok(())
}

// Content, permissions and mtime all follow the source.
fn copy_sidecar(src: &Utf8Path, dst: &Utf8Path) -> Result<(), GridError> {
    let mut source = fs::File::open(src.as_std_path())
        .map_err(|err| GridError::Filesystem(format!("open {src}: {err}")))?;
    let metadata = source
        .metadata()
        .map_err(|err| GridError::Filesystem(err.to_string()))?;
    let mut content = Vec::new();
    source
        .read_to_end(&mut content)
        .map_err(|err| GridError::Filesystem(format!("read {src}: {err}")))?;

    write_atomic(dst.as_std_path(), |writer| {
        writer
            .write_all(&content)
            .map_err(|err| GridError::Filesystem(err.to_string()))?;
        Ok(content.len() as u64)
    })?;

    let copied = fs::OpenOptions::new()
        .write(true)
        .open(dst.as_std_path())
        .map_err(|err| GridError::Filesystem(err.to_string()))?;
    copied
        .set_permissions(metadata.permissions())
        .map_err(|err| GridError::Filesystem(err.to_string()))?;
    if let Ok(modified) = metadata.modified() {
        copied
            .set_modified(modified)
            .map_err(|err| GridError::Filesystem(err.to_string()))?;
    }
    Ok(())
}
