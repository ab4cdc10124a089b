use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::info;

use crate::cdn::{AssetFetcher, AssetReport, fetch_all_assets};
use crate::config::Settings;
use crate::domain::{AppId, ArtworkRequest, ShortcutRecord, SourceAppId};
use crate::error::GridError;
use crate::shortcuts::read_shortcuts;
use crate::sidecar::{SidecarOutcome, apply_sidecar};
use crate::userdata::{Account, ensure_grid_dir};

pub const RESTART_HINT: &str =
    "Tip: Quit & relaunch Steam to pick up artwork (or clear Steam cache).";

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub account: String,
    pub shortcuts_path: Utf8PathBuf,
    pub shortcuts: Vec<ShortcutRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyResult {
    pub request: ArtworkRequest,
    pub grid_dir: Utf8PathBuf,
    pub assets: AssetReport,
    pub sidecar: SidecarOutcome,
    pub applied_at: String,
}

impl ApplyResult {
    /// `Cover ✓ | Wide ✗ | ... | JSON copied`, the save location and the
    /// restart reminder, one per line.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = self
            .assets
            .assets
            .iter()
            .map(|(kind, outcome)| {
                format!("{} {}", kind.label(), if outcome.ok { "✓" } else { "✗" })
            })
            .collect();
        parts.push(self.sidecar.status.label().to_string());
        format!(
            "{}\nSaved to: {}\n{RESTART_HINT}",
            parts.join("  |  "),
            self.grid_dir
        )
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<F: AssetFetcher> {
    settings: Settings,
    account: Account,
    fetcher: F,
}

impl<F: AssetFetcher> App<F> {
    pub fn new(settings: Settings, account: Account, fetcher: F) -> Self {
        Self {
            settings,
            account,
            fetcher,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn list(&self, sink: &dyn ProgressSink) -> Result<ListResult, GridError> {
        let path = self.account.shortcuts_path();
        sink.event(ProgressEvent {
            message: format!("phase=Load; reading {path}"),
            elapsed: None,
        });
        let shortcuts = read_shortcuts(path.as_std_path())?;
        sink.event(ProgressEvent {
            message: format!("Loaded {} shortcuts from {path}", shortcuts.len()),
            elapsed: None,
        });
        Ok(ListResult {
            account: self.account.id.clone(),
            shortcuts_path: path,
            shortcuts,
        })
    }

    /// Validates `source` before touching the disk or the network. Per-asset
    /// failures are part of the result, not an error.
    pub fn apply(
        &self,
        target: AppId,
        source: &str,
        sink: &dyn ProgressSink,
    ) -> Result<ApplyResult, GridError> {
        let source: SourceAppId = source.parse()?;
        let request = ArtworkRequest { source, target };
        let started = Instant::now();

        let grid_dir = ensure_grid_dir(&self.account)?;
        sink.event(ProgressEvent {
            message: format!(
                "phase=Fetch; AppID {} -> non-Steam ID {}",
                request.source, request.target
            ),
            elapsed: None,
        });
        let assets = fetch_all_assets(
            &self.fetcher,
            &self.settings.cdn_base_url,
            &request,
            &grid_dir,
        );
        for (kind, outcome) in &assets.assets {
            let verdict = match &outcome.error {
                None => "ok".to_string(),
                Some(err) => err.clone(),
            };
            sink.event(ProgressEvent {
                message: format!("asset {kind}: {verdict}"),
                elapsed: Some(started.elapsed()),
            });
        }

        sink.event(ProgressEvent {
            message: "phase=Sidecar; logo placement".to_string(),
            elapsed: Some(started.elapsed()),
        });
        let sidecar = apply_sidecar(&grid_dir, &request.source, request.target);

        info!(
            source = %request.source,
            target = %request.target,
            ok = assets.succeeded(),
            failed = assets.failed(),
            sidecar = sidecar.status.label(),
            "artwork applied"
        );
        sink.event(ProgressEvent {
            message: format!("phase=Done; {}", sidecar.status.label()),
            elapsed: Some(started.elapsed()),
        });

        Ok(ApplyResult {
            request,
            grid_dir,
            assets,
            sidecar,
            applied_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}
