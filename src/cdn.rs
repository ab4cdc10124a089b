use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::domain::{ArtworkRequest, AssetKind, SourceAppId};
use crate::error::GridError;

pub trait AssetFetcher: Send + Sync {
    /// Downloads `url` to `destination`, returning the number of bytes
    /// written. Nothing appears under `destination` unless the whole body
    /// arrived.
    fn fetch_asset(&self, url: &str, destination: &Path) -> Result<u64, GridError>;
}

#[derive(Clone)]
pub struct CdnHttpClient {
    client: Client,
}

impl CdnHttpClient {
    pub fn new(settings: &Settings) -> Result<Self, GridError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&settings.user_agent)
                .map_err(|err| GridError::CdnHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| GridError::CdnHttp(err.to_string()))?;
        Ok(Self { client })
    }
}

impl AssetFetcher for CdnHttpClient {
    fn fetch_asset(&self, url: &str, destination: &Path) -> Result<u64, GridError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| GridError::CdnHttp(err.to_string()))?;
        if response.status() != StatusCode::OK {
            return Err(GridError::CdnStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        write_atomic(destination, |file| {
            io::copy(&mut response, file).map_err(|err| GridError::CdnHttp(err.to_string()))
        })
    }
}

/// Streams into a temp file next to `destination` and renames it into place
/// once `fill` has succeeded.
pub fn write_atomic<F>(destination: &Path, fill: F) -> Result<u64, GridError>
where
    F: FnOnce(&mut BufWriter<&fs::File>) -> Result<u64, GridError>,
{
    let parent = destination
        .parent()
        .ok_or_else(|| GridError::Filesystem("invalid destination path".to_string()))?;
    let mut builder = tempfile::Builder::new();
    builder.prefix(".sgr-download");
    // Same mode a plain create would get; the umask still applies.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let temp = builder
        .tempfile_in(parent)
        .map_err(|err| GridError::Filesystem(err.to_string()))?;
    let written = {
        let mut writer = BufWriter::new(temp.as_file());
        let written = fill(&mut writer)?;
        writer
            .flush()
            .map_err(|err| GridError::Filesystem(err.to_string()))?;
        written
    };
    temp.as_file()
        .sync_all()
        .map_err(|err| GridError::Filesystem(err.to_string()))?;
    temp.persist(destination)
        .map_err(|err| GridError::Filesystem(err.to_string()))?;
    Ok(written)
}

pub fn asset_url(cdn_base_url: &str, source: &SourceAppId, kind: AssetKind) -> String {
    format!(
        "{}/steam/apps/{}/{}",
        cdn_base_url.trim_end_matches('/'),
        source,
        kind.remote_file()
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetOutcome {
    pub url: String,
    pub path: Utf8PathBuf,
    pub ok: bool,
    pub bytes: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AssetReport {
    pub assets: BTreeMap<AssetKind, AssetOutcome>,
}

impl AssetReport {
    pub fn succeeded(&self) -> usize {
        self.assets.values().filter(|outcome| outcome.ok).count()
    }

    pub fn failed(&self) -> usize {
        self.assets.len() - self.succeeded()
    }

    pub fn is_ok(&self, kind: AssetKind) -> bool {
        self.assets.get(&kind).is_some_and(|outcome| outcome.ok)
    }
}

/// Fetches all four kinds. One failing asset never stops the others.
pub fn fetch_all_assets<F: AssetFetcher + ?Sized>(
    fetcher: &F,
    cdn_base_url: &str,
    request: &ArtworkRequest,
    grid_dir: &Utf8Path,
) -> AssetReport {
    let mut report = AssetReport::default();
    for kind in AssetKind::ALL {
        let url = asset_url(cdn_base_url, &request.source, kind);
        let path = grid_dir.join(kind.grid_file(request.target));
        debug!(%url, %path, "fetching asset");
        let outcome = match fetcher.fetch_asset(&url, path.as_std_path()) {
            Ok(bytes) => {
                info!(asset = %kind, bytes, %path, "saved asset");
                AssetOutcome {
                    url,
                    path,
                    ok: true,
                    bytes: Some(bytes),
                    error: None,
                }
            }
            Err(err) => {
                warn!(asset = %kind, %url, error = %err, "asset fetch failed");
                AssetOutcome {
                    url,
                    path,
                    ok: false,
                    bytes: None,
                    error: Some(err.to_string()),
                }
            }
        };
        report.assets.insert(kind, outcome);
    }
    report
}
