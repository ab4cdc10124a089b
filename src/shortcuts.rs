use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::appid::RawAppId;
use crate::domain::ShortcutRecord;
use crate::error::GridError;
use crate::vdf::{self, VdfMap, VdfValue};

const SHORTCUTS_KEY: &str = "shortcuts";
const APPID_KEY: &str = "appid";
const NAME_KEY: &str = "AppName";
const EXE_KEY: &str = "Exe";
const START_DIR_KEY: &str = "StartDir";

/// Loads every shortcut with a recoverable AppID. A missing file is an
/// empty registry; a file that is not binary VDF at all is an error.
pub fn read_shortcuts(path: &Path) -> Result<Vec<ShortcutRecord>, GridError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no shortcuts registry");
            return Ok(Vec::new());
        }
        Err(err) => {
            return Err(GridError::RegistryRead {
                path: path.to_path_buf(),
                message: err.to_string(),
            });
        }
    };
    let document = vdf::parse(&bytes)?;
    let records = records_from_document(&document);
    debug!(path = %path.display(), count = records.len(), "loaded shortcuts");
    Ok(records)
}

pub fn records_from_document(document: &VdfMap) -> Vec<ShortcutRecord> {
    let Some(shortcuts) = document.get_loose(SHORTCUTS_KEY).and_then(VdfValue::as_map) else {
        return Vec::new();
    };

    shortcuts
        .iter()
        .filter_map(|(key, value)| {
            let Some(entry) = value.as_map() else {
                debug!(key = %key, "skipping non-map shortcut entry");
                return None;
            };
            let record = record_from_entry(&key.to_text(), entry);
            if record.is_none() {
                debug!(key = %key, "dropping shortcut without a usable appid");
            }
            record
        })
        .collect()
}

fn record_from_entry(key: &str, entry: &VdfMap) -> Option<ShortcutRecord> {
    let raw = entry.get_loose(APPID_KEY).and_then(RawAppId::from_value);
    let app_id = crate::appid::normalize(raw.as_ref())?;
    Some(ShortcutRecord {
        key: key.to_string(),
        app_id,
        app_name: text_field(entry, NAME_KEY),
        exe: text_field(entry, EXE_KEY),
        start_dir: text_field(entry, START_DIR_KEY),
    })
}

fn text_field(entry: &VdfMap, key: &str) -> String {
    entry
        .get_loose(key)
        .and_then(VdfValue::to_text)
        .map(|text| text.into_owned())
        .unwrap_or_default()
}
