#![allow(dead_code)]

use std::path::Path;

/// Writes binary VDF the way Steam lays out `shortcuts.vdf`.
#[derive(Default)]
pub struct VdfBuilder {
    buf: Vec<u8>,
}

impl VdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(mut self, kind: u8, key: &[u8]) -> Self {
        self.buf.push(kind);
        self.buf.extend_from_slice(key);
        self.buf.push(0);
        self
    }

    pub fn begin(self, key: &str) -> Self {
        self.key(0x00, key.as_bytes())
    }

    pub fn end(mut self) -> Self {
        self.buf.push(0x08);
        self
    }

    pub fn string(self, key: &str, value: &[u8]) -> Self {
        let mut this = self.key(0x01, key.as_bytes());
        this.buf.extend_from_slice(value);
        this.buf.push(0);
        this
    }

    pub fn int32(self, key: &str, value: i32) -> Self {
        let mut this = self.key(0x02, key.as_bytes());
        this.buf.extend_from_slice(&value.to_le_bytes());
        this
    }

    pub fn uint64(self, key: &str, value: u64) -> Self {
        let mut this = self.key(0x07, key.as_bytes());
        this.buf.extend_from_slice(&value.to_le_bytes());
        this
    }

    pub fn finish(self) -> Vec<u8> {
        self.end().buf
    }
}

/// One shortcut entry with the usual fields; `appid` is left out when
/// `None`.
pub fn shortcut(builder: VdfBuilder, key: &str, appid: Option<i32>, name: &str) -> VdfBuilder {
    let mut builder = builder.begin(key);
    if let Some(appid) = appid {
        builder = builder.int32("appid", appid);
    }
    builder
        .string("AppName", name.as_bytes())
        .string("Exe", format!("\"/games/{name}\"").as_bytes())
        .string("StartDir", b"\"/games/\"")
        .begin("tags")
        .string("0", b"favorite")
        .end()
        .end()
}

pub fn write_account(userdata: &Path, id: &str, shortcuts: Option<&[u8]>) {
    let config = userdata.join(id).join("config");
    std::fs::create_dir_all(&config).unwrap();
    if let Some(bytes) = shortcuts {
        std::fs::write(config.join("shortcuts.vdf"), bytes).unwrap();
    }
}
