//! Reader for Valve's binary key/value format ("binary VDF"), the container
//! behind `shortcuts.vdf`.
//!
//! Every entry is a type byte, a NUL-terminated key and a typed payload.
//! Maps nest and end with [`TYPE_END`]. Nothing in the format promises
//! UTF-8, so keys and strings are kept as [`TextOrBytes`].

use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::GridError;

pub const TYPE_MAP: u8 = 0x00;
pub const TYPE_STRING: u8 = 0x01;
pub const TYPE_INT32: u8 = 0x02;
pub const TYPE_FLOAT32: u8 = 0x03;
pub const TYPE_POINTER: u8 = 0x04;
pub const TYPE_WIDE_STRING: u8 = 0x05;
pub const TYPE_COLOR: u8 = 0x06;
pub const TYPE_UINT64: u8 = 0x07;
pub const TYPE_END: u8 = 0x08;
pub const TYPE_INT64: u8 = 0x0A;

const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOrBytes {
    Text(String),
    Raw(Vec<u8>),
}

impl TextOrBytes {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => TextOrBytes::Text(text),
            Err(err) => TextOrBytes::Raw(err.into_bytes()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            TextOrBytes::Text(text) => text.as_bytes(),
            TextOrBytes::Raw(bytes) => bytes,
        }
    }

    /// Permissive decode: invalid sequences become U+FFFD instead of failing.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            TextOrBytes::Text(text) => Cow::Borrowed(text),
            TextOrBytes::Raw(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl fmt::Display for TextOrBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for TextOrBytes {
    fn from(value: &str) -> Self {
        TextOrBytes::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VdfValue {
    Map(VdfMap),
    String(TextOrBytes),
    WideString(String),
    Int32(i32),
    Float32(f32),
    Pointer(i32),
    Color(i32),
    UInt64(u64),
    Int64(i64),
}

impl VdfValue {
    pub fn as_map(&self) -> Option<&VdfMap> {
        match self {
            VdfValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// String form of a scalar value. Maps have none.
    pub fn to_text(&self) -> Option<Cow<'_, str>> {
        let text = match self {
            VdfValue::Map(_) => return None,
            VdfValue::String(value) => return Some(value.to_text()),
            VdfValue::WideString(value) => return Some(Cow::Borrowed(value)),
            VdfValue::Int32(value) | VdfValue::Pointer(value) | VdfValue::Color(value) => {
                value.to_string()
            }
            VdfValue::Float32(value) => value.to_string(),
            VdfValue::UInt64(value) => value.to_string(),
            VdfValue::Int64(value) => value.to_string(),
        };
        Some(Cow::Owned(text))
    }
}

/// Ordered key/value pairs. Duplicate keys are kept as written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VdfMap {
    entries: Vec<(TextOrBytes, VdfValue)>,
}

impl VdfMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<TextOrBytes>, value: VdfValue) {
        self.entries.push((key.into(), value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TextOrBytes, &VdfValue)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    /// First value whose key matches `key`, whether the key was stored as
    /// text or as raw bytes.
    pub fn get(&self, key: &str) -> Option<&VdfValue> {
        self.iter()
            .find(|(candidate, _)| candidate.as_bytes() == key.as_bytes())
            .map(|(_, value)| value)
    }

    /// Exact match first, then an ASCII case-insensitive one.
    pub fn get_loose(&self, key: &str) -> Option<&VdfValue> {
        self.get(key).or_else(|| {
            self.iter()
                .find(|(candidate, _)| candidate.as_bytes().eq_ignore_ascii_case(key.as_bytes()))
                .map(|(_, value)| value)
        })
    }
}

pub fn parse(bytes: &[u8]) -> Result<VdfMap, GridError> {
    let mut reader = VdfReader::new(bytes);
    reader.read_root()
}

struct VdfReader<'a> {
    inner: Cursor<&'a [u8]>,
}

impl<'a> VdfReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(bytes),
        }
    }

    fn offset(&self) -> usize {
        self.inner.position() as usize
    }

    fn remaining(&self) -> usize {
        self.inner.get_ref().len().saturating_sub(self.offset())
    }

    fn error(&self, reason: impl Into<String>) -> GridError {
        GridError::RegistryParse {
            offset: self.offset(),
            reason: reason.into(),
        }
    }

    fn read_root(&mut self) -> Result<VdfMap, GridError> {
        let mut root = VdfMap::new();
        loop {
            if self.remaining() == 0 {
                return Ok(root);
            }
            let kind = self.read_u8()?;
            if kind == TYPE_END {
                if self.remaining() > 0 {
                    return Err(self.error("trailing data after root"));
                }
                return Ok(root);
            }
            let (key, value) = self.read_entry(kind, 0)?;
            root.push(key, value);
        }
    }

    fn read_map(&mut self, depth: usize) -> Result<VdfMap, GridError> {
        if depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        let mut map = VdfMap::new();
        loop {
            let kind = self.read_u8()?;
            if kind == TYPE_END {
                return Ok(map);
            }
            let (key, value) = self.read_entry(kind, depth)?;
            map.push(key, value);
        }
    }

    fn read_entry(&mut self, kind: u8, depth: usize) -> Result<(TextOrBytes, VdfValue), GridError> {
        let start = self.offset().saturating_sub(1);
        let key = self.read_cstring()?;
        let value = match kind {
            TYPE_MAP => VdfValue::Map(self.read_map(depth + 1)?),
            TYPE_STRING => VdfValue::String(self.read_cstring()?),
            TYPE_WIDE_STRING => VdfValue::WideString(self.read_wide_string()?),
            TYPE_INT32 => VdfValue::Int32(self.read_i32()?),
            TYPE_POINTER => VdfValue::Pointer(self.read_i32()?),
            TYPE_COLOR => VdfValue::Color(self.read_i32()?),
            TYPE_FLOAT32 => VdfValue::Float32(
                self.inner
                    .read_f32::<LittleEndian>()
                    .map_err(|_| self.error("truncated float32"))?,
            ),
            TYPE_UINT64 => VdfValue::UInt64(
                self.inner
                    .read_u64::<LittleEndian>()
                    .map_err(|_| self.error("truncated uint64"))?,
            ),
            TYPE_INT64 => VdfValue::Int64(
                self.inner
                    .read_i64::<LittleEndian>()
                    .map_err(|_| self.error("truncated int64"))?,
            ),
            other => {
                return Err(GridError::RegistryParse {
                    offset: start,
                    reason: format!("unknown value type 0x{other:02x}"),
                });
            }
        };
        Ok((key, value))
    }

    fn read_u8(&mut self) -> Result<u8, GridError> {
        self.inner
            .read_u8()
            .map_err(|_| self.error("unexpected end of data"))
    }

    fn read_i32(&mut self) -> Result<i32, GridError> {
        self.inner
            .read_i32::<LittleEndian>()
            .map_err(|_| self.error("truncated int32"))
    }

    fn read_cstring(&mut self) -> Result<TextOrBytes, GridError> {
        let mut buf = Vec::new();
        loop {
            let byte = self
                .inner
                .read_u8()
                .map_err(|_| self.error("unterminated string"))?;
            if byte == 0 {
                return Ok(TextOrBytes::from_bytes(buf));
            }
            buf.push(byte);
        }
    }

    fn read_wide_string(&mut self) -> Result<String, GridError> {
        let mut units = Vec::new();
        loop {
            let unit = self
                .inner
                .read_u16::<LittleEndian>()
                .map_err(|_| self.error("unterminated wide string"))?;
            if unit == 0 {
                return Ok(String::from_utf16_lossy(&units));
            }
            units.push(unit);
        }
    }
}
