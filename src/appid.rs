use crate::domain::AppId;
use crate::vdf::{TextOrBytes, VdfValue};

/// An `appid` field as it came out of the registry. Steam has written it as
/// a signed int32, as a wider integer, and as a raw little-endian blob.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAppId {
    Signed(i64),
    Unsigned(u64),
    Bytes(Vec<u8>),
    Text(String),
    /// Only integral values yield an id; `4.5` is dropped, not truncated.
    Float(f32),
}

impl RawAppId {
    pub fn from_value(value: &VdfValue) -> Option<Self> {
        let raw = match value {
            VdfValue::Map(_) => return None,
            VdfValue::Int32(v) | VdfValue::Pointer(v) | VdfValue::Color(v) => {
                RawAppId::Signed(i64::from(*v))
            }
            VdfValue::Int64(v) => RawAppId::Signed(*v),
            VdfValue::UInt64(v) => RawAppId::Unsigned(*v),
            VdfValue::Float32(v) => RawAppId::Float(*v),
            VdfValue::String(TextOrBytes::Raw(bytes)) => RawAppId::Bytes(bytes.clone()),
            VdfValue::String(TextOrBytes::Text(text)) => RawAppId::Text(text.clone()),
            VdfValue::WideString(text) => RawAppId::Text(text.clone()),
        };
        Some(raw)
    }

    pub fn normalize(&self) -> Option<AppId> {
        match self {
            RawAppId::Signed(v) => Some(truncate(i128::from(*v))),
            RawAppId::Unsigned(v) => Some(truncate(i128::from(*v))),
            RawAppId::Bytes(bytes) => from_le_bytes(bytes),
            RawAppId::Text(text) => parse_decimal(text),
            RawAppId::Float(v) => parse_decimal(&v.to_string()),
        }
    }
}

pub fn normalize(raw: Option<&RawAppId>) -> Option<AppId> {
    raw.and_then(RawAppId::normalize)
}

fn truncate(value: i128) -> AppId {
    AppId::new((value & 0xFFFF_FFFF) as u32)
}

// Everything past the fourth byte only adds multiples of 2^32.
fn from_le_bytes(bytes: &[u8]) -> Option<AppId> {
    if bytes.is_empty() {
        return None;
    }
    let mut word = [0u8; 4];
    let len = bytes.len().min(4);
    word[..len].copy_from_slice(&bytes[..len]);
    Some(AppId::new(u32::from_le_bytes(word)))
}

fn parse_decimal(text: &str) -> Option<AppId> {
    text.trim().parse::<i128>().ok().map(truncate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: RawAppId) -> Option<String> {
        raw.normalize().map(|id| id.to_string())
    }

    #[test]
    fn signed_values_wrap_to_unsigned() {
        assert_eq!(id(RawAppId::Signed(-1)).as_deref(), Some("4294967295"));
        assert_eq!(
            id(RawAppId::Signed(-1_171_510_507)).as_deref(),
            Some("3123456789")
        );
        assert_eq!(id(RawAppId::Signed(271_590)).as_deref(), Some("271590"));
    }

    #[test]
    fn sign_does_not_change_canonical_value() {
        for v in [
            i64::MIN,
            -4_294_967_296,
            -2_147_483_648,
            -12_345,
            -1,
            0,
            1,
            2_147_483_647,
            4_294_967_296,
            i64::MAX,
        ] {
            assert_eq!(
                RawAppId::Signed(v).normalize(),
                RawAppId::Signed(v & 0xFFFF_FFFF).normalize(),
                "value {v}"
            );
        }
    }

    #[test]
    fn unsigned_values_are_masked() {
        assert_eq!(
            id(RawAppId::Unsigned(u64::MAX)).as_deref(),
            Some("4294967295")
        );
        assert_eq!(
            id(RawAppId::Unsigned((1 << 32) + 7)).as_deref(),
            Some("7")
        );
    }

    #[test]
    fn four_bytes_read_little_endian() {
        for bytes in [
            [0x15, 0x23, 0x2c, 0xba],
            [0xff, 0xff, 0xff, 0xff],
            [0, 0, 0, 0],
            [1, 0, 0, 0],
        ] {
            assert_eq!(
                id(RawAppId::Bytes(bytes.to_vec())),
                Some(u32::from_le_bytes(bytes).to_string())
            );
        }
    }

    #[test]
    fn odd_length_bytes_reduce_mod_2_32() {
        assert_eq!(id(RawAppId::Bytes(vec![0x01, 0x02])).as_deref(), Some("513"));
        assert_eq!(
            id(RawAppId::Bytes(vec![1, 0, 0, 0, 9, 9])).as_deref(),
            Some("1")
        );
        assert_eq!(id(RawAppId::Bytes(Vec::new())), None);
    }

    #[test]
    fn text_falls_back_to_decimal_parse() {
        assert_eq!(id(RawAppId::Text(" 271590 ".into())).as_deref(), Some("271590"));
        assert_eq!(id(RawAppId::Text("-1".into())).as_deref(), Some("4294967295"));
        assert_eq!(id(RawAppId::Text("not a number".into())), None);
        assert_eq!(id(RawAppId::Text(String::new())), None);
    }

    #[test]
    fn floats_only_survive_when_integral() {
        assert_eq!(id(RawAppId::Float(42.0)).as_deref(), Some("42"));
        assert_eq!(id(RawAppId::Float(4.5)), None);
        assert_eq!(id(RawAppId::Float(f32::NAN)), None);
    }

    #[test]
    fn missing_field_has_no_id() {
        assert_eq!(normalize(None), None);
    }

    #[test]
    fn maps_are_not_identifiers() {
        assert_eq!(RawAppId::from_value(&VdfValue::Map(Default::default())), None);
        assert_eq!(
            RawAppId::from_value(&VdfValue::Int32(-2)),
            Some(RawAppId::Signed(-2))
        );
    }
}
