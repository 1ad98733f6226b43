use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw bytes of a Redis key, field, member or element.
///
/// The backend sends these either as `{ "type": "Buffer", "data": [..] }` (buffer
/// encoding) or as plain strings (utf8 encoding). Equality is always byte-wise.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RedisBuffer(Vec<u8>);

impl RedisBuffer {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Display form used for key names in lists and toasts.
    pub fn to_display_string(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl fmt::Debug for RedisBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedisBuffer({:?})", self.to_display_string())
    }
}

impl fmt::Display for RedisBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<&str> for RedisBuffer {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for RedisBuffer {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl From<Vec<u8>> for RedisBuffer {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for RedisBuffer {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl Serialize for RedisBuffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut buffer = serializer.serialize_struct("Buffer", 2)?;
        buffer.serialize_field("type", "Buffer")?;
        buffer.serialize_field("data", &self.0)?;
        buffer.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BufferRepr {
    Tagged {
        #[serde(rename = "type")]
        kind: String,
        data: Vec<u8>,
    },
    Text(String),
}

impl<'de> Deserialize<'de> for RedisBuffer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match BufferRepr::deserialize(deserializer)? {
            BufferRepr::Tagged { kind, data } if kind == "Buffer" => Ok(Self(data)),
            BufferRepr::Tagged { kind, .. } => Err(de::Error::custom(format!(
                "unexpected buffer type `{kind}`"
            ))),
            BufferRepr::Text(text) => Ok(Self(text.into_bytes())),
        }
    }
}

/// Shortens a display name for notifications, keeping char boundaries intact.
pub fn format_name_short(name: &str) -> String {
    const MAX_CHARS: usize = 100;

    if name.chars().count() <= MAX_CHARS {
        return name.to_string();
    }

    let head: String = name.chars().take(MAX_CHARS).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn independently_built_buffers_compare_equal() {
        let from_text = RedisBuffer::from("hash field");
        let from_bytes = RedisBuffer::new(b"hash field".to_vec());

        assert_eq!(from_text, from_bytes);
        assert_ne!(from_text, RedisBuffer::from("hash field2"));
    }

    #[test]
    fn deserializes_tagged_and_plain_forms() {
        let tagged: RedisBuffer =
            serde_json::from_value(json!({ "type": "Buffer", "data": [107, 101, 121] })).unwrap();
        let plain: RedisBuffer = serde_json::from_value(json!("key")).unwrap();

        assert_eq!(tagged, plain);
        assert!(serde_json::from_value::<RedisBuffer>(json!({ "type": "Blob", "data": [] })).is_err());
    }

    #[test]
    fn serializes_as_tagged_buffer() {
        let value = serde_json::to_value(RedisBuffer::from("ab")).unwrap();
        assert_eq!(value, json!({ "type": "Buffer", "data": [97, 98] }));
    }

    #[test]
    fn binary_keys_render_lossily() {
        let buffer = RedisBuffer::new(vec![0xff, b'k']);
        assert_eq!(buffer.to_display_string(), "\u{fffd}k");
    }

    #[test]
    fn short_names_are_kept() {
        assert_eq!(format_name_short("user:1"), "user:1");
        let long = "x".repeat(120);
        assert_eq!(format_name_short(&long).len(), 103);
    }
}
