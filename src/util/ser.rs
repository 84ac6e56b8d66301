//! Helpful serialization tools.
//!
//! The wire format for this protocol is JSON dictionaries, which cannot carry
//! raw binary. Everything binary (keys, signatures, fingerprints) rides as
//! base64 text, and the helpers here keep that conversion in one place.

use crate::error::Result;
use base64::Engine;

/// Convert bytes to base64
pub fn base64_encode<T: AsRef<[u8]>>(bytes: T) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes.as_ref())
}

/// Convert base64 to bytes
pub fn base64_decode<T: AsRef<[u8]>>(bytes: T) -> Result<Vec<u8>> {
    Ok(base64::engine::general_purpose::STANDARD.decode(bytes.as_ref())?)
}

/// (De)serializes a `Vec<u8>` as base64 text when the format is
/// human-readable (ie, JSON), and as raw bytes otherwise.
pub(crate) mod human_bytes {
    use super::{base64_decode, base64_encode};
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&base64_encode(bytes.as_slice()))
        } else {
            bytes.serialize(serializer)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = <String>::deserialize(deserializer)?;
            base64_decode(s).map_err(de::Error::custom)
        } else {
            <Vec<u8>>::deserialize(deserializer)
        }
    }
}

/// Like [`human_bytes`](self::human_bytes), but for `Option<Vec<u8>>` fields.
pub(crate) mod human_bytes_opt {
    use super::{base64_decode, base64_encode};
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            match bytes {
                Some(bytes) => serializer.serialize_some(&base64_encode(bytes.as_slice())),
                None => serializer.serialize_none(),
            }
        } else {
            bytes.serialize(serializer)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let maybe = <Option<String>>::deserialize(deserializer)?;
            match maybe {
                Some(s) => Ok(Some(base64_decode(s).map_err(de::Error::custom)?)),
                None => Ok(None),
            }
        } else {
            <Option<Vec<u8>>>::deserialize(deserializer)
        }
    }
}
