//! Base64 helpers for record fields.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::EngineError;

/// Decodes a stored base64 field.
pub(crate) fn decode(field: &str, value: &str) -> Result<Vec<u8>, EngineError> {
    BASE64
        .decode(value)
        .map_err(|e| EngineError::Encoding(format!("{}: {}", field, e)))
}

pub(crate) fn encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Serde adapter storing `Option<Vec<u8>>` as a base64 string.
pub(crate) mod base64_opt {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&BASE64.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| BASE64.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
