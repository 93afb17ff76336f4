//! Decoding of `type`-tagged JSON objects that tolerate unrecognized tags.
//!
//! Every union in the Slack wire protocol grows new variants over time, so each
//! of ours carries an `Unknown` arm. A value whose tag is not in the known set is
//! turned into that arm instead of failing the decode.

use serde::{
    Deserialize, Deserializer,
    de::{DeserializeOwned, Error},
};
use serde_json::Value;

/// Reads the `type` discriminator of a JSON object.
fn discriminator<E: Error>(value: &Value) -> Result<&str, E> {
    match value.get("type") {
        Some(Value::String(kind)) => Ok(kind),
        Some(_) => Err(E::custom("field `type` must be a string")),
        None => Err(E::missing_field("type")),
    }
}

/// Decodes a tagged object as `K` when its tag is one of `known`, otherwise
/// hands the raw tag to `unknown`.
pub(crate) fn decode<'de, D, K, T>(deserializer: D, known: &[&str], unknown: impl FnOnce(String) -> T) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    K: DeserializeOwned + Into<T>,
{
    let value = Value::deserialize(deserializer)?;
    let kind = discriminator::<D::Error>(&value)?;

    if known.contains(&kind) {
        K::deserialize(value).map(Into::into).map_err(D::Error::custom)
    } else {
        Ok(unknown(kind.to_string()))
    }
}

/// Like [`decode`], but an object carrying a string `subtype` is always
/// unknown, reported as `type/subtype`.
///
/// Subtyped variants of a known kind (edits, deletions, bot posts) do not
/// share its required fields.
pub(crate) fn decode_unsubtyped<'de, D, K, T>(deserializer: D, known: &[&str], unknown: impl FnOnce(String) -> T) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    K: DeserializeOwned + Into<T>,
{
    let value = Value::deserialize(deserializer)?;
    let kind = discriminator::<D::Error>(&value)?;

    match value.get("subtype") {
        Some(Value::String(subtype)) => Ok(unknown(format!("{kind}/{subtype}"))),
        _ if known.contains(&kind) => K::deserialize(value).map(Into::into).map_err(D::Error::custom),
        _ => Ok(unknown(kind.to_string())),
    }
}
