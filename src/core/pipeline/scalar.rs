//! Field decoders shared by the schema types.
//!
//! String fields are read straight from the scalar, so `version: 2.10` or
//! `NODE: 1.10` keep the text as written rather than a re-printed number.
//! Null collections decode as empty.

use super::merge::{self, MergedMap};
use indexmap::IndexMap;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};

pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

/// Decode a keyed collection whose entries may be left empty (`release:`).
pub(crate) fn keyed<'de, D, T>(deserializer: D) -> Result<IndexMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(merge::filled(Option::<MergedMap<Option<T>>>::deserialize(
        deserializer,
    )?))
}
