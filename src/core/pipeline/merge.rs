//! YAML merge keys (`<<: *defaults`).
//!
//! serde_yaml expands aliases while decoding but hands `<<` over as an
//! ordinary key. Mappings of the pipeline schema resolve it themselves so
//! scalars are still read from the document text. Explicit keys win over
//! merged ones, and earlier merge sources win over later ones.

use indexmap::IndexMap;
use serde::de::value::MapAccessDeserializer;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use std::fmt;
use std::marker::PhantomData;

pub(crate) const MERGE_KEY: &str = "<<";

pub(crate) fn duplicate_key<E: de::Error>(key: &str) -> E {
    E::custom(format_args!("duplicate entry with key `{}`", key))
}

/// Value of a merge key: one mapping or a sequence of mappings.
pub(crate) struct MergeSources<T>(pub(crate) Vec<T>);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for MergeSources<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SourcesVisitor(PhantomData))
    }
}

struct SourcesVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for SourcesVisitor<T> {
    type Value = MergeSources<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a mapping or a sequence of mappings to merge")
    }

    fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let source = T::deserialize(MapAccessDeserializer::new(map))?;
        Ok(MergeSources(vec![source]))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut sources = Vec::new();
        while let Some(source) = seq.next_element()? {
            sources.push(source);
        }
        Ok(MergeSources(sources))
    }
}

/// An ordered map that resolves merge keys and rejects duplicate keys.
pub(crate) struct MergedMap<V>(pub(crate) IndexMap<String, V>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for MergedMap<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(MergedMapVisitor(PhantomData))
    }
}

struct MergedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for MergedMapVisitor<V> {
    type Value = MergedMap<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a mapping")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = IndexMap::new();
        let mut sources = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            if key == MERGE_KEY {
                let MergeSources(found) = map.next_value::<MergeSources<MergedMap<V>>>()?;
                sources.extend(found);
            } else if entries.contains_key(&key) {
                return Err(duplicate_key(&key));
            } else {
                let value = map.next_value()?;
                entries.insert(key, value);
            }
        }
        for MergedMap(base) in sources {
            for (key, value) in base {
                entries.entry(key).or_insert(value);
            }
        }
        Ok(MergedMap(entries))
    }
}

/// Entries of an optional map whose values may be left empty (`release:`).
pub(crate) fn filled<T: Default>(map: Option<MergedMap<Option<T>>>) -> IndexMap<String, T> {
    map.map(|MergedMap(entries)| entries)
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value.unwrap_or_default()))
        .collect()
}

/// A partially decoded mapping that can take unset fields from merge sources.
pub(crate) trait Layer: Sized {
    fn take_sources(&mut self) -> Vec<Self>;

    /// Keep the fields set on `self`, take the rest from `base`.
    fn inherit(self, base: Self) -> Self;

    fn flatten(mut self) -> Self {
        self.take_sources()
            .into_iter()
            .fold(self, |layer, base| layer.inherit(base.flatten()))
    }
}
