//! Decoding of the entries of a workflow's `jobs` list.
//!
//! An entry is either a bare job name:
//!
//! ```yaml
//! - build-linux
//! ```
//!
//! or a single-key mapping whose value configures the invocation:
//!
//! ```yaml
//! - test-linux:
//!     name: test-linux-gcc
//!     requires: [build-linux]
//! ```
//!
//! A non-empty inner `name` wins over the key.
//!
//! Decoding is lenient: an entry matching neither shape becomes an empty
//! `WorkflowJob` instead of failing the document. Every node is therefore
//! read with `deserialize_any` and consumed whole, whatever its shape.

use super::merge::{MergeSources, MERGE_KEY};
use super::schema::WorkflowJob;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;

fn skip_seq<'de, A: SeqAccess<'de>>(mut seq: A) -> Result<(), A::Error> {
    while seq.next_element::<IgnoredAny>()?.is_some() {}
    Ok(())
}

fn skip_map<'de, A: MapAccess<'de>>(mut map: A) -> Result<(), A::Error> {
    while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
    Ok(())
}

/// Text of a scalar node; `None` for a collection.
struct Text(Option<String>);

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TextVisitor)
    }
}

struct TextVisitor;

impl<'de> Visitor<'de> for TextVisitor {
    type Value = Text;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any YAML node")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Text, E> {
        Ok(Text(Some(value.to_string())))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Text, E> {
        Ok(Text(Some(value)))
    }

    // Plain scalars that resolve to numbers or booleans reach the visitor
    // already parsed.
    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Text, E> {
        Ok(Text(Some(value.to_string())))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Text, E> {
        Ok(Text(Some(value.to_string())))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Text, E> {
        Ok(Text(Some(value.to_string())))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Text, E> {
        Ok(Text(Some(value.to_string())))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Text, E> {
        Ok(Text(Some(String::new())))
    }

    fn visit_none<E: de::Error>(self) -> Result<Text, E> {
        Ok(Text(Some(String::new())))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Text, A::Error> {
        skip_seq(seq)?;
        Ok(Text(None))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Text, A::Error> {
        skip_map(map)?;
        Ok(Text(None))
    }
}

/// A `requires` list; `None` unless the node is a sequence of scalars.
struct Names(Option<Vec<String>>);

impl<'de> Deserialize<'de> for Names {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NamesVisitor)
    }
}

struct NamesVisitor;

impl<'de> Visitor<'de> for NamesVisitor {
    type Value = Names;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any YAML node")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Names, E> {
        Ok(Names(Some(Vec::new())))
    }

    fn visit_none<E: de::Error>(self) -> Result<Names, E> {
        Ok(Names(Some(Vec::new())))
    }

    fn visit_str<E: de::Error>(self, _value: &str) -> Result<Names, E> {
        Ok(Names(None))
    }

    fn visit_bool<E: de::Error>(self, _value: bool) -> Result<Names, E> {
        Ok(Names(None))
    }

    fn visit_i64<E: de::Error>(self, _value: i64) -> Result<Names, E> {
        Ok(Names(None))
    }

    fn visit_u64<E: de::Error>(self, _value: u64) -> Result<Names, E> {
        Ok(Names(None))
    }

    fn visit_f64<E: de::Error>(self, _value: f64) -> Result<Names, E> {
        Ok(Names(None))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Names, A::Error> {
        let mut names = Vec::new();
        let mut valid = true;
        while let Some(Text(item)) = seq.next_element()? {
            match item {
                Some(name) => names.push(name),
                None => valid = false,
            }
        }
        Ok(Names(valid.then_some(names)))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Names, A::Error> {
        skip_map(map)?;
        Ok(Names(None))
    }
}

/// Inner mapping of the keyed form. Keys such as `context` or `filters` are ignored.
#[derive(Debug, Default)]
struct Invocation {
    name: Option<String>,
    requires: Option<Vec<String>>,
}

impl Invocation {
    fn into_job(self, key: String) -> WorkflowJob {
        WorkflowJob {
            name: self.name.filter(|name| !name.is_empty()).unwrap_or(key),
            requires: self.requires.unwrap_or_default(),
        }
    }
}

/// `None` when the node cannot be read as an invocation.
struct InvocationNode(Option<Invocation>);

impl<'de> Deserialize<'de> for InvocationNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(InvocationVisitor)
    }
}

struct InvocationVisitor;

impl<'de> Visitor<'de> for InvocationVisitor {
    type Value = InvocationNode;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any YAML node")
    }

    fn visit_unit<E: de::Error>(self) -> Result<InvocationNode, E> {
        Ok(InvocationNode(Some(Invocation::default())))
    }

    fn visit_none<E: de::Error>(self) -> Result<InvocationNode, E> {
        Ok(InvocationNode(Some(Invocation::default())))
    }

    fn visit_str<E: de::Error>(self, _value: &str) -> Result<InvocationNode, E> {
        Ok(InvocationNode(None))
    }

    fn visit_bool<E: de::Error>(self, _value: bool) -> Result<InvocationNode, E> {
        Ok(InvocationNode(None))
    }

    fn visit_i64<E: de::Error>(self, _value: i64) -> Result<InvocationNode, E> {
        Ok(InvocationNode(None))
    }

    fn visit_u64<E: de::Error>(self, _value: u64) -> Result<InvocationNode, E> {
        Ok(InvocationNode(None))
    }

    fn visit_f64<E: de::Error>(self, _value: f64) -> Result<InvocationNode, E> {
        Ok(InvocationNode(None))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<InvocationNode, A::Error> {
        skip_seq(seq)?;
        Ok(InvocationNode(None))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<InvocationNode, A::Error> {
        let mut invocation = Invocation::default();
        let mut sources = Vec::new();
        let mut valid = true;
        while let Some(Text(key)) = map.next_key()? {
            match key.as_deref() {
                Some("name") => match map.next_value::<Text>()? {
                    Text(Some(name)) => invocation.name = Some(name),
                    Text(None) => valid = false,
                },
                Some("requires") => match map.next_value::<Names>()? {
                    Names(Some(requires)) => invocation.requires = Some(requires),
                    Names(None) => valid = false,
                },
                Some(MERGE_KEY) => {
                    let MergeSources(found) = map.next_value::<MergeSources<InvocationNode>>()?;
                    sources.extend(found);
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        for InvocationNode(base) in sources {
            match base {
                Some(base) => {
                    invocation.name = invocation.name.or(base.name);
                    invocation.requires = invocation.requires.or(base.requires);
                }
                None => valid = false,
            }
        }
        Ok(InvocationNode(valid.then_some(invocation)))
    }
}

impl<'de> Deserialize<'de> for WorkflowJob {
    /// Tries the keyed form first, then the bare name. A node matching
    /// neither yields an empty `WorkflowJob`; only invalid YAML and malformed
    /// merge keys fail here.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(WorkflowJobVisitor)
    }
}

struct WorkflowJobVisitor;

impl WorkflowJobVisitor {
    fn bare(name: String) -> WorkflowJob {
        WorkflowJob {
            name,
            requires: Vec::new(),
        }
    }
}

impl<'de> Visitor<'de> for WorkflowJobVisitor {
    type Value = WorkflowJob;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a job name or a mapping from job name to invocation")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<WorkflowJob, E> {
        Ok(Self::bare(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<WorkflowJob, E> {
        Ok(Self::bare(value))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<WorkflowJob, E> {
        Ok(Self::bare(value.to_string()))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<WorkflowJob, E> {
        Ok(Self::bare(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<WorkflowJob, E> {
        Ok(Self::bare(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<WorkflowJob, E> {
        Ok(Self::bare(value.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<WorkflowJob, E> {
        Ok(WorkflowJob::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<WorkflowJob, E> {
        Ok(WorkflowJob::default())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<WorkflowJob, A::Error> {
        skip_seq(seq)?;
        Ok(WorkflowJob::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<WorkflowJob, A::Error> {
        let mut first = None;
        let mut valid = true;
        while let Some(Text(key)) = map.next_key()? {
            let InvocationNode(invocation) = map.next_value()?;
            match (key, invocation) {
                (Some(key), Some(invocation)) if first.is_none() => {
                    first = Some((key, invocation));
                }
                (Some(_), Some(_)) => {}
                _ => valid = false,
            }
        }
        Ok(match first {
            Some((key, invocation)) if valid => invocation.into_job(key),
            _ => WorkflowJob::default(),
        })
    }
}
