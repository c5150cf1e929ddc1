//! Incremental HAR decoding on top of serde.
//!
//! The document is walked with seeded visitors: the top-level object, its
//! `log` member and the `entries` array are visited in place, each array
//! element is handed to the caller as soon as it is decoded, and every other
//! member is skipped with `IgnoredAny`. Nothing but the current entry is held
//! in memory.

use std::fmt;
use std::io::Read;
use std::ops::ControlFlow;

use harscope_core::Entry;
use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserializer as _;
use serde_json::value::RawValue;

/// Returned through serde when the callback asks to stop.
pub(crate) const STOPPED: &str = "ingestion stopped";

/// `log` members other than `entries` that are carried into exports.
#[derive(Debug, Clone, Default)]
pub struct LogMeta {
    pub version: Option<String>,
    pub creator: Option<Box<RawValue>>,
}

pub(crate) type OnEntry<'f> = dyn FnMut(Entry, Box<RawValue>) -> ControlFlow<()> + 'f;

/// Streams every entry of the HAR document in `reader` into `on_entry`.
pub(crate) fn stream_entries<R: Read>(
    reader: R,
    meta: &mut LogMeta,
    on_entry: &mut OnEntry<'_>,
) -> Result<(), serde_json::Error> {
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    (&mut deserializer).deserialize_map(DocumentVisitor { meta, on_entry })?;
    deserializer.end()
}

struct DocumentVisitor<'a, 'f> {
    meta: &'a mut LogMeta,
    on_entry: &'a mut OnEntry<'f>,
}

impl<'de> Visitor<'de> for DocumentVisitor<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a HAR document object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            if key == "log" {
                map.next_value_seed(LogSeed {
                    meta: &mut *self.meta,
                    on_entry: &mut *self.on_entry,
                })?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

struct LogSeed<'a, 'f> {
    meta: &'a mut LogMeta,
    on_entry: &'a mut OnEntry<'f>,
}

impl<'de> DeserializeSeed<'de> for LogSeed<'_, '_> {
    type Value = ();

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for LogSeed<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a HAR log object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "entries" => map.next_value_seed(EntriesSeed {
                    on_entry: &mut *self.on_entry,
                })?,
                "version" => self.meta.version = map.next_value::<Option<String>>()?,
                "creator" => self.meta.creator = Some(map.next_value::<Box<RawValue>>()?),
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(())
    }
}

struct EntriesSeed<'a, 'f> {
    on_entry: &'a mut OnEntry<'f>,
}

impl<'de> DeserializeSeed<'de> for EntriesSeed<'_, '_> {
    type Value = ();

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for EntriesSeed<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array of HAR entries")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        while let Some(raw) = seq.next_element::<Box<RawValue>>()? {
            let entry: Entry = serde_json::from_str(raw.get()).map_err(de::Error::custom)?;
            if (self.on_entry)(entry, raw).is_break() {
                return Err(de::Error::custom(STOPPED));
            }
        }
        Ok(())
    }
}
