//! Composite-key deduplication for nodes and links

use crate::graph::{lookup_path, value_key, Link, Node};
use itertools::Itertools;
use std::collections::HashSet;

/// Separator between key parts; not expected inside ids or addresses
const KEY_SEPARATOR: &str = "\u{1f}";

/// Read a field of a record by name or dot-separated path
pub trait FieldLookup {
    fn field(&self, path: &str) -> Option<String>;
}

impl FieldLookup for Node {
    fn field(&self, path: &str) -> Option<String> {
        match path {
            "id" => Some(self.id.clone()),
            "location.lat" => self.location.map(|l| l.lat.to_string()),
            "location.lng" => self.location.map(|l| l.lng.to_string()),
            _ => {
                let path = path.strip_prefix("attributes.").unwrap_or(path);
                lookup_path(&self.attributes, path).map(value_key)
            }
        }
    }
}

impl FieldLookup for Link {
    fn field(&self, path: &str) -> Option<String> {
        match path {
            "source" => Some(self.source.clone()),
            "target" => Some(self.target.clone()),
            "cost" => self.cost.map(|c| c.to_string()),
            _ => {
                let path = path.strip_prefix("attributes.").unwrap_or(path);
                lookup_path(&self.attributes, path).map(value_key)
            }
        }
    }
}

/// How the dedup key of a record is built
pub enum KeyStrategy<'a, T> {
    /// Join the values found at these field paths
    Fields(Vec<String>),
    /// Caller-supplied key function
    Custom(Box<dyn Fn(&T) -> String + 'a>),
}

impl<'a, T: FieldLookup> KeyStrategy<'a, T> {
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeyStrategy::Fields(fields.into_iter().map(Into::into).collect())
    }

    pub fn custom(f: impl Fn(&T) -> String + 'a) -> Self {
        KeyStrategy::Custom(Box::new(f))
    }

    fn is_noop(&self) -> bool {
        matches!(self, KeyStrategy::Fields(fields) if fields.is_empty())
    }

    /// Build the key for one item. Unordered keys sort their parts so
    /// that swapped field values collide.
    fn key(&self, item: &T, ordered: bool) -> String {
        match self {
            KeyStrategy::Custom(f) => f(item),
            KeyStrategy::Fields(fields) => {
                let mut parts = fields
                    .iter()
                    .map(|path| item.field(path).unwrap_or_default());
                if ordered {
                    parts.join(KEY_SEPARATOR)
                } else {
                    parts.sorted().join(KEY_SEPARATOR)
                }
            }
        }
    }
}

/// Output of [`dedupe`]
#[derive(Debug, Clone, PartialEq)]
pub struct Deduplicated<T> {
    /// Surviving items in original relative order
    pub items: Vec<T>,
    /// Keys of the dropped items, in drop order
    pub dropped: Vec<String>,
}

/// Keep the first item for every key and drop the rest.
///
/// Empty input or an empty field list returns the input untouched.
/// `ordered` only affects [`KeyStrategy::Fields`].
pub fn dedupe<T: FieldLookup>(
    items: Vec<T>,
    strategy: &KeyStrategy<'_, T>,
    ordered: bool,
) -> Deduplicated<T> {
    if items.is_empty() || strategy.is_noop() {
        return Deduplicated { items, dropped: Vec::new() };
    }

    let mut seen = HashSet::with_capacity(items.len());
    let mut kept = Vec::with_capacity(items.len());
    let mut dropped = Vec::new();

    for item in items {
        let key = strategy.key(&item, ordered);
        if seen.contains(&key) {
            log::debug!("Dropping duplicate record with key {:?}", key);
            dropped.push(key);
        } else {
            seen.insert(key);
            kept.push(item);
        }
    }

    if !dropped.is_empty() {
        log::info!(
            "Deduplication dropped {} of {} records",
            dropped.len(),
            kept.len() + dropped.len()
        );
    }

    Deduplicated { items: kept, dropped }
}
