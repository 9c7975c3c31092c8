//! Attribute map shared by every visual entity.

use std::collections::BTreeMap;

/// Style key → value map.
///
/// Stored sorted so that any walk over it (and therefore the serialized
/// output) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs(BTreeMap<String, String>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a fixed table of pairs.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Append `line` to a newline-joined value, creating it if absent.
    pub fn append_line(&mut self, key: &str, line: &str) {
        match self.0.get_mut(key) {
            Some(value) => {
                value.push('\n');
                value.push_str(line);
            }
            None => {
                self.0.insert(key.to_string(), line.to_string());
            }
        }
    }

    /// Iterate pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Attrs
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
