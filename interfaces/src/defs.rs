use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DEFAULT_MAX_ITEMS: usize = 30;

/// One displayable unit, whatever source it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub title: String,
    pub link: String,
    #[serde(rename = "date")]
    pub published_at: DateTime<Utc>,
    #[serde(rename = "source")]
    pub source_name: String,
    #[serde(default)]
    pub summary: String,
}

impl NormalizedItem {
    /// Identity used for deduplication.
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.source_name, &self.link)
    }
}

/// Per-source minimum inclusion counts, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceQuotas(Vec<(String, usize)>);

impl SourceQuotas {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Later declarations of the same source replace the count but keep the first position.
    pub fn insert(&mut self, source: impl Into<String>, min_items: usize) {
        let source = source.into();
        match self.0.iter_mut().find(|(name, _)| *name == source) {
            Some(entry) => entry.1 = min_items,
            None => self.0.push((source, min_items)),
        }
    }

    pub fn get(&self, source: &str) -> Option<usize> {
        self.0
            .iter()
            .find(|(name, _)| name == source)
            .map(|(_, min)| *min)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(name, min)| (name.as_str(), *min))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for SourceQuotas {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        let mut quotas = SourceQuotas::new();
        for (source, min_items) in iter {
            quotas.insert(source, min_items);
        }
        quotas
    }
}

impl Serialize for SourceQuotas {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, min) in &self.0 {
            map.serialize_entry(name, min)?;
        }
        map.end()
    }
}

struct SourceQuotasVisitor;

impl<'de> Visitor<'de> for SourceQuotasVisitor {
    type Value = SourceQuotas;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of source name to minimum item count")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut quotas = SourceQuotas::new();
        while let Some((name, min)) = access.next_entry::<String, usize>()? {
            quotas.insert(name, min);
        }
        Ok(quotas)
    }
}

impl<'de> Deserialize<'de> for SourceQuotas {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SourceQuotasVisitor)
    }
}

/// Run-wide selection policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionConfig {
    #[serde(default = "default_max_items", alias = "maxNewsItems")]
    pub max_items: usize,
    #[serde(default)]
    pub source_min_items: SourceQuotas,
    // Not interpreted yet; only recency ordering exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_mode: Option<serde_json::Value>,
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            source_min_items: SourceQuotas::new(),
            sort_mode: None,
        }
    }
}
