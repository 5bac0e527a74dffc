//! Response shapes of the threat-intelligence API.
//!
//! Lists look like `{"data": [{"id": .., "attributes": {..}}], "meta": {"next": ..}}`,
//! single lookups like `{"data": {..}}`.

use crate::utils::time;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntityPage {
    #[serde(default)]
    pub data: Vec<Entity>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

impl EntityPage {
    /// Cursor for the following page, if the server handed one out.
    pub fn next_cursor(&self) -> Option<String> {
        self.meta
            .as_ref()
            .and_then(|m| m.next.clone().or_else(|| m.cursor.clone()))
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntityObject {
    pub data: Entity,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Entity {
    /// Bare entity known only by id.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// `creation_date` in Unix seconds, when present as a number.
    pub fn creation_date(&self) -> Option<i64> {
        let value = self.attributes.get("creation_date")?;
        value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.creation_date().and_then(time::from_unix)
    }

    pub fn name(&self) -> Option<&str> {
        self.str_attr("name")
    }

    /// Alias, then name, then the raw id.
    pub fn display_name(&self) -> &str {
        self.alias().or_else(|| self.name()).unwrap_or(self.id.as_str())
    }

    pub fn description(&self) -> Option<&str> {
        self.str_attr("description").or_else(|| self.str_attr("summary"))
    }

    fn alias(&self) -> Option<&str> {
        match self.attributes.get("alias")? {
            Value::String(s) => Some(s.trim()).filter(|s| !s.is_empty()),
            Value::Array(values) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .find(|s| !s.is_empty()),
            _ => None,
        }
    }

    fn str_attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
