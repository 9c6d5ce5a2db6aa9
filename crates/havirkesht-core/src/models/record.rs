use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One list item as returned by the backend.
///
/// Field names vary between backend versions (`province` vs `name`), so
/// items stay as JSON and are read through the catalogue's fallback rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Value);

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl Record {
    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// String or number field as text. Empty strings and nulls are absent.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn first_text(&self, fields: &[&str]) -> Option<String> {
        fields.iter().find_map(|field| self.text(field))
    }

    pub fn int(&self, field: &str) -> Option<i64> {
        match self.0.get(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn bool(&self, field: &str) -> Option<bool> {
        self.0.get(field)?.as_bool()
    }
}

/// The `{items, total}` envelope of every list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<Record>,
    #[serde(default)]
    pub total: Option<u64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Record>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Record>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Page {
    /// Decode a list body. A null body is an empty page.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
    }

    /// Server-side filtered count, falling back to the items received.
    pub fn total(&self) -> u64 {
        self.total.unwrap_or(self.items.len() as u64)
    }
}

/// An entry of a parent-filter dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}
