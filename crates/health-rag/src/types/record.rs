//! Per-user record merged from every contributing data source

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Attribute holding the provenance tag of the most recent contributor
pub const DATA_SOURCE_KEY: &str = "data_source";

/// One user's attributes, merged across all sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// User identifier
    pub user_id: String,
    /// Attribute name to value; later sources overwrite earlier ones
    pub attributes: BTreeMap<String, Value>,
}

/// A single attribute that could not be read as a number.
///
/// Never fatal: the attribute is excluded from scoring and the pipeline continues.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("user '{user_id}': attribute '{attribute}' is not numeric ({value})")]
pub struct DataIssue {
    /// User the attribute belongs to
    pub user_id: String,
    /// Attribute name
    pub attribute: String,
    /// Offending value, rendered as JSON
    pub value: String,
}

impl UserRecord {
    /// Create an empty record
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Overwrite same-named attributes, add unseen ones, and stamp the provenance tag
    pub fn merge<I>(&mut self, attributes: I, source: &str)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        for (key, value) in attributes {
            self.attributes.insert(key, value);
        }
        self.attributes
            .insert(DATA_SOURCE_KEY.to_string(), Value::String(source.to_string()));
    }

    /// Raw attribute value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Whether the attribute is present
    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Provenance tag of the most recent merge
    pub fn data_source(&self) -> Option<&str> {
        self.get(DATA_SOURCE_KEY).and_then(Value::as_str)
    }

    /// Read an attribute as a number.
    ///
    /// Absent, null and blank values are `Ok(None)`; numeric strings are parsed;
    /// anything else is a [`DataIssue`].
    pub fn numeric(&self, key: &str) -> Result<Option<f64>, DataIssue> {
        let value = match self.get(key) {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };

        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) if s.trim().is_empty() => return Ok(None),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        match parsed {
            Some(n) if n.is_finite() => Ok(Some(n)),
            _ => Err(DataIssue {
                user_id: self.user_id.clone(),
                attribute: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Whether an attribute is set to a truthy flag (true, non-zero, "true"/"yes"/"1")
    pub fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => {
                matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1")
            }
            _ => false,
        }
    }
}
