//! Path-aware lookups over a parsed webhook body
//!
//! GitLab payloads are read as `serde_json::Value` so that a missing field can
//! be reported by its dotted path (`project.web_url`, `builds[2].name`)
//! instead of failing the whole deserialization.

use serde_json::Value;

use crate::error::{RelayError, Result};

/// A JSON node together with the path it was reached by
#[derive(Debug, Clone)]
pub struct Field<'a> {
    value: Option<&'a Value>,
    path: String,
}

impl<'a> Field<'a> {
    pub fn root(value: &'a Value) -> Self {
        Self {
            value: Some(value),
            path: String::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Descend into an object key
    pub fn get(&self, key: &str) -> Field<'a> {
        let path = if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        };
        Field {
            value: self.value.and_then(|v| v.get(key)),
            path,
        }
    }

    /// Present and not JSON null
    pub fn is_present(&self) -> bool {
        matches!(self.value, Some(v) if !v.is_null())
    }

    /// Required string field
    pub fn str(&self) -> Result<&'a str> {
        self.opt_str()
            .ok_or_else(|| RelayError::missing(self.path.clone()))
    }

    /// Optional string field; absent, null or non-string all read as `None`
    pub fn opt_str(&self) -> Option<&'a str> {
        self.value.and_then(Value::as_str)
    }

    /// Required integer field
    pub fn u64(&self) -> Result<u64> {
        self.opt_u64()
            .ok_or_else(|| RelayError::missing(self.path.clone()))
    }

    pub fn opt_u64(&self) -> Option<u64> {
        self.value.and_then(Value::as_u64)
    }

    /// Required value rendered for display; strings as-is, numbers in decimal
    pub fn display(&self) -> Result<String> {
        match self.value {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(RelayError::missing(self.path.clone())),
        }
    }

    /// Elements of an array field; absent or null reads as empty
    pub fn items(&self) -> Vec<Field<'a>> {
        match self.value.and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| Field {
                    value: Some(item),
                    path: format!("{}[{}]", self.path, idx),
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// String elements of an array field, skipping anything that isn't a string
    pub fn strings(&self) -> Vec<&'a str> {
        self.items().iter().filter_map(Field::opt_str).collect()
    }
}
