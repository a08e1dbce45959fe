//! Typed read access over a node's raw provider payload.
//!
//! Missing and `null` fields read as absent. A field that is present but has
//! the wrong JSON shape is a [`KnowledgeError::MalformedPayload`].

use serde_json::{Map, Value};

use super::error::KnowledgeError;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Payload<'a> {
    node_id: &'a str,
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> Payload<'a> {
    /// Wraps a top-level `raw_data` value. `null` is an empty payload.
    pub fn new(node_id: &'a str, raw: &'a Value) -> Result<Self, KnowledgeError> {
        match raw {
            Value::Object(map) => Ok(Self {
                node_id,
                fields: Some(map),
            }),
            Value::Null => Ok(Self {
                node_id,
                fields: None,
            }),
            other => Err(KnowledgeError::malformed(
                node_id,
                format!("raw_data must be an object, found {}", json_type(other)),
            )),
        }
    }

    /// A scalar field rendered as a string. Numbers are rendered in decimal;
    /// empty strings, booleans, arrays and objects read as absent.
    pub fn string(&self, key: &str) -> Option<String> {
        match self.fields?.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// A nested object field.
    pub fn object(&self, key: &str) -> Result<Payload<'a>, KnowledgeError> {
        match self.get(key) {
            None => Ok(self.empty()),
            Some(Value::Object(map)) => Ok(Self {
                node_id: self.node_id,
                fields: Some(map),
            }),
            Some(other) => Err(self.wrong_type(key, "an object", other)),
        }
    }

    /// A list of objects, e.g. `networkInterfaces`.
    pub fn objects(&self, key: &str) -> Result<Vec<Payload<'a>>, KnowledgeError> {
        self.list(key)?
            .iter()
            .map(|entry| match entry {
                Value::Object(map) => Ok(Self {
                    node_id: self.node_id,
                    fields: Some(map),
                }),
                other => Err(self.wrong_type(key, "a list of objects", other)),
            })
            .collect()
    }

    /// A list of strings, e.g. the `users` of a disk.
    pub fn strings(&self, key: &str) -> Result<Vec<&'a str>, KnowledgeError> {
        self.list(key)?
            .iter()
            .map(|entry| match entry {
                Value::String(s) => Ok(s.as_str()),
                other => Err(self.wrong_type(key, "a list of strings", other)),
            })
            .collect()
    }

    fn list(&self, key: &str) -> Result<&'a [Value], KnowledgeError> {
        match self.get(key) {
            None => Ok(&[]),
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(other) => Err(self.wrong_type(key, "a list", other)),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields?.get(key).filter(|v| !v.is_null())
    }

    fn empty(&self) -> Payload<'a> {
        Self {
            node_id: self.node_id,
            fields: None,
        }
    }

    fn wrong_type(&self, key: &str, expected: &str, found: &Value) -> KnowledgeError {
        KnowledgeError::malformed(
            self.node_id,
            format!("field '{}' must be {}, found {}", key, expected, json_type(found)),
        )
    }
}

/// Last path segment of a resource URL: `.../instances/vm-1` -> `vm-1`.
pub(crate) fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
