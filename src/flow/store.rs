// SPDX-License-Identifier: MIT

//! Workflow-scoped auxiliary data carried by a context

use serde_json::Value;
use std::collections::HashMap;

/// Mutable key/value data activities may share during a run.
///
/// The engine never reads it; it only travels with the context and is copied
/// into history snapshots along with the current state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    fields: HashMap<String, Value>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value
    pub fn update(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }

    /// Get a field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a nested field value using dot notation (e.g., "order.total")
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Add `by` to a numeric field, treating a missing field as zero.
    /// Returns the new value, or `None` if the field holds a non-integer.
    pub fn increment(&mut self, key: &str, by: i64) -> Option<i64> {
        let current = match self.fields.get(key) {
            None => 0,
            Some(v) => v.as_i64()?,
        };
        let next = current + by;
        self.fields.insert(key.to_string(), Value::from(next));
        Some(next)
    }

    /// Get all field names
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert store to JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}
