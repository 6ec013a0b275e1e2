//! Field paths and record flattening

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::value::{Record, Value};

/// Flattened identifier of one scoring unit, e.g. `policy_details.policy_number`
/// or `insured_objects[0].make_model`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of a named child field
    pub fn child(&self, key: &str) -> Self {
        Self(format!("{}.{}", self.0, key))
    }

    /// Path of an array item
    pub fn index(&self, i: usize) -> Self {
        Self(format!("{}[{}]", self.0, i))
    }

    /// Append a relative path below this one
    pub fn join(&self, rest: &FieldPath) -> Self {
        self.child(&rest.0)
    }

    /// Remainder of `other` when it names a field nested below this path.
    ///
    /// `header` relative to `header.claim_id` is `claim_id`, relative to
    /// `header[0]` it is `[0]`.
    pub fn relative<'a>(&self, other: &'a FieldPath) -> Option<&'a str> {
        let rest = other.0.strip_prefix(self.0.as_str())?;
        if let Some(child) = rest.strip_prefix('.') {
            (!child.is_empty()).then_some(child)
        } else if rest.starts_with('[') {
            Some(rest)
        } else {
            None
        }
    }

    pub fn is_ancestor_of(&self, other: &FieldPath) -> bool {
        self.relative(other).is_some()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FieldPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Turns a record into the ordered list of fields that get scored.
///
/// Any `Fn(&Record) -> Vec<(FieldPath, Value)>` closure is a flattener, so
/// benchmarks can inject their own transform without a new type.
pub trait Flattener: Send + Sync {
    fn flatten(&self, record: &Record) -> Vec<(FieldPath, Value)>;

    /// Label used in logs and debug output
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> Flattener for F
where
    F: Fn(&Record) -> Vec<(FieldPath, Value)> + Send + Sync,
{
    fn flatten(&self, record: &Record) -> Vec<(FieldPath, Value)> {
        self(record)
    }
}

/// Value of `path` within already flattened fields.
///
/// A path with no entry of its own but with entries nested below it (the
/// other side flattened a container where this side has a leaf) resolves to
/// an object of those entries keyed by their relative paths. `None` means
/// nothing at or below `path`.
pub fn resolve(fields: &IndexMap<FieldPath, Value>, path: &FieldPath) -> Option<Value> {
    if let Some(value) = fields.get(path.as_str()) {
        return Some(value.clone());
    }
    let nested: Record = fields
        .iter()
        .filter_map(|(p, v)| path.relative(p).map(|rest| (rest.to_string(), v.clone())))
        .collect();
    (!nested.is_empty()).then_some(Value::Object(nested))
}

/// One field per top-level key; nested values are compared whole
#[derive(Debug, Clone, Copy, Default)]
pub struct TopLevelFlattener;

impl Flattener for TopLevelFlattener {
    fn flatten(&self, record: &Record) -> Vec<(FieldPath, Value)> {
        record
            .iter()
            .map(|(key, value)| (FieldPath::new(key.as_str()), value.clone()))
            .collect()
    }

    fn name(&self) -> &str {
        "top_level"
    }
}

/// Descends into nested objects, joining keys with `.`.
///
/// Arrays stay leaves unless `index_arrays` is set, in which case each item
/// gets its own `key[i]` path. Empty objects and empty arrays are leaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NestedFlattener {
    index_arrays: bool,
}

impl NestedFlattener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indexed_arrays(mut self, index_arrays: bool) -> Self {
        self.index_arrays = index_arrays;
        self
    }

    fn walk(&self, path: FieldPath, value: &Value, out: &mut Vec<(FieldPath, Value)>) {
        match value {
            Value::Object(record) if !record.is_empty() => {
                for (key, child) in record {
                    self.walk(path.child(key), child, out);
                }
            }
            Value::Array(items) if self.index_arrays && !items.is_empty() => {
                for (i, item) in items.iter().enumerate() {
                    self.walk(path.index(i), item, out);
                }
            }
            leaf => out.push((path, leaf.clone())),
        }
    }
}

impl Flattener for NestedFlattener {
    fn flatten(&self, record: &Record) -> Vec<(FieldPath, Value)> {
        let mut out = Vec::with_capacity(record.len());
        for (key, value) in record {
            self.walk(FieldPath::new(key.as_str()), value, &mut out);
        }
        out
    }

    fn name(&self) -> &str {
        if self.index_arrays {
            "nested_indexed"
        } else {
            "nested"
        }
    }
}
