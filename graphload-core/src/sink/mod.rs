//! Write side of the import: an append-only bulk graph sink.
//!
//! Mirrors the batch-insertion contract of a property-graph bulk loader:
//! nodes and relationships are only ever created, never read back or
//! mutated; uniqueness constraints and indexes are declared up front but
//! deferred until [`GraphSink::shutdown`] finalizes the store.

pub mod bulk;
pub mod memory;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::SinkError;

pub use bulk::BulkSink;
pub use memory::{MemorySink, RecordedNode, RecordedRelationship};

/// Sink-local node identity. Only meaningful within one bulk load; the
/// durable identity of a node is its `dbId` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeRef(pub u64);

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A property value as persisted on a node or relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    StrList(Vec<String>),
    IntList(Vec<i64>),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Ordered property map. Ordering keeps the sink's on-disk output
/// deterministic for identical inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropertyBag(BTreeMap<String, PropertyValue>);

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<PropertyValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }
}

/// Declared deferred constraint or index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaRule {
    pub label: String,
    pub property: String,
    pub kind: SchemaRuleKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaRuleKind {
    Unique,
    Index,
}

/// Append-only graph writer.
pub trait GraphSink {
    /// Create a node, returning its sink-local id.
    fn create_node(&mut self, labels: &[String], properties: &PropertyBag)
    -> Result<NodeRef, SinkError>;

    /// Create a directed relationship between two existing nodes.
    fn create_relationship(
        &mut self,
        from: NodeRef,
        to: NodeRef,
        rel_type: &str,
        properties: &PropertyBag,
    ) -> Result<(), SinkError>;

    /// Declare a uniqueness constraint, enforced after shutdown.
    fn declare_unique(&mut self, label: &str, property: &str);

    /// Declare an index, built after shutdown.
    fn declare_index(&mut self, label: &str, property: &str);

    /// Finalize the store. Must run exactly once; any write after it (or a
    /// second shutdown) fails with [`SinkError::Finalized`].
    fn shutdown(&mut self) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_values_serialize_naturally() {
        let mut bag = PropertyBag::new();
        bag.insert("dbId", 42i64);
        bag.insert("displayName", "thing");
        bag.insert("flag", true);
        bag.insert("names", PropertyValue::StrList(vec!["a".into(), "b".into()]));

        let json = serde_json::to_string(&bag).unwrap();
        assert_eq!(
            json,
            r#"{"dbId":42,"displayName":"thing","flag":true,"names":["a","b"]}"#
        );
    }
}
