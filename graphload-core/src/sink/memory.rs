//! Recording in-memory sink for tests.

use crate::error::SinkError;

use super::{GraphSink, NodeRef, PropertyBag, PropertyValue, SchemaRule, SchemaRuleKind};

/// A node as recorded by [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedNode {
    pub id: NodeRef,
    pub labels: Vec<String>,
    pub properties: PropertyBag,
}

/// A relationship as recorded by [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRelationship {
    pub from: NodeRef,
    pub to: NodeRef,
    pub rel_type: String,
    pub properties: PropertyBag,
}

/// Sink that keeps everything in vectors so tests can inspect the result.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub nodes: Vec<RecordedNode>,
    pub relationships: Vec<RecordedRelationship>,
    pub rules: Vec<SchemaRule>,
    pub finalized: bool,
    /// When set, `create_node` rejects nodes carrying this label. Lets
    /// tests exercise the fatal-persistence path.
    reject_label: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any future node carrying `label`.
    pub fn reject_label(&mut self, label: &str) {
        self.reject_label = Some(label.to_string());
    }

    pub fn node(&self, id: NodeRef) -> Option<&RecordedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The node whose `dbId` property equals `db_id`.
    pub fn node_by_db_id(&self, db_id: i64) -> Option<&RecordedNode> {
        self.nodes
            .iter()
            .find(|n| n.properties.get("dbId") == Some(&PropertyValue::Int(db_id)))
    }

    pub fn relationships_of_type(&self, rel_type: &str) -> Vec<&RecordedRelationship> {
        self.relationships
            .iter()
            .filter(|r| r.rel_type == rel_type)
            .collect()
    }

    pub fn relationship(
        &self,
        from: NodeRef,
        to: NodeRef,
        rel_type: &str,
    ) -> Option<&RecordedRelationship> {
        self.relationships
            .iter()
            .find(|r| r.from == from && r.to == to && r.rel_type == rel_type)
    }

    pub fn unique_rules(&self) -> Vec<&SchemaRule> {
        self.rules
            .iter()
            .filter(|r| r.kind == SchemaRuleKind::Unique)
            .collect()
    }
}

impl GraphSink for MemorySink {
    fn create_node(
        &mut self,
        labels: &[String],
        properties: &PropertyBag,
    ) -> Result<NodeRef, SinkError> {
        if self.finalized {
            return Err(SinkError::Finalized);
        }
        if let Some(rejected) = &self.reject_label {
            if labels.iter().any(|l| l == rejected) {
                return Err(SinkError::Rejected(format!("label {rejected} rejected")));
            }
        }
        let id = NodeRef(self.nodes.len() as u64);
        self.nodes.push(RecordedNode {
            id,
            labels: labels.to_vec(),
            properties: properties.clone(),
        });
        Ok(id)
    }

    fn create_relationship(
        &mut self,
        from: NodeRef,
        to: NodeRef,
        rel_type: &str,
        properties: &PropertyBag,
    ) -> Result<(), SinkError> {
        if self.finalized {
            return Err(SinkError::Finalized);
        }
        let known = |node: NodeRef| node.0 < self.nodes.len() as u64;
        if !known(from) || !known(to) {
            return Err(SinkError::Rejected(format!(
                "relationship {rel_type} references unknown node"
            )));
        }
        self.relationships.push(RecordedRelationship {
            from,
            to,
            rel_type: rel_type.to_string(),
            properties: properties.clone(),
        });
        Ok(())
    }

    fn declare_unique(&mut self, label: &str, property: &str) {
        self.rules.push(SchemaRule {
            label: label.to_string(),
            property: property.to_string(),
            kind: SchemaRuleKind::Unique,
        });
    }

    fn declare_index(&mut self, label: &str, property: &str) {
        self.rules.push(SchemaRule {
            label: label.to_string(),
            property: property.to_string(),
            kind: SchemaRuleKind::Index,
        });
    }

    fn shutdown(&mut self) -> Result<(), SinkError> {
        if self.finalized {
            return Err(SinkError::Finalized);
        }
        self.finalized = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_finalizes_once() {
        let mut sink = MemorySink::new();
        let mut bag = PropertyBag::new();
        bag.insert("dbId", 5i64);
        let node = sink.create_node(&["Pathway".to_string()], &bag).unwrap();

        assert_eq!(sink.node_by_db_id(5).map(|n| n.id), Some(node));
        sink.shutdown().unwrap();
        assert!(matches!(sink.shutdown(), Err(SinkError::Finalized)));
    }

    #[test]
    fn label_rejection_simulates_bad_records() {
        let mut sink = MemorySink::new();
        sink.reject_label("Broken");
        assert!(
            sink.create_node(&["Broken".to_string()], &PropertyBag::new())
                .is_err()
        );
        assert!(
            sink.create_node(&["Fine".to_string()], &PropertyBag::new())
                .is_ok()
        );
    }
}
