//! File-backed bulk sink.
//!
//! Writes JSON Lines into a target directory: one record per node in
//! `nodes.jsonl`, one per relationship in `relationships.jsonl`. Deferred
//! constraints and counts land in `manifest.json` at shutdown, which is
//! also the signal that the load is complete — a directory without a
//! manifest is a crashed run.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::SinkError;

use super::{GraphSink, NodeRef, PropertyBag, SchemaRule, SchemaRuleKind};

#[derive(Serialize)]
struct NodeRecord<'a> {
    id: u64,
    labels: &'a [String],
    properties: &'a PropertyBag,
}

#[derive(Serialize)]
struct RelationshipRecord<'a> {
    start: u64,
    end: u64,
    #[serde(rename = "type")]
    rel_type: &'a str,
    properties: &'a PropertyBag,
}

#[derive(Serialize)]
struct Manifest<'a> {
    nodes: u64,
    relationships: u64,
    rules: &'a [SchemaRule],
}

/// Append-only JSONL writer over a target directory.
#[derive(Debug)]
pub struct BulkSink {
    dir: PathBuf,
    nodes: BufWriter<File>,
    relationships: BufWriter<File>,
    rules: Vec<SchemaRule>,
    node_count: u64,
    relationship_count: u64,
    finalized: bool,
}

impl BulkSink {
    /// Open a sink over `dir`. An existing directory is cleared first, as
    /// a bulk load always starts from an empty store.
    pub fn open(dir: &Path) -> Result<Self, SinkError> {
        if dir.exists() {
            info!(dir = %dir.display(), "clearing previous target directory");
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;
        let nodes = BufWriter::new(File::create(dir.join("nodes.jsonl"))?);
        let relationships = BufWriter::new(File::create(dir.join("relationships.jsonl"))?);
        Ok(Self {
            dir: dir.to_path_buf(),
            nodes,
            relationships,
            rules: Vec::new(),
            node_count: 0,
            relationship_count: 0,
            finalized: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn check_open(&self) -> Result<(), SinkError> {
        if self.finalized {
            return Err(SinkError::Finalized);
        }
        Ok(())
    }

    fn check_node(&self, node: NodeRef) -> Result<(), SinkError> {
        if node.0 >= self.node_count {
            return Err(SinkError::Rejected(format!("unknown node id {node}")));
        }
        Ok(())
    }
}

impl GraphSink for BulkSink {
    fn create_node(
        &mut self,
        labels: &[String],
        properties: &PropertyBag,
    ) -> Result<NodeRef, SinkError> {
        self.check_open()?;
        if labels.is_empty() {
            return Err(SinkError::Rejected("node without labels".to_string()));
        }
        let id = self.node_count;
        let record = NodeRecord { id, labels, properties };
        serde_json::to_writer(&mut self.nodes, &record)?;
        self.nodes.write_all(b"\n")?;
        self.node_count += 1;
        Ok(NodeRef(id))
    }

    fn create_relationship(
        &mut self,
        from: NodeRef,
        to: NodeRef,
        rel_type: &str,
        properties: &PropertyBag,
    ) -> Result<(), SinkError> {
        self.check_open()?;
        self.check_node(from)?;
        self.check_node(to)?;
        let record = RelationshipRecord {
            start: from.0,
            end: to.0,
            rel_type,
            properties,
        };
        serde_json::to_writer(&mut self.relationships, &record)?;
        self.relationships.write_all(b"\n")?;
        self.relationship_count += 1;
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
        self.check_open()?;
        self.nodes.flush()?;
        self.relationships.flush()?;
        let manifest = Manifest {
            nodes: self.node_count,
            relationships: self.relationship_count,
            rules: &self.rules,
        };
        let file = File::create(self.dir.join("manifest.json"))?;
        serde_json::to_writer_pretty(file, &manifest)?;
        self.finalized = true;
        info!(
            nodes = self.node_count,
            relationships = self.relationship_count,
            "bulk sink finalized"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn bag(entries: &[(&str, i64)]) -> PropertyBag {
        let mut bag = PropertyBag::new();
        for (name, value) in entries {
            bag.insert(name, *value);
        }
        bag
    }

    #[test]
    fn writes_well_formed_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("graph");
        let mut sink = BulkSink::open(&target).unwrap();

        let a = sink
            .create_node(&["Pathway".to_string(), "Event".to_string()], &bag(&[("dbId", 1)]))
            .unwrap();
        let b = sink
            .create_node(&["Reaction".to_string()], &bag(&[("dbId", 2)]))
            .unwrap();
        sink.create_relationship(b, a, "hasEvent", &bag(&[("order", 0)])).unwrap();
        sink.declare_unique("DatabaseObject", "dbId");
        sink.shutdown().unwrap();

        let nodes = fs::read_to_string(target.join("nodes.jsonl")).unwrap();
        let lines: Vec<Value> = nodes
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["labels"][0], "Pathway");
        assert_eq!(lines[0]["properties"]["dbId"], 1);

        let rels = fs::read_to_string(target.join("relationships.jsonl")).unwrap();
        let rel: Value = serde_json::from_str(rels.lines().next().unwrap()).unwrap();
        assert_eq!(rel["start"], 1);
        assert_eq!(rel["end"], 0);
        assert_eq!(rel["type"], "hasEvent");

        let manifest: Value =
            serde_json::from_str(&fs::read_to_string(target.join("manifest.json")).unwrap())
                .unwrap();
        assert_eq!(manifest["nodes"], 2);
        assert_eq!(manifest["relationships"], 1);
        assert_eq!(manifest["rules"][0]["kind"], "unique");
    }

    #[test]
    fn rejects_writes_after_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = BulkSink::open(&dir.path().join("graph")).unwrap();
        let node = sink
            .create_node(&["Pathway".to_string()], &PropertyBag::new())
            .unwrap();
        sink.shutdown().unwrap();

        assert!(matches!(
            sink.create_node(&["Pathway".to_string()], &PropertyBag::new()),
            Err(SinkError::Finalized)
        ));
        assert!(matches!(
            sink.create_relationship(node, node, "x", &PropertyBag::new()),
            Err(SinkError::Finalized)
        ));
        assert!(matches!(sink.shutdown(), Err(SinkError::Finalized)));
    }

    #[test]
    fn rejects_unknown_endpoints_and_unlabeled_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = BulkSink::open(&dir.path().join("graph")).unwrap();
        assert!(matches!(
            sink.create_node(&[], &PropertyBag::new()),
            Err(SinkError::Rejected(_))
        ));
        let node = sink
            .create_node(&["Pathway".to_string()], &PropertyBag::new())
            .unwrap();
        assert!(matches!(
            sink.create_relationship(node, NodeRef(7), "x", &PropertyBag::new()),
            Err(SinkError::Rejected(_))
        ));
    }

    #[test]
    fn reopen_clears_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("graph");
        let mut sink = BulkSink::open(&target).unwrap();
        sink.create_node(&["Pathway".to_string()], &PropertyBag::new()).unwrap();
        sink.shutdown().unwrap();

        let sink = BulkSink::open(&target).unwrap();
        drop(sink);
        assert!(!target.join("manifest.json").exists());
        assert_eq!(fs::read_to_string(target.join("nodes.jsonl")).unwrap(), "");
    }
}
