//! Depth-first graph walk over the curation snapshot.
//!
//! The walk runs on an explicit task stack instead of call recursion: the
//! reachable subgraph under a top-level pathway is deep enough to make
//! stack depth a correctness issue. Each instance moves through import
//! (node written, identity registered), expansion (edge attributes
//! routed), and linking; registration happens before expansion, so cycles
//! terminate.

use std::rc::Rc;

use tracing::warn;

use crate::error::Result;
use crate::sink::{NodeRef, PropertyBag};
use crate::source::{DbId, SourceObject};

use super::aggregate::{self, Direction};
use super::classify::Classification;
use super::consistency::CheckedValue;
use super::session::ImportSession;

/// One pending unit of walk work. `Link` is pushed under the `Import` of
/// its child, so by the time it pops the child (and its whole subtree) is
/// registered.
enum Task {
    Import(SourceObject),
    Expand {
        object: SourceObject,
        node: NodeRef,
        classification: Rc<Classification>,
    },
    Link {
        kind: EdgeKind,
        owner: NodeRef,
        owner_id: DbId,
        child_id: DbId,
        properties: PropertyBag,
    },
}

/// How an edge job turns into a written relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EdgeKind {
    /// The child subtree is imported but no edge is written: the inverse
    /// side already links back.
    ImportOnly,
    /// Regular labeled edge, direction chosen per label.
    Labeled(String),
    /// Event-level inference, emitted child-first under `inferredTo`.
    ReversedInference,
}

/// One aggregated edge waiting for its target to be imported.
struct EdgeJob {
    kind: EdgeKind,
    target: SourceObject,
    properties: PropertyBag,
}

impl ImportSession<'_> {
    /// Import `root` and everything reachable from it. Returns the node of
    /// `root`; re-importing an already visited instance is a cheap lookup.
    pub(crate) fn import_object(&mut self, root: &SourceObject) -> Result<NodeRef> {
        let mut stack: Vec<Task> = Vec::new();
        let root_node = self.import_one(root, &mut stack)?;

        while let Some(task) = stack.pop() {
            match task {
                Task::Import(object) => {
                    self.import_one(&object, &mut stack)?;
                }
                Task::Expand { object, node, classification } => {
                    let jobs = self.collect_edges(&object, &classification)?;
                    // Reverse push: the first declared attribute's first
                    // child is imported (and linked) first.
                    for job in jobs.into_iter().rev() {
                        stack.push(Task::Link {
                            kind: job.kind,
                            owner: node,
                            owner_id: object.db_id,
                            child_id: job.target.db_id,
                            properties: job.properties,
                        });
                        stack.push(Task::Import(job.target));
                    }
                    self.source.deflate(object.db_id);
                }
                Task::Link { kind, owner, owner_id, child_id, properties } => {
                    let Some(&child) = self.db_ids.get(&child_id) else {
                        // Unreachable while imports are fatal; guarded so a
                        // future skip path cannot corrupt the walk.
                        warn!(db_id = %child_id, "link target never imported");
                        continue;
                    };
                    self.save_relationship(&kind, owner, owner_id, child, child_id, &properties);
                }
            }
        }
        Ok(root_node)
    }

    /// Translate one instance and schedule its expansion. Registration in
    /// the identity registry precedes expansion.
    fn import_one(&mut self, object: &SourceObject, stack: &mut Vec<Task>) -> Result<NodeRef> {
        if let Some(&node) = self.db_ids.get(&object.db_id) {
            return Ok(node);
        }
        let class = self.resolve_class(object);
        let classification =
            self.classifier
                .classify(&class, self.model, &mut self.introspector, self.source)?;
        let node = self.save_object(object, &class, &classification)?;
        self.db_ids.insert(object.db_id, node);
        self.discarded.remove(&object.db_id);
        self.progress
            .set_position((self.db_ids.len() + self.discarded.len()) as u64);
        stack.push(Task::Expand {
            object: object.clone(),
            node,
            classification,
        });
        Ok(node)
    }

    /// Route every edge attribute of the instance into aggregated edge
    /// jobs, applying the per-attribute special cases.
    fn collect_edges(
        &mut self,
        object: &SourceObject,
        classification: &Classification,
    ) -> Result<Vec<EdgeJob>> {
        let mut jobs = Vec::new();
        for spec in &classification.relationships {
            match spec.target.as_str() {
                // Orthology is only followed for curated events. Targets
                // that already point back through the inference attribute
                // are imported without a link so the forward edge is not
                // duplicated; the rest link under the inference label.
                "orthologousEvent" => {
                    if !self.is_curated_event(object.db_id) {
                        continue;
                    }
                    let all = self.references(object.db_id, &spec.origin)?;
                    if all.is_empty() {
                        continue;
                    }
                    let pointing_back: Vec<DbId> = self
                        .source
                        .referrers(object.db_id, "inferredFrom")?
                        .into_iter()
                        .map(|o| o.db_id)
                        .collect();
                    let mut linked = Vec::new();
                    for orthologous in all {
                        if pointing_back.contains(&orthologous.db_id) {
                            jobs.push(EdgeJob {
                                kind: EdgeKind::ImportOnly,
                                target: orthologous,
                                properties: PropertyBag::new(),
                            });
                        } else {
                            linked.push(orthologous);
                        }
                    }
                    push_aggregated(&mut jobs, EdgeKind::Labeled("inferredTo".into()), &linked);
                }
                // Event-level inference links are re-emitted reversed, so
                // the graph only carries the forward label.
                "inferredFrom" => {
                    let targets = self.references(object.db_id, &spec.origin)?;
                    push_aggregated(&mut jobs, EdgeKind::ReversedInference, &targets);
                }
                // Entity-level forward inference, falling back to the
                // inverse lookup when the forward slot is empty.
                "inferredTo" => {
                    let mut targets = self.references(object.db_id, &spec.origin)?;
                    if targets.is_empty() {
                        targets = self.source.referrers(object.db_id, "inferredFrom")?;
                    }
                    push_aggregated(&mut jobs, EdgeKind::Labeled("inferredTo".into()), &targets);
                }
                // The full modification trail, bypassing the latest-wins
                // collapse applied to `modified` below.
                "modifiedList" => {
                    let targets = self.references(object.db_id, "modified")?;
                    push_aggregated(&mut jobs, EdgeKind::Labeled("modifiedList".into()), &targets);
                }
                "modified" => {
                    let targets = self.references(object.db_id, &spec.origin)?;
                    match aggregate::latest_modified(&targets, self.source) {
                        Some((chosen, dropped)) => {
                            for candidate in dropped {
                                if !self.db_ids.contains_key(&candidate.db_id) {
                                    self.discarded.insert(candidate.db_id);
                                }
                            }
                            push_aggregated(&mut jobs, EdgeKind::Labeled("modified".into()), &[chosen]);
                        }
                        None => {
                            push_aggregated(&mut jobs, EdgeKind::Labeled("modified".into()), &targets);
                        }
                    }
                }
                _ => {
                    let Some(category) = spec.category else { continue };
                    let targets = self.references(object.db_id, &spec.origin)?;
                    // Absent and zero-element slots read the same from the
                    // snapshot, so both check as missing.
                    if targets.is_empty() {
                        self.ledger.check(
                            object,
                            &classification.class,
                            &spec.origin,
                            category,
                            &CheckedValue::Missing,
                        );
                        continue;
                    }
                    push_aggregated(&mut jobs, EdgeKind::Labeled(spec.target.clone()), &targets);
                }
            }
        }
        Ok(jobs)
    }

    /// Write one aggregated edge, applying direction, the reversed
    /// inference label, and the symmetric dedup registries.
    fn save_relationship(
        &mut self,
        kind: &EdgeKind,
        owner: NodeRef,
        owner_id: DbId,
        child: NodeRef,
        child_id: DbId,
        properties: &PropertyBag,
    ) {
        let (label, from, to) = match kind {
            EdgeKind::ImportOnly => return,
            EdgeKind::ReversedInference => ("inferredTo", child, owner),
            EdgeKind::Labeled(label) => match label.as_str() {
                "reverseReaction" => {
                    if !self.reverse_pairs.insert(owner_id, child_id) {
                        return;
                    }
                    ("reverseReaction", owner, child)
                }
                "equivalentTo" => {
                    if !self.equivalent_pairs.insert(owner_id, child_id) {
                        return;
                    }
                    ("equivalentTo", owner, child)
                }
                label => match aggregate::direction(label) {
                    Direction::OwnerToChild => (label, owner, child),
                    Direction::ChildToOwner => (label, child, owner),
                },
            },
        };
        if let Err(e) = self.sink.create_relationship(from, to, label, properties) {
            warn!(rel_type = label, owner = %owner_id, child = %child_id, error = %e, "cannot write relationship");
        }
    }

    /// Resolve an edge attribute's raw reference list, skipping dangling
    /// and non-reference slots with a warning.
    fn references(&self, id: DbId, attribute: &str) -> Result<Vec<SourceObject>> {
        let mut out = Vec::new();
        for value in self.source.values(id, attribute)? {
            let Some(target) = value.as_ref_id() else {
                warn!(db_id = %id, attribute, "non-reference value in edge attribute");
                continue;
            };
            match self.source.fetch_instance(target)? {
                Some(object) => out.push(object),
                None => warn!(db_id = %id, attribute, target = %target, "dangling reference"),
            }
        }
        Ok(out)
    }

    /// Curated events carry the release flag; uncurated orthology stubs do
    /// not get forward inference edges.
    fn is_curated_event(&self, id: DbId) -> bool {
        match self.source.first_value(id, "_doRelease") {
            Ok(value) => value.is_some(),
            Err(e) => {
                warn!(db_id = %id, error = %e, "cannot read release flag");
                false
            }
        }
    }
}

fn push_aggregated(jobs: &mut Vec<EdgeJob>, kind: EdgeKind, targets: &[SourceObject]) {
    for aggregated in aggregate::aggregate(targets) {
        jobs.push(EdgeJob {
            kind: kind.clone(),
            properties: aggregated.edge_properties(),
            target: aggregated.object,
        });
    }
}
