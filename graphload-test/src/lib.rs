//! Shared fixtures and run helpers for the end-to-end import tests.

use std::collections::HashMap;

use graphload_core::engine::{ImportSession, ImportSummary, SessionOptions};
use graphload_core::enrich::{Interaction, InteractionSource};
use graphload_core::error::Result;
use graphload_core::sink::MemorySink;
use graphload_core::source::{MemorySource, MemorySourceBuilder};
use graphload_core::taxonomy::TaxonomyClient;

pub const FRONT_PAGE: i64 = 9;
pub const PATHWAY: i64 = 100;
pub const REACTION: i64 = 101;

/// Smallest useful snapshot: a front page pointing at one pathway, which
/// contains one reaction. Tests extend the builder before `build()`.
pub fn curated_snapshot() -> MemorySourceBuilder {
    MemorySource::builder()
        .instance(FRONT_PAGE, "FrontPage", "front page")
        .instance(PATHWAY, "Pathway", "Signal Transduction")
        .instance(REACTION, "Reaction", "First step")
        .reference(FRONT_PAGE, "frontPageItem", PATHWAY)
        .reference(PATHWAY, "hasEvent", REACTION)
        .release(89)
}

/// Run a full import into a fresh recording sink, panicking on failure.
pub fn run_import(source: &MemorySource) -> (ImportSummary, MemorySink) {
    let mut sink = MemorySink::new();
    let summary = ImportSession::new(source, &mut sink, source.model(), SessionOptions::default())
        .run()
        .expect("import succeeds");
    (summary, sink)
}

/// Run a full import into the given sink, returning the engine's result.
/// For tests that pre-arm the sink with a rejection.
pub fn run_import_into(source: &MemorySource, sink: &mut MemorySink) -> Result<ImportSummary> {
    ImportSession::new(source, sink, source.model(), SessionOptions::default()).run()
}

/// Run a full import with interaction enrichment wired in.
pub fn run_import_with_interactions(
    source: &MemorySource,
    dataset: &dyn InteractionSource,
    taxonomy: &dyn TaxonomyClient,
) -> (ImportSummary, MemorySink) {
    let mut sink = MemorySink::new();
    let summary = ImportSession::new(source, &mut sink, source.model(), SessionOptions::default())
        .with_interactions(dataset, taxonomy)
        .run()
        .expect("import succeeds");
    (summary, sink)
}

/// In-memory interaction network keyed by the curated-side identifier.
#[derive(Debug, Default)]
pub struct StaticInteractions {
    by_key: HashMap<String, Vec<Interaction>>,
}

impl StaticInteractions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, interaction: Interaction) -> Self {
        self.by_key.entry(key.to_string()).or_default().push(interaction);
        self
    }
}

impl InteractionSource for StaticInteractions {
    fn interactions(
        &self,
        identifier: &str,
    ) -> std::result::Result<Vec<Interaction>, graphload_core::error::EnrichError> {
        Ok(self.by_key.get(identifier).cloned().unwrap_or_default())
    }
}

/// Taxonomy client backed by a fixed child-to-parent table. No network.
#[derive(Debug, Default)]
pub struct FixedTaxonomy {
    parents: HashMap<String, String>,
}

impl FixedTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(mut self, child: &str, parent: &str) -> Self {
        self.parents.insert(child.to_string(), parent.to_string());
        self
    }
}

impl TaxonomyClient for FixedTaxonomy {
    fn parent_tax_id(
        &self,
        tax_id: &str,
    ) -> std::result::Result<Option<String>, graphload_core::error::EnrichError> {
        Ok(self.parents.get(tax_id).cloned())
    }
}
