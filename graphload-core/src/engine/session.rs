//! The import session: all run state in one place, plus orchestration.
//!
//! One session owns one complete load: identity registry, caches, dedup
//! sets, the violation ledger, and the counters for synthetic ids. The
//! walker, translator, and enricher are implemented as methods on the
//! session so every component reads and writes the same state without
//! process-wide globals.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::enrich::InteractionSource;
use crate::error::Result;
use crate::model::ModelRegistry;
use crate::progress::{NoopReporter, ProgressReporter};
use crate::providers::{DiagramProvider, NoDiagrams, TrivialMolecules};
use crate::sink::{GraphSink, NodeRef, PropertyBag};
use crate::source::{DbId, SourceObject, SourceStore};
use crate::taxonomy::TaxonomyClient;

use super::aggregate::PairRegistry;
use super::classify::FieldClassifier;
use super::consistency::ConsistencyLedger;
use super::introspect::SchemaIntrospector;

static NO_DIAGRAMS: NoDiagrams = NoDiagrams;
static NO_PROGRESS: NoopReporter = NoopReporter;

/// Bookkeeping classes imported whole before the pathway walk. They are
/// not reachable from any front-page pathway.
const CURATION_ONLY_CLASSES: [&str; 6] = [
    "DeletedInstance",
    "Deleted",
    "Release",
    "UpdateTracker",
    "FrontPage",
    "PathwayDiagram",
];

/// Classes excluded from the progress estimate: they exist in the source
/// but never become nodes of their own during the walk.
const UNCOUNTED_CLASSES: [&str; 2] = ["StableIdentifier", "FrontPage"];

/// Per-run options.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Database name written into the graph's info node.
    pub database_name: String,
    /// Push the progress bar to 100% at the end even when the estimate
    /// overshot the actual instance count.
    pub complete_progress: bool,
    /// Where to write the consistency CSV report, if anywhere.
    pub report_path: Option<PathBuf>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            database_name: "curation".to_string(),
            complete_progress: true,
            report_path: None,
        }
    }
}

/// What a finished run looked like.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    /// Source instances materialized as nodes.
    pub instances: u64,
    /// Instances dropped by the latest-modification collapse.
    pub discarded: u64,
    /// Top-level pathways walked.
    pub top_level_pathways: u64,
    /// Consistency violations recorded.
    pub violations: usize,
    /// Interaction nodes added by enrichment.
    pub interactions: u64,
    pub elapsed: Duration,
}

/// One import run. Create with [`ImportSession::new`], wire optional
/// collaborators with the `with_*` methods, then call [`run`].
///
/// [`run`]: ImportSession::run
pub struct ImportSession<'a> {
    pub(crate) source: &'a dyn SourceStore,
    pub(crate) sink: &'a mut dyn GraphSink,
    pub(crate) model: &'a ModelRegistry,
    pub(crate) options: SessionOptions,
    pub(crate) progress: &'a dyn ProgressReporter,
    pub(crate) diagrams: &'a dyn DiagramProvider,
    pub(crate) trivial: Option<&'a TrivialMolecules>,
    pub(crate) interactions: Option<&'a dyn InteractionSource>,
    pub(crate) taxonomy: Option<&'a dyn TaxonomyClient>,

    pub(crate) classifier: FieldClassifier,
    pub(crate) introspector: SchemaIntrospector,
    pub(crate) ledger: ConsistencyLedger,

    /// Identity registry: source id → sink node, the "visited" set.
    pub(crate) db_ids: HashMap<DbId, NodeRef>,
    /// Instances dropped by the latest-modification collapse, kept for
    /// progress accounting.
    pub(crate) discarded: HashSet<DbId>,
    /// Pathways promoted to the synthetic top-level label.
    pub(crate) top_level: HashSet<DbId>,
    /// taxId → source id of the taxon carrying it.
    pub(crate) tax_ids: HashMap<String, DbId>,
    pub(crate) reverse_pairs: PairRegistry,
    pub(crate) equivalent_pairs: PairRegistry,
    pub(crate) label_cache: HashMap<String, Rc<Vec<String>>>,
    /// Counter for synthetic node ids, seeded from the source maximum.
    pub(crate) max_db_id: DbId,
    pub(crate) total: u64,
    pub(crate) interaction_count: u64,
}

impl fmt::Debug for ImportSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportSession")
            .field("options", &self.options)
            .field("instances", &self.db_ids.len())
            .field("discarded", &self.discarded.len())
            .finish_non_exhaustive()
    }
}

impl<'a> ImportSession<'a> {
    pub fn new(
        source: &'a dyn SourceStore,
        sink: &'a mut dyn GraphSink,
        model: &'a ModelRegistry,
        options: SessionOptions,
    ) -> Self {
        Self {
            source,
            sink,
            model,
            options,
            progress: &NO_PROGRESS,
            diagrams: &NO_DIAGRAMS,
            trivial: None,
            interactions: None,
            taxonomy: None,
            classifier: FieldClassifier::new(),
            introspector: SchemaIntrospector::new(),
            ledger: ConsistencyLedger::new(),
            db_ids: HashMap::new(),
            discarded: HashSet::new(),
            top_level: HashSet::new(),
            tax_ids: HashMap::new(),
            reverse_pairs: PairRegistry::new(),
            equivalent_pairs: PairRegistry::new(),
            label_cache: HashMap::new(),
            max_db_id: DbId(0),
            total: 0,
            interaction_count: 0,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_diagrams(mut self, diagrams: &'a dyn DiagramProvider) -> Self {
        self.diagrams = diagrams;
        self
    }

    pub fn with_trivial_molecules(mut self, trivial: &'a TrivialMolecules) -> Self {
        self.trivial = Some(trivial);
        self
    }

    pub fn with_interactions(
        mut self,
        interactions: &'a dyn InteractionSource,
        taxonomy: &'a dyn TaxonomyClient,
    ) -> Self {
        self.interactions = Some(interactions);
        self.taxonomy = Some(taxonomy);
        self
    }

    /// Next synthetic id, above everything the source ever issued.
    pub(crate) fn next_db_id(&mut self) -> DbId {
        self.max_db_id = DbId(self.max_db_id.0 + 1);
        self.max_db_id
    }

    /// Run the whole load. Consumes the session; the sink is finalized on
    /// success.
    pub fn run(mut self) -> Result<ImportSummary> {
        let started = Instant::now();
        self.max_db_id = self.source.max_db_id()?;
        self.declare_schema_rules();
        self.add_db_info();

        self.total = self.estimate_total();
        info!(total = self.total, "starting import");
        self.progress.start("importing instances", Some(self.total));

        // Mark top-level pathways before anything is imported: the front
        // page itself is a bookkeeping class and reaches them first.
        let pathways = self.top_level_pathways()?;

        for class in CURATION_ONLY_CLASSES {
            match self.source.fetch_by_class(class) {
                Ok(objects) => {
                    for object in objects {
                        self.import_object(&object)?;
                    }
                }
                Err(e) => warn!(class, error = %e, "cannot fetch bookkeeping class"),
            }
        }

        for pathway in &pathways {
            let pathway_started = Instant::now();
            self.import_object(pathway)?;
            info!(
                pathway = pathway.name(),
                elapsed = ?pathway_started.elapsed(),
                "imported top-level pathway"
            );
        }

        if self.options.complete_progress {
            self.progress.set_position(self.total);
        }
        self.progress.finish();

        let interactions = self.interactions;
        if let Some(dataset) = interactions {
            self.enrich_interactions(dataset)?;
        }

        self.ledger.log_summary();
        if let Some(path) = self.options.report_path.clone() {
            match self.ledger.write_csv(&path) {
                Ok(()) => info!(report = %path.display(), "wrote consistency report"),
                Err(e) => warn!(report = %path.display(), error = %e, "cannot write consistency report"),
            }
        }

        self.sink.shutdown()?;

        let summary = ImportSummary {
            instances: self.db_ids.len() as u64,
            discarded: self.discarded.len() as u64,
            top_level_pathways: pathways.len() as u64,
            violations: self.ledger.violation_count(),
            interactions: self.interaction_count,
            elapsed: started.elapsed(),
        };
        info!(
            instances = summary.instances,
            discarded = summary.discarded,
            violations = summary.violations,
            elapsed = ?summary.elapsed,
            "import finished"
        );
        Ok(summary)
    }

    /// Uniqueness constraints and indexes, declared up front and enforced
    /// by the sink after shutdown.
    fn declare_schema_rules(&mut self) {
        const UNIQUE_DB_ID_ST_ID: [&str; 10] = [
            "DatabaseObject",
            "Event",
            "Pathway",
            "ReactionLikeEvent",
            "Reaction",
            "PhysicalEntity",
            "Complex",
            "EntitySet",
            "GenomeEncodedEntity",
            "ReferenceEntity",
        ];
        for label in UNIQUE_DB_ID_ST_ID {
            self.sink.declare_unique(label, "dbId");
            self.sink.declare_unique(label, "stId");
        }
        self.sink.declare_unique("Taxon", "taxId");
        self.sink.declare_unique("Species", "taxId");

        self.sink.declare_index("Person", "orcidId");
        self.sink.declare_index("LiteratureReference", "pubMedIdentifier");
        self.sink.declare_index("ReferenceEntity", "identifier");
        self.sink.declare_index("ReferenceEntity", "variantIdentifier");
        self.sink.declare_index("ReferenceIsoform", "identifier");
        self.sink.declare_index("ReferenceIsoform", "variantIdentifier");
        self.sink.declare_index("Disease", "identifier");
        self.sink.declare_index("Taxon", "displayName");
    }

    /// Write the info node describing this load. Never fatal: a graph
    /// without the info node is still a usable graph.
    fn add_db_info(&mut self) {
        let mut properties = PropertyBag::new();
        properties.insert("name", self.options.database_name.as_str());
        match self.source.release_number() {
            Ok(Some(version)) => properties.insert("version", version),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "cannot read release number"),
        }
        match self.source.checksum() {
            Ok(checksum) => properties.insert("checksum", checksum),
            Err(e) => warn!(error = %e, "cannot compute source checksum"),
        }
        if let Err(e) = self.sink.create_node(&["DBInfo".to_string()], &properties) {
            warn!(error = %e, "cannot write info node");
        }
    }

    /// Progress estimate: everything minus classes that never become
    /// their own nodes.
    fn estimate_total(&self) -> u64 {
        let count = |class: &str| match self.source.instance_count(class) {
            Ok(count) => count,
            Err(e) => {
                warn!(class, error = %e, "cannot count instances");
                0
            }
        };
        let mut total = count("DatabaseObject");
        for class in UNCOUNTED_CLASSES {
            total = total.saturating_sub(count(class));
        }
        total
    }

    /// Children of the front page, with their orthologous counterparts,
    /// all marked for the synthetic top-level label.
    fn top_level_pathways(&mut self) -> Result<Vec<SourceObject>> {
        let pages = self.source.fetch_by_class("FrontPage")?;
        let Some(page) = pages.first() else {
            warn!("source has no front page, skipping pathway walk");
            return Ok(Vec::new());
        };
        let mut children = Vec::new();
        for value in self.source.values(page.db_id, "frontPageItem")? {
            let Some(id) = value.as_ref_id() else { continue };
            let Some(child) = self.source.fetch_instance(id)? else {
                warn!(db_id = %id, "front page references missing instance");
                continue;
            };
            self.top_level.insert(child.db_id);
            for orthologous in self.source.values(child.db_id, "orthologousEvent")? {
                if let Some(orthologous_id) = orthologous.as_ref_id() {
                    self.top_level.insert(orthologous_id);
                }
            }
            children.push(child);
        }
        Ok(children)
    }
}
