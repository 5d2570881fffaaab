//! Release side-data injected into translation.
//!
//! Diagram dimensions and the trivial-molecule list come from release
//! artifacts outside the curation snapshot, so they enter the engine as
//! injected providers rather than source queries.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::warn;

use crate::error::EnrichError;
use crate::source::DbId;

/// Dimensions of a laid-out pathway diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagram {
    pub width: i64,
    pub height: i64,
}

/// Answers "does this pathway have a diagram, and how big is it".
pub trait DiagramProvider {
    fn diagram(&self, pathway: DbId) -> Option<Diagram>;
}

/// Provider for runs without diagram artifacts.
#[derive(Debug, Default)]
pub struct NoDiagrams;

impl DiagramProvider for NoDiagrams {
    fn diagram(&self, _pathway: DbId) -> Option<Diagram> {
        None
    }
}

/// Fixed diagram table, filled by the caller.
#[derive(Debug, Default)]
pub struct StaticDiagrams {
    diagrams: HashMap<DbId, Diagram>,
}

impl StaticDiagrams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pathway: DbId, width: i64, height: i64) {
        self.diagrams.insert(pathway, Diagram { width, height });
    }
}

impl DiagramProvider for StaticDiagrams {
    fn diagram(&self, pathway: DbId) -> Option<Diagram> {
        self.diagrams.get(&pathway).copied()
    }
}

/// Accessions of trivial small molecules (water, protons, common ions).
/// Molecules on this list get a `trivial` flag on their reference node.
#[derive(Debug, Default)]
pub struct TrivialMolecules {
    accessions: HashSet<String>,
}

impl TrivialMolecules {
    pub fn from_set(accessions: HashSet<String>) -> Self {
        Self { accessions }
    }

    /// Read a tab-separated list; the accession is the first column.
    /// Blank lines and `#` comments are skipped.
    pub fn from_path(path: &Path) -> Result<Self, EnrichError> {
        let text = std::fs::read_to_string(path)?;
        let mut accessions = HashSet::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split('\t').next() {
                Some(accession) if !accession.is_empty() => {
                    accessions.insert(accession.to_string());
                }
                _ => warn!(line, "skipping malformed trivial-molecule line"),
            }
        }
        Ok(Self { accessions })
    }

    pub fn contains(&self, accession: &str) -> bool {
        self.accessions.contains(accession)
    }

    pub fn is_empty(&self) -> bool {
        self.accessions.is_empty()
    }
}
