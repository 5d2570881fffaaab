//! Consistency checking of curated values against their categories.
//!
//! Violations never abort the import: they accumulate in a ledger and come
//! out at the end as a log summary plus a CSV report next to the graph.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

use tracing::{info, warn};

use crate::source::{AttributeCategory, AttributeValue, DbId, SourceObject};

/// Root of the taxonomy tree; its missing parent taxon is expected and
/// never reported.
pub const TAXONOMY_ROOT: DbId = DbId(164_487);

/// What was wrong with a checked value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Null,
    Empty,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Empty => "empty",
        }
    }
}

/// One recorded violation.
#[derive(Debug, Clone)]
pub struct Violation {
    pub class: String,
    pub attribute: String,
    pub category: AttributeCategory,
    pub kind: ViolationKind,
    pub db_id: DbId,
    pub display_name: String,
}

/// A value under consistency check.
#[derive(Debug, Clone, Copy)]
pub enum CheckedValue<'a> {
    /// The attribute slot is absent.
    Missing,
    Scalar(&'a AttributeValue),
    List(&'a [AttributeValue]),
}

impl CheckedValue<'_> {
    fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Missing => false,
            Self::Scalar(value) => value.is_empty(),
            Self::List(values) => values.is_empty(),
        }
    }
}

/// Accumulating consistency ledger.
#[derive(Debug, Default)]
pub struct ConsistencyLedger {
    /// Offending instances per `(class, attribute)`.
    counters: BTreeMap<(String, String), BTreeSet<DbId>>,
    records: Vec<Violation>,
}

impl ConsistencyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check one value. Returns whether the value should be persisted:
    /// only present, non-empty values pass. The category decides whether
    /// a failing value is also recorded as a violation.
    pub fn check(
        &mut self,
        object: &SourceObject,
        class: &str,
        attribute: &str,
        category: AttributeCategory,
        value: &CheckedValue<'_>,
    ) -> bool {
        if value.is_missing() {
            if !category.allows_null() && object.db_id != TAXONOMY_ROOT {
                self.record(object, class, attribute, category, ViolationKind::Null);
            }
            return false;
        }
        if value.is_empty() {
            if !category.allows_empty() {
                self.record(object, class, attribute, category, ViolationKind::Empty);
            }
            return false;
        }
        true
    }

    fn record(
        &mut self,
        object: &SourceObject,
        class: &str,
        attribute: &str,
        category: AttributeCategory,
        kind: ViolationKind,
    ) {
        self.counters
            .entry((class.to_string(), attribute.to_string()))
            .or_default()
            .insert(object.db_id);
        self.records.push(Violation {
            class: class.to_string(),
            attribute: attribute.to_string(),
            category,
            kind,
            db_id: object.db_id,
            display_name: object.name().to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn violation_count(&self) -> usize {
        self.records.len()
    }

    /// Summary lines, one per `(class, attribute)`, most offending first.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut entries: Vec<(&(String, String), usize)> = self
            .counters
            .iter()
            .map(|(key, ids)| (key, ids.len()))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
            .into_iter()
            .map(|((class, attribute), count)| {
                format!("{count:>10} entries for ({class}, {attribute})")
            })
            .collect()
    }

    /// Log the summary: a warning when anything was found, info otherwise.
    pub fn log_summary(&self) {
        if self.is_empty() {
            info!("consistency check: no violations");
            return;
        }
        warn!(
            violations = self.violation_count(),
            attributes = self.counters.len(),
            "consistency check found violations"
        );
        for line in self.summary_lines() {
            warn!("{line}");
        }
    }

    /// Write the per-violation CSV report.
    pub fn write_csv(&self, path: &Path) -> std::io::Result<()> {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        writeln!(file, "SchemaClass,Attribute,Category,Error,DbId,DisplayName")?;
        for v in &self.records {
            writeln!(
                file,
                "{},{},{},{},{},\"{}\"",
                v.class,
                v.attribute,
                v.category,
                v.kind.as_str(),
                v.db_id,
                v.display_name.replace('"', "\"\"")
            )?;
        }
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(db_id: i64) -> SourceObject {
        SourceObject {
            db_id: DbId(db_id),
            class: "Pathway".to_string(),
            display_name: Some("Signaling".to_string()),
        }
    }

    #[test]
    fn mandatory_missing_records_and_rejects() {
        let mut ledger = ConsistencyLedger::new();
        let accepted = ledger.check(
            &object(1),
            "Pathway",
            "name",
            AttributeCategory::Mandatory,
            &CheckedValue::Missing,
        );
        assert!(!accepted);
        assert_eq!(ledger.violation_count(), 1);
    }

    #[test]
    fn optional_missing_is_silent() {
        let mut ledger = ConsistencyLedger::new();
        let accepted = ledger.check(
            &object(1),
            "Pathway",
            "doi",
            AttributeCategory::Optional,
            &CheckedValue::Missing,
        );
        assert!(!accepted);
        assert!(ledger.is_empty());
    }

    #[test]
    fn required_empty_records() {
        let mut ledger = ConsistencyLedger::new();
        let empty = AttributeValue::Str(String::new());
        let accepted = ledger.check(
            &object(1),
            "Pathway",
            "definition",
            AttributeCategory::Required,
            &CheckedValue::Scalar(&empty),
        );
        assert!(!accepted);
        assert_eq!(ledger.violation_count(), 1);
        assert_eq!(ledger.records[0].kind, ViolationKind::Empty);
    }

    #[test]
    fn system_category_never_records() {
        let mut ledger = ConsistencyLedger::new();
        let empty = AttributeValue::Str(String::new());
        for value in [CheckedValue::Missing, CheckedValue::Scalar(&empty)] {
            let accepted = ledger.check(
                &object(1),
                "Pathway",
                "releaseDate",
                AttributeCategory::NoManualEdit,
                &value,
            );
            assert!(!accepted);
        }
        let filled = AttributeValue::Str("2026-01-01".to_string());
        assert!(ledger.check(
            &object(1),
            "Pathway",
            "releaseDate",
            AttributeCategory::NoManualEdit,
            &CheckedValue::Scalar(&filled),
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn taxonomy_root_missing_parent_is_exempt() {
        let mut ledger = ConsistencyLedger::new();
        let root = SourceObject {
            db_id: TAXONOMY_ROOT,
            class: "Taxon".to_string(),
            display_name: Some("root".to_string()),
        };
        let accepted = ledger.check(
            &root,
            "Taxon",
            "superTaxon",
            AttributeCategory::Mandatory,
            &CheckedValue::Missing,
        );
        assert!(!accepted);
        assert!(ledger.is_empty());
    }

    #[test]
    fn summary_sorts_descending_by_count() {
        let mut ledger = ConsistencyLedger::new();
        for id in 1..=3 {
            ledger.check(
                &object(id),
                "Pathway",
                "name",
                AttributeCategory::Mandatory,
                &CheckedValue::Missing,
            );
        }
        ledger.check(
            &object(9),
            "Reaction",
            "input",
            AttributeCategory::Mandatory,
            &CheckedValue::Missing,
        );
        let lines = ledger.summary_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("(Pathway, name)"));
        assert!(lines[0].trim_start().starts_with('3'));
        assert!(lines[1].contains("(Reaction, input)"));
    }

    #[test]
    fn csv_report_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consistency_report.csv");
        let mut ledger = ConsistencyLedger::new();
        ledger.check(
            &object(1),
            "Pathway",
            "name",
            AttributeCategory::Mandatory,
            &CheckedValue::Missing,
        );
        ledger.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "SchemaClass,Attribute,Category,Error,DbId,DisplayName"
        );
        assert_eq!(lines.next().unwrap(), "Pathway,name,MANDATORY,null,1,\"Signaling\"");
    }
}
