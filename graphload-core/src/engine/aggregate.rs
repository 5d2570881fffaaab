//! Relationship aggregation: duplicate collapse, edge direction, and the
//! special pre-filters applied before edges are written.
//!
//! A curated attribute may reference the same target several times; the
//! graph gets a single edge carrying the duplicate count (`stoichiometry`)
//! and the zero-based first-occurrence ordinal among distinct targets
//! (`order`).

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use tracing::warn;

use crate::sink::PropertyBag;
use crate::source::{DbId, SourceObject, SourceStore};

pub const STOICHIOMETRY: &str = "stoichiometry";
pub const ORDER: &str = "order";

/// Timestamp format of `InstanceEdit.dateTime`.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Provenance relations whose edges run child→owner (the tracking node is
/// the edge source: `Person -author-> InstanceEdit`, `InstanceEdit
/// -created-> object`). Everything else runs owner→child (`Pathway
/// -hasEvent-> Event`).
const CHILD_TO_OWNER: [&str; 8] = [
    "author",
    "authored",
    "created",
    "edited",
    "modified",
    "modifiedList",
    "revised",
    "reviewed",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    OwnerToChild,
    ChildToOwner,
}

/// Edge direction for a relationship label.
pub fn direction(rel_type: &str) -> Direction {
    if CHILD_TO_OWNER.contains(&rel_type) {
        Direction::ChildToOwner
    } else {
        Direction::OwnerToChild
    }
}

/// One aggregated relationship target.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedTarget {
    pub object: SourceObject,
    /// How many times the target appeared in the attribute.
    pub count: i64,
    /// Zero-based ordinal of the first occurrence among distinct targets.
    pub order: i64,
}

impl AggregatedTarget {
    pub fn edge_properties(&self) -> PropertyBag {
        let mut bag = PropertyBag::new();
        bag.insert(STOICHIOMETRY, self.count);
        bag.insert(ORDER, self.order);
        bag
    }
}

/// Collapse duplicates, preserving first-occurrence order.
pub fn aggregate(objects: &[SourceObject]) -> Vec<AggregatedTarget> {
    let mut out: Vec<AggregatedTarget> = Vec::new();
    let mut index: HashMap<DbId, usize> = HashMap::new();
    for object in objects {
        match index.get(&object.db_id) {
            Some(&at) => out[at].count += 1,
            None => {
                index.insert(object.db_id, out.len());
                out.push(AggregatedTarget {
                    object: object.clone(),
                    count: 1,
                    order: out.len() as i64,
                });
            }
        }
    }
    out
}

/// Latest-modification-wins pre-filter for the `modified` relation.
///
/// Returns `Some((chosen, discarded))` when every candidate carries a
/// parseable `dateTime`; the first maximal timestamp wins ties. A
/// malformed date is logged and the collapse skipped, so the caller
/// aggregates the full list instead.
pub fn latest_modified(
    candidates: &[SourceObject],
    source: &dyn SourceStore,
) -> Option<(SourceObject, Vec<SourceObject>)> {
    if candidates.len() < 2 {
        return None;
    }
    let mut best: Option<(usize, NaiveDateTime)> = None;
    for (at, candidate) in candidates.iter().enumerate() {
        let text = match source.first_value(candidate.db_id, "dateTime") {
            Ok(Some(value)) => value.to_string(),
            Ok(None) => {
                warn!(db_id = %candidate.db_id, "modification without dateTime, keeping full list");
                return None;
            }
            Err(e) => {
                warn!(db_id = %candidate.db_id, error = %e, "cannot read dateTime, keeping full list");
                return None;
            }
        };
        let Ok(date) = NaiveDateTime::parse_from_str(&text, DATE_TIME_FORMAT) else {
            warn!(db_id = %candidate.db_id, dateTime = %text, "malformed dateTime, keeping full list");
            return None;
        };
        // Strict comparison: the first maximal timestamp wins ties.
        match best {
            Some((_, best_date)) if date <= best_date => {}
            _ => best = Some((at, date)),
        }
    }
    let (winner, _) = best?;
    let chosen = candidates[winner].clone();
    let discarded = candidates
        .iter()
        .enumerate()
        .filter(|(at, _)| *at != winner)
        .map(|(_, c)| c.clone())
        .collect();
    Some((chosen, discarded))
}

/// Session-wide dedup set for symmetric relations (`reverseReaction`,
/// `equivalentTo`): one edge per unordered endpoint pair.
#[derive(Debug, Default)]
pub struct PairRegistry {
    seen: HashSet<(DbId, DbId)>,
}

impl PairRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pair; returns `true` when it was not seen before,
    /// regardless of endpoint order.
    pub fn insert(&mut self, a: DbId, b: DbId) -> bool {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.seen.insert(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
