//! Read side of the import: a relational curation snapshot.
//!
//! The engine only ever talks to [`SourceStore`], so the same walk runs
//! against the SQLite snapshot adapter in production and the in-memory
//! store in tests.

pub mod memory;
pub mod sqlite;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

pub use memory::{MemorySource, MemorySourceBuilder};
pub use sqlite::SqliteSource;

/// Identity of an instance in the curation database.
///
/// Distinct from the sink's node ids: a source id is stable across runs,
/// a node id is an artifact of one bulk load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DbId(pub i64);

impl fmt::Display for DbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One stored attribute slot value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Reference to another instance.
    Ref(DbId),
}

impl AttributeValue {
    /// The referenced instance id, for reference-typed slots.
    pub fn as_ref_id(&self) -> Option<DbId> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether the value counts as empty for consistency checking:
    /// a scalar is empty when its string form is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Str(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Ref(id) => write!(f, "{id}"),
        }
    }
}

/// Lightweight handle to a source instance. Attribute values are fetched
/// separately so handles stay cheap to clone onto the worklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceObject {
    pub db_id: DbId,
    /// Schema class name as stored in the snapshot (may carry a leading
    /// underscore for bookkeeping classes).
    pub class: String,
    pub display_name: Option<String>,
}

impl SourceObject {
    /// Display name, or a placeholder for unnamed instances.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("(no display name)")
    }
}

/// Curation category of a schema attribute, controlling how missing or
/// empty values are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeCategory {
    /// Must be filled in.
    Mandatory,
    /// If relevant it must be included; may be absent entirely.
    Required,
    /// The curator decides whether it is included.
    Optional,
    /// The curator tool or release process fills it in.
    NoManualEdit,
}

impl AttributeCategory {
    /// Decode the snapshot's numeric category column.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Mandatory),
            2 => Some(Self::Required),
            3 => Some(Self::Optional),
            4 => Some(Self::NoManualEdit),
            _ => None,
        }
    }

    pub fn allows_null(self) -> bool {
        !matches!(self, Self::Mandatory)
    }

    pub fn allows_empty(self) -> bool {
        matches!(self, Self::Optional | Self::NoManualEdit)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mandatory => "MANDATORY",
            Self::Required => "REQUIRED",
            Self::Optional => "OPTIONAL",
            Self::NoManualEdit => "NOMANUALEDIT",
        }
    }
}

impl fmt::Display for AttributeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read access to the curation snapshot.
///
/// Implementations may cache attribute rows per instance; [`deflate`]
/// releases that cache once the walk is done with an instance.
///
/// [`deflate`]: SourceStore::deflate
pub trait SourceStore {
    /// All instances whose class is `class` or a subclass of it, ordered
    /// by db id.
    fn fetch_by_class(&self, class: &str) -> Result<Vec<SourceObject>, SourceError>;

    /// A single instance by id, or `None` when absent.
    fn fetch_instance(&self, id: DbId) -> Result<Option<SourceObject>, SourceError>;

    /// All values of one attribute slot, in stored rank order. Absent
    /// attributes yield an empty vector.
    fn values(&self, id: DbId, attribute: &str) -> Result<Vec<AttributeValue>, SourceError>;

    /// Instances that reference `id` through `attribute` (inverse lookup).
    fn referrers(&self, id: DbId, attribute: &str) -> Result<Vec<SourceObject>, SourceError>;

    /// Curation category of `(class, attribute)`, or `None` when the
    /// schema does not record one.
    fn attribute_category(
        &self,
        class: &str,
        attribute: &str,
    ) -> Result<Option<AttributeCategory>, SourceError>;

    /// Whether the schema declares `attribute` for `class` at all.
    fn is_valid_attribute(&self, class: &str, attribute: &str) -> bool;

    /// Number of instances of `class` (including subclasses).
    fn instance_count(&self, class: &str) -> Result<u64, SourceError>;

    /// Highest db id in the snapshot; synthetic nodes are numbered above it.
    fn max_db_id(&self) -> Result<DbId, SourceError>;

    /// Release the cached attribute rows of one instance.
    fn deflate(&self, id: DbId);

    /// Stable content checksum over the snapshot, for the graph info node.
    fn checksum(&self) -> Result<i64, SourceError>;

    /// Release version recorded in the snapshot, if any.
    fn release_number(&self) -> Result<Option<i64>, SourceError>;

    /// First value of an attribute slot, the common scalar case.
    fn first_value(
        &self,
        id: DbId,
        attribute: &str,
    ) -> Result<Option<AttributeValue>, SourceError> {
        Ok(self.values(id, attribute)?.into_iter().next())
    }

    /// First referenced instance of an attribute slot, resolved.
    fn first_reference(
        &self,
        id: DbId,
        attribute: &str,
    ) -> Result<Option<SourceObject>, SourceError> {
        match self.first_value(id, attribute)?.and_then(|v| v.as_ref_id()) {
            Some(target) => self.fetch_instance(target),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_codes_round_trip() {
        assert_eq!(AttributeCategory::from_code(1), Some(AttributeCategory::Mandatory));
        assert_eq!(AttributeCategory::from_code(2), Some(AttributeCategory::Required));
        assert_eq!(AttributeCategory::from_code(3), Some(AttributeCategory::Optional));
        assert_eq!(AttributeCategory::from_code(4), Some(AttributeCategory::NoManualEdit));
        assert_eq!(AttributeCategory::from_code(9), None);
    }

    #[test]
    fn category_policy() {
        assert!(!AttributeCategory::Mandatory.allows_null());
        assert!(!AttributeCategory::Mandatory.allows_empty());
        assert!(AttributeCategory::Required.allows_null());
        assert!(!AttributeCategory::Required.allows_empty());
        assert!(AttributeCategory::Optional.allows_null());
        assert!(AttributeCategory::Optional.allows_empty());
        assert!(AttributeCategory::NoManualEdit.allows_null());
        assert!(AttributeCategory::NoManualEdit.allows_empty());
    }

    #[test]
    fn scalar_emptiness_is_string_form() {
        assert!(AttributeValue::Str(String::new()).is_empty());
        assert!(!AttributeValue::Str("x".into()).is_empty());
        assert!(!AttributeValue::Int(0).is_empty());
        assert!(!AttributeValue::Bool(false).is_empty());
    }
}
