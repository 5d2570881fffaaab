//! Memoized schema-category lookups.

use std::collections::HashMap;

use tracing::info;

use crate::error::SourceError;
use crate::source::{AttributeCategory, SourceStore};

/// Answers "what curation category does `(class, attribute)` carry",
/// querying the source schema at most once per pair.
#[derive(Debug, Default)]
pub struct SchemaIntrospector {
    cache: HashMap<(String, String), AttributeCategory>,
}

impl SchemaIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Category of `(class, attribute)`. Unknown categories map to
    /// `Optional`: a schema gap must not abort a multi-hour load.
    pub fn category(
        &mut self,
        source: &dyn SourceStore,
        class: &str,
        attribute: &str,
    ) -> Result<AttributeCategory, SourceError> {
        let key = (class.to_string(), attribute.to_string());
        if let Some(category) = self.cache.get(&key) {
            return Ok(*category);
        }
        let category = match source.attribute_category(class, attribute)? {
            Some(category) => category,
            None => {
                info!(class, attribute, "no schema category, defaulting to OPTIONAL");
                AttributeCategory::Optional
            }
        };
        self.cache.insert(key, category);
        Ok(category)
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
