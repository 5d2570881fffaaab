//! Per-class field classification.
//!
//! For each materialized class the classifier partitions the declared
//! fields into scalar properties, scalar lists, and relationships, resolves
//! source-attribute renames, and attaches the curation category of each
//! field. The result is memoized: classification of a class never changes
//! within one run.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::error::SourceError;
use crate::model::{FieldKind, ModelRegistry, ScalarKind};
use crate::source::{AttributeCategory, SourceStore};

use super::introspect::SchemaIntrospector;

/// One classified field of a class.
#[derive(Debug, Clone)]
pub struct AttributeSpec {
    /// Graph-facing name.
    pub target: String,
    /// Source attribute name.
    pub origin: String,
    /// Element kind for properties; `Str` for relationships.
    pub element: ScalarKind,
    /// Curation category; `None` for graph-only fields and fields the
    /// source schema does not know.
    pub category: Option<AttributeCategory>,
    /// Graph-only field derived during translation.
    pub added: bool,
}

/// Field partition of one class.
#[derive(Debug)]
pub struct Classification {
    pub class: String,
    pub scalars: Vec<AttributeSpec>,
    pub scalar_lists: Vec<AttributeSpec>,
    pub relationships: Vec<AttributeSpec>,
}

/// Memoizing classifier.
#[derive(Debug, Default)]
pub struct FieldClassifier {
    cache: HashMap<String, Rc<Classification>>,
}

impl FieldClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classification for `class`, computed on first request.
    pub fn classify(
        &mut self,
        class: &str,
        model: &ModelRegistry,
        introspector: &mut SchemaIntrospector,
        source: &dyn SourceStore,
    ) -> Result<Rc<Classification>, SourceError> {
        let key = ModelRegistry::normalize(class).to_string();
        if let Some(classification) = self.cache.get(&key) {
            return Ok(Rc::clone(classification));
        }

        let mut classification = Classification {
            class: key.clone(),
            scalars: Vec::new(),
            scalar_lists: Vec::new(),
            relationships: Vec::new(),
        };
        for field in model.fields(&key) {
            if field.transient {
                continue;
            }
            let category = if field.added {
                None
            } else if source.is_valid_attribute(&key, &field.origin) {
                Some(introspector.category(source, &key, &field.origin)?)
            } else {
                debug!(class = %key, attribute = %field.origin, "attribute unknown to source schema");
                None
            };
            let (element, bucket) = match field.kind {
                FieldKind::Property(element) => (element, &mut classification.scalars),
                FieldKind::PropertyList(element) => (element, &mut classification.scalar_lists),
                FieldKind::Relationship => (ScalarKind::Str, &mut classification.relationships),
            };
            bucket.push(AttributeSpec {
                target: field.name.clone(),
                origin: field.origin.clone(),
                element,
                category,
                added: field.added,
            });
        }

        let classification = Rc::new(classification);
        self.cache.insert(key, Rc::clone(&classification));
        Ok(classification)
    }
}
