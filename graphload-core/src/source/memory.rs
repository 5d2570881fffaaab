//! In-memory curation source for tests and fixtures.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::SourceError;
use crate::model::ModelRegistry;

use super::{AttributeCategory, AttributeValue, DbId, SourceObject, SourceStore};

/// A fully materialized source graph. Built through [`MemorySourceBuilder`].
#[derive(Debug)]
pub struct MemorySource {
    model: Arc<ModelRegistry>,
    instances: BTreeMap<DbId, SourceObject>,
    values: HashMap<(DbId, String), Vec<AttributeValue>>,
    /// Declared schema: `(class, attribute)` → optional category.
    schema: HashMap<(String, String), Option<AttributeCategory>>,
    release: Option<i64>,
    /// Count of category lookups per `(class, attribute)`, for cache tests.
    lookups: RefCell<HashMap<(String, String), u32>>,
}

impl MemorySource {
    pub fn builder() -> MemorySourceBuilder {
        MemorySourceBuilder::new(Arc::new(ModelRegistry::curation()))
    }

    pub fn model(&self) -> &Arc<ModelRegistry> {
        &self.model
    }

    /// How many times `attribute_category` ran for `(class, attribute)`.
    pub fn category_lookups(&self, class: &str, attribute: &str) -> u32 {
        self.lookups
            .borrow()
            .get(&(class.to_string(), attribute.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn schema_row(&self, class: &str, attribute: &str) -> Option<Option<AttributeCategory>> {
        let mut current = Some(ModelRegistry::normalize(class).to_string());
        while let Some(name) = current {
            if let Some(category) = self.schema.get(&(name.clone(), attribute.to_string())) {
                return Some(*category);
            }
            current = self.model.get(&name).and_then(|t| t.parent.clone());
        }
        None
    }
}

impl SourceStore for MemorySource {
    fn fetch_by_class(&self, class: &str) -> Result<Vec<SourceObject>, SourceError> {
        Ok(self
            .instances
            .values()
            .filter(|object| self.model.is_a(&object.class, class))
            .cloned()
            .collect())
    }

    fn fetch_instance(&self, id: DbId) -> Result<Option<SourceObject>, SourceError> {
        Ok(self.instances.get(&id).cloned())
    }

    fn values(&self, id: DbId, attribute: &str) -> Result<Vec<AttributeValue>, SourceError> {
        Ok(self
            .values
            .get(&(id, attribute.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn referrers(&self, id: DbId, attribute: &str) -> Result<Vec<SourceObject>, SourceError> {
        let mut owners: Vec<DbId> = self
            .values
            .iter()
            .filter(|((_, attr), slot)| {
                attr == attribute && slot.iter().any(|v| v.as_ref_id() == Some(id))
            })
            .map(|((owner, _), _)| *owner)
            .collect();
        owners.sort_unstable();
        owners.dedup();
        Ok(owners
            .into_iter()
            .filter_map(|owner| self.instances.get(&owner).cloned())
            .collect())
    }

    fn attribute_category(
        &self,
        class: &str,
        attribute: &str,
    ) -> Result<Option<AttributeCategory>, SourceError> {
        *self
            .lookups
            .borrow_mut()
            .entry((class.to_string(), attribute.to_string()))
            .or_insert(0) += 1;
        Ok(self.schema_row(class, attribute).flatten())
    }

    fn is_valid_attribute(&self, class: &str, attribute: &str) -> bool {
        if self.schema_row(class, attribute).is_some() {
            return true;
        }
        // Permissive fallback so fixtures don't have to declare every slot:
        // an attribute present on any instance of the class counts as valid.
        self.instances.values().any(|object| {
            self.model.is_a(&object.class, ModelRegistry::normalize(class))
                && self
                    .values
                    .contains_key(&(object.db_id, attribute.to_string()))
        })
    }

    fn instance_count(&self, class: &str) -> Result<u64, SourceError> {
        Ok(self
            .instances
            .values()
            .filter(|object| self.model.is_a(&object.class, class))
            .count() as u64)
    }

    fn max_db_id(&self) -> Result<DbId, SourceError> {
        Ok(self.instances.keys().next_back().copied().unwrap_or(DbId(0)))
    }

    fn deflate(&self, _id: DbId) {}

    fn checksum(&self) -> Result<i64, SourceError> {
        let mut sum: i64 = 0;
        for object in self.instances.values() {
            let mut h: i64 = object.db_id.0;
            for byte in object.class.bytes() {
                h = h.wrapping_mul(31).wrapping_add(i64::from(byte));
            }
            if let Some(name) = &object.display_name {
                for byte in name.bytes() {
                    h = h.wrapping_mul(31).wrapping_add(i64::from(byte));
                }
            }
            sum = sum.wrapping_add(h);
        }
        Ok(sum)
    }

    fn release_number(&self) -> Result<Option<i64>, SourceError> {
        Ok(self.release)
    }
}

/// Chained builder for [`MemorySource`].
#[derive(Debug)]
pub struct MemorySourceBuilder {
    model: Arc<ModelRegistry>,
    instances: BTreeMap<DbId, SourceObject>,
    values: HashMap<(DbId, String), Vec<AttributeValue>>,
    schema: HashMap<(String, String), Option<AttributeCategory>>,
    release: Option<i64>,
}

impl MemorySourceBuilder {
    pub fn new(model: Arc<ModelRegistry>) -> Self {
        Self {
            model,
            instances: BTreeMap::new(),
            values: HashMap::new(),
            schema: HashMap::new(),
            release: None,
        }
    }

    pub fn instance(mut self, id: i64, class: &str, display_name: &str) -> Self {
        self.instances.insert(
            DbId(id),
            SourceObject {
                db_id: DbId(id),
                class: class.to_string(),
                display_name: Some(display_name.to_string()),
            },
        );
        self
    }

    /// Instance without a display name, as malformed snapshots contain.
    pub fn unnamed_instance(mut self, id: i64, class: &str) -> Self {
        self.instances.insert(
            DbId(id),
            SourceObject {
                db_id: DbId(id),
                class: class.to_string(),
                display_name: None,
            },
        );
        self
    }

    pub fn value(mut self, id: i64, attribute: &str, value: AttributeValue) -> Self {
        self.values
            .entry((DbId(id), attribute.to_string()))
            .or_default()
            .push(value);
        self
    }

    pub fn string(self, id: i64, attribute: &str, value: &str) -> Self {
        self.value(id, attribute, AttributeValue::Str(value.to_string()))
    }

    pub fn reference(self, id: i64, attribute: &str, target: i64) -> Self {
        self.value(id, attribute, AttributeValue::Ref(DbId(target)))
    }

    pub fn category(
        mut self,
        class: &str,
        attribute: &str,
        category: Option<AttributeCategory>,
    ) -> Self {
        self.schema
            .insert((class.to_string(), attribute.to_string()), category);
        self
    }

    pub fn release(mut self, release: i64) -> Self {
        self.release = Some(release);
        self
    }

    pub fn build(self) -> MemorySource {
        MemorySource {
            model: self.model,
            instances: self.instances,
            values: self.values,
            schema: self.schema,
            release: self.release,
            lookups: RefCell::new(HashMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_round_trip() {
        let source = MemorySource::builder()
            .instance(1, "Pathway", "Signaling")
            .instance(2, "Reaction", "Step")
            .reference(1, "hasEvent", 2)
            .string(2, "definition", "a step")
            .category("Event", "summation", Some(AttributeCategory::Required))
            .release(89)
            .build();

        assert_eq!(source.fetch_by_class("Event").unwrap().len(), 2);
        assert_eq!(source.instance_count("Pathway").unwrap(), 1);
        assert_eq!(source.max_db_id().unwrap(), DbId(2));
        assert_eq!(source.release_number().unwrap(), Some(89));

        let referrers = source.referrers(DbId(2), "hasEvent").unwrap();
        assert_eq!(referrers.len(), 1);
        assert_eq!(referrers[0].db_id, DbId(1));
    }

    #[test]
    fn category_lookup_walks_ancestors_and_counts() {
        let source = MemorySource::builder()
            .category("Event", "summation", Some(AttributeCategory::Required))
            .build();
        assert_eq!(
            source.attribute_category("Pathway", "summation").unwrap(),
            Some(AttributeCategory::Required)
        );
        assert_eq!(source.category_lookups("Pathway", "summation"), 1);
    }

    #[test]
    fn validity_falls_back_to_present_attributes() {
        let source = MemorySource::builder()
            .instance(1, "Pathway", "P")
            .string(1, "definition", "x")
            .build();
        assert!(source.is_valid_attribute("Pathway", "definition"));
        assert!(!source.is_valid_attribute("Pathway", "bogus"));
    }
}
