//! Instance translation: one source instance → one labeled node.
//!
//! Most properties copy straight across; a fixed table of derived fields
//! (stable ids, taxonomy ids, diagram flags, external URLs) folds
//! neighboring bookkeeping instances into plain properties so the graph
//! does not need nodes for them.

use std::rc::Rc;

use tracing::{error, warn};

use crate::error::{ImportError, Result};
use crate::model::{ModelRegistry, ScalarKind};
use crate::sink::{NodeRef, PropertyBag, PropertyValue};
use crate::source::{AttributeValue, SourceObject};

use super::classify::{AttributeSpec, Classification};
use super::consistency::{CheckedValue, TAXONOMY_ROOT};
use super::session::ImportSession;

impl ImportSession<'_> {
    /// Target class of an instance: the underscore prefix is dropped, and
    /// drugs are re-resolved through their `drugType` display name. A
    /// failed subtype lookup falls back to the nominal class.
    pub(crate) fn resolve_class(&self, object: &SourceObject) -> String {
        let nominal = ModelRegistry::normalize(&object.class).to_string();
        if !self.model.is_a(&nominal, "Drug") {
            return nominal;
        }
        match self.source.first_reference(object.db_id, "drugType") {
            Ok(Some(drug_type)) => match drug_type.display_name {
                Some(subtype) if self.model.is_a(&subtype, "Drug") => subtype,
                Some(subtype) => {
                    warn!(db_id = %object.db_id, subtype, "unknown drug subtype, keeping nominal class");
                    nominal
                }
                None => nominal,
            },
            Ok(None) => nominal,
            Err(e) => {
                warn!(db_id = %object.db_id, error = %e, "cannot resolve drug subtype");
                nominal
            }
        }
    }

    /// Cached label set for a class.
    pub(crate) fn labels_for(&mut self, class: &str) -> Rc<Vec<String>> {
        if let Some(labels) = self.label_cache.get(class) {
            return Rc::clone(labels);
        }
        let labels = Rc::new(self.model.labels(class));
        self.label_cache.insert(class.to_string(), Rc::clone(&labels));
        labels
    }

    /// Materialize one instance as a node. A sink rejection here is fatal:
    /// it names the instance so the curation entry can be found.
    pub(crate) fn save_object(
        &mut self,
        object: &SourceObject,
        class: &str,
        classification: &Classification,
    ) -> Result<NodeRef> {
        let label_class = if class == "Pathway" && self.top_level.contains(&object.db_id) {
            "TopLevelPathway"
        } else {
            class
        };

        let mut properties = PropertyBag::new();
        properties.insert("schemaClass", label_class);
        properties.insert("dbId", object.db_id.0);
        match self.display_name(object, class) {
            Some(display_name) => properties.insert("displayName", display_name),
            // Flagged by the downstream graph QA as well; the node is still
            // written so the subgraph under it stays reachable.
            None => error!(db_id = %object.db_id, "instance without display name"),
        }

        for spec in &classification.scalars {
            self.scalar_property(object, class, spec, &mut properties)?;
        }
        for spec in &classification.scalar_lists {
            self.scalar_list_property(object, class, spec, &mut properties);
        }

        let labels = self.labels_for(label_class);
        self.sink
            .create_node(&labels, &properties)
            .map_err(|source| ImportError::Instance {
                db_id: object.db_id,
                display_name: object.name().to_string(),
                source,
            })
    }

    /// Person nodes rebuild their display name from surname and initials;
    /// everything else uses the curated one.
    fn display_name(&self, object: &SourceObject, class: &str) -> Option<String> {
        if self.model.is_a(class, "Person") {
            if let Ok(Some(surname)) = self.source.first_value(object.db_id, "surname") {
                let surname = surname.to_string();
                let tail = self
                    .source
                    .first_value(object.db_id, "initial")
                    .ok()
                    .flatten()
                    .or_else(|| self.source.first_value(object.db_id, "firstname").ok().flatten());
                return Some(match tail {
                    Some(tail) => format!("{surname}, {tail}"),
                    None => surname,
                });
            }
        }
        object.display_name.clone()
    }

    fn scalar_property(
        &mut self,
        object: &SourceObject,
        class: &str,
        spec: &AttributeSpec,
        properties: &mut PropertyBag,
    ) -> Result<()> {
        match spec.target.as_str() {
            "stId" => self.derive_stable_id(object, properties),
            "deletedStId" => {
                if let Some(identifier) =
                    self.identifier_via(object, "deletedStableIdentifier", "identifier")
                {
                    properties.insert("deletedStId", identifier);
                }
            }
            "orcidId" => {
                if let Some(identifier) = self.identifier_via(object, "crossReference", "identifier") {
                    properties.insert("orcidId", identifier);
                }
            }
            "taxId" => self.derive_tax_id(object, properties),
            "hasDiagram" => {
                let diagram = self.diagrams.diagram(object.db_id);
                properties.insert("hasDiagram", diagram.is_some());
                if let Some(diagram) = diagram {
                    properties.insert("diagramWidth", diagram.width);
                    properties.insert("diagramHeight", diagram.height);
                }
            }
            "hasEHLD" => {
                let value = self
                    .read_first(object, "hasEHLD")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                properties.insert("hasEHLD", value);
            }
            "isInDisease" => {
                let present = self.read_first(object, "disease").is_some();
                properties.insert("isInDisease", present);
            }
            "isInferred" => {
                let present = self.read_first(object, "inferredFrom").is_some();
                properties.insert("isInferred", present);
            }
            "referenceType" => {
                if let Ok(Some(reference)) = self.source.first_reference(object.db_id, "referenceEntity")
                {
                    properties.insert(
                        "referenceType",
                        ModelRegistry::normalize(&reference.class),
                    );
                }
            }
            "speciesName" => {
                if self.model.is_a(class, "OtherEntity") || self.model.is_a(class, "ChemicalDrug") {
                    return Ok(());
                }
                if let Ok(Some(species)) = self.source.first_reference(object.db_id, "species") {
                    if let Some(name) = species.display_name {
                        properties.insert("speciesName", name);
                    }
                }
            }
            "trivial" => {
                if let Some(trivial) = self.trivial {
                    if let Some(identifier) = self.read_first(object, "identifier") {
                        properties.insert("trivial", trivial.contains(&identifier.to_string()));
                    }
                }
            }
            "url" if !self.model.is_a(class, "ReferenceDatabase") && !self.model.is_a(class, "Figure") => {
                self.derive_url(object, class, properties);
            }
            _ => self.default_scalar(object, class, spec, properties),
        }
        Ok(())
    }

    /// stId / stIdVersion / oldStId from the attached stable identifier.
    fn derive_stable_id(&mut self, object: &SourceObject, properties: &mut PropertyBag) {
        let Ok(Some(stable)) = self.source.first_reference(object.db_id, "stableIdentifier") else {
            return;
        };
        let Some(identifier) = self.read_first(&stable, "identifier") else {
            return;
        };
        properties.insert("stId", identifier.to_string());
        if let Some(version) = self.read_first(&stable, "identifierVersion") {
            properties.insert("stIdVersion", format!("{identifier}.{version}"));
        }
        if let Some(old) = self.read_first(&stable, "oldIdentifier") {
            let old = old.to_string();
            if old.is_empty() {
                warn!(db_id = %object.db_id, "empty oldStId, not stored");
            } else {
                properties.insert("oldStId", old);
            }
        }
    }

    fn derive_tax_id(&mut self, object: &SourceObject, properties: &mut PropertyBag) {
        let Some(identifier) = self.identifier_via(object, "crossReference", "identifier") else {
            if object.db_id != TAXONOMY_ROOT {
                warn!(db_id = %object.db_id, taxon = object.name(), "taxon without taxId");
            }
            return;
        };
        if identifier.is_empty() {
            warn!(db_id = %object.db_id, taxon = object.name(), "taxon with empty taxId");
            return;
        }
        self.tax_ids.insert(identifier.clone(), object.db_id);
        properties.insert("taxId", identifier);
    }

    /// url + databaseName through the reference database's access URL
    /// template. GO-style terms link by accession, isoforms by variant
    /// identifier, everything else by plain identifier.
    fn derive_url(&mut self, object: &SourceObject, class: &str, properties: &mut PropertyBag) {
        let Ok(Some(database)) = self.source.first_reference(object.db_id, "referenceDatabase") else {
            return;
        };
        if let Some(name) = &database.display_name {
            properties.insert("databaseName", name.as_str());
        }
        let identifier_attribute = if self.model.is_a(class, "GO_Term")
            || self.model.is_a(class, "Disease")
            || self.model.is_a(class, "PsiMod")
        {
            "accession"
        } else if self.model.is_a(class, "ReferenceIsoform") {
            "variantIdentifier"
        } else {
            "identifier"
        };
        let Some(identifier) = self.read_first(object, identifier_attribute) else {
            return;
        };
        let Some(access_url) = self.read_first(&database, "accessUrl") else {
            return;
        };
        properties.insert(
            "url",
            access_url.to_string().replace("###ID###", &identifier.to_string()),
        );
    }

    fn default_scalar(
        &mut self,
        object: &SourceObject,
        class: &str,
        spec: &AttributeSpec,
        properties: &mut PropertyBag,
    ) {
        let Some(category) = spec.category else { return };
        let values = match self.source.values(object.db_id, &spec.origin) {
            Ok(values) => values,
            Err(e) => {
                warn!(db_id = %object.db_id, attribute = %spec.origin, error = %e, "cannot read attribute");
                return;
            }
        };
        let checked = match values.first() {
            Some(value) => CheckedValue::Scalar(value),
            None => CheckedValue::Missing,
        };
        if !self.ledger.check(object, class, &spec.origin, category, &checked) {
            return;
        }
        let Some(value) = values.first() else { return };
        match coerce(value, spec.element) {
            Some(value) => properties.insert(&spec.target, value),
            None => warn!(
                db_id = %object.db_id,
                attribute = %spec.origin,
                "value does not fit declared property kind"
            ),
        }
    }

    fn scalar_list_property(
        &mut self,
        object: &SourceObject,
        class: &str,
        spec: &AttributeSpec,
        properties: &mut PropertyBag,
    ) {
        let Some(category) = spec.category else { return };
        let values = match self.source.values(object.db_id, &spec.origin) {
            Ok(values) => values,
            Err(e) => {
                warn!(db_id = %object.db_id, attribute = %spec.origin, error = %e, "cannot read attribute");
                return;
            }
        };
        // Empty collections are treated as absent, like the source adapter
        // reports them.
        let checked = if values.is_empty() {
            CheckedValue::Missing
        } else {
            CheckedValue::List(&values)
        };
        if !self.ledger.check(object, class, &spec.origin, category, &checked) {
            return;
        }
        let value = match spec.element {
            ScalarKind::Int => PropertyValue::IntList(
                values
                    .iter()
                    .filter_map(|v| match v {
                        AttributeValue::Int(i) => Some(*i),
                        AttributeValue::Str(s) => s.parse().ok(),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => PropertyValue::StrList(values.iter().map(ToString::to_string).collect()),
        };
        properties.insert(&spec.target, value);
    }

    /// First value of a neighbor's attribute, reached through a reference
    /// attribute of `object`.
    fn identifier_via(
        &self,
        object: &SourceObject,
        reference_attribute: &str,
        attribute: &str,
    ) -> Option<String> {
        let reference = self
            .source
            .first_reference(object.db_id, reference_attribute)
            .ok()
            .flatten()?;
        self.read_first(&reference, attribute)
            .map(|v| v.to_string())
    }

    /// First value of an attribute, with read errors logged and mapped to
    /// absence. The walk never aborts on a single unreadable slot.
    fn read_first(&self, object: &SourceObject, attribute: &str) -> Option<AttributeValue> {
        match self.source.first_value(object.db_id, attribute) {
            Ok(value) => value,
            Err(e) => {
                warn!(db_id = %object.db_id, attribute, error = %e, "cannot read attribute");
                None
            }
        }
    }
}

/// Fit a source value to the declared property kind. References never fit
/// a scalar property.
fn coerce(value: &AttributeValue, kind: ScalarKind) -> Option<PropertyValue> {
    match (kind, value) {
        (_, AttributeValue::Ref(_)) => None,
        (ScalarKind::Str, value) => Some(PropertyValue::Str(value.to_string())),
        (ScalarKind::Int, AttributeValue::Int(i)) => Some(PropertyValue::Int(*i)),
        (ScalarKind::Int, AttributeValue::Str(s)) => s.parse().ok().map(PropertyValue::Int),
        (ScalarKind::Int, _) => None,
        (ScalarKind::Float, AttributeValue::Float(x)) => Some(PropertyValue::Float(*x)),
        (ScalarKind::Float, AttributeValue::Int(i)) => Some(PropertyValue::Float(*i as f64)),
        (ScalarKind::Float, AttributeValue::Str(s)) => s.parse().ok().map(PropertyValue::Float),
        (ScalarKind::Float, _) => None,
        (ScalarKind::Bool, AttributeValue::Bool(b)) => Some(PropertyValue::Bool(*b)),
        (ScalarKind::Bool, AttributeValue::Str(s)) => match s.as_str() {
            "true" | "TRUE" | "1" => Some(PropertyValue::Bool(true)),
            "false" | "FALSE" | "0" => Some(PropertyValue::Bool(false)),
            _ => None,
        },
        (ScalarKind::Bool, AttributeValue::Int(i)) => Some(PropertyValue::Bool(*i != 0)),
        (ScalarKind::Bool, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ImportSession, SessionOptions};
    use crate::sink::MemorySink;
    use crate::source::MemorySource;

    #[test]
    fn missing_display_name_is_logged_not_fatal() {
        let source = MemorySource::builder()
            .instance(9, "FrontPage", "front page")
            .unnamed_instance(1, "Pathway")
            .reference(9, "frontPageItem", 1)
            .build();
        let mut sink = MemorySink::new();
        let summary =
            ImportSession::new(&source, &mut sink, source.model(), SessionOptions::default())
                .run()
                .unwrap();

        assert_eq!(summary.instances, 2);
        let node = sink.node_by_db_id(1).unwrap();
        assert!(node.properties.get("displayName").is_none());
    }

    #[test]
    fn coercion_rules() {
        assert_eq!(
            coerce(&AttributeValue::Int(5), ScalarKind::Str),
            Some(PropertyValue::Str("5".into()))
        );
        assert_eq!(
            coerce(&AttributeValue::Str("12".into()), ScalarKind::Int),
            Some(PropertyValue::Int(12))
        );
        assert_eq!(coerce(&AttributeValue::Str("x".into()), ScalarKind::Int), None);
        assert_eq!(
            coerce(&AttributeValue::Str("true".into()), ScalarKind::Bool),
            Some(PropertyValue::Bool(true))
        );
        assert_eq!(
            coerce(&AttributeValue::Ref(crate::source::DbId(1)), ScalarKind::Str),
            None
        );
    }
}
