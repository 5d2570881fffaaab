//! Static description of the target graph model.
//!
//! The original curation tooling discovered its model by reflection over
//! annotated domain classes. Here the model is declared once as data: each
//! [`TypeDescriptor`] lists its parent, marker interfaces, and fields, and
//! the [`ModelRegistry`] answers the questions the engine asks of it
//! (ancestry, label sets, field inheritance).

mod curation;

use std::collections::HashMap;

/// Element type of a graph property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Str,
    Int,
    Float,
    Bool,
}

/// How a declared field materializes in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-valued node property.
    Property(ScalarKind),
    /// Multi-valued node property (array).
    PropertyList(ScalarKind),
    /// Edge to another node.
    Relationship,
}

/// One declared field of a model type.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Graph-facing name.
    pub name: String,
    /// Attribute name in the curation source. Usually equal to `name`;
    /// differs for renamed fields.
    pub origin: String,
    pub kind: FieldKind,
    /// Graph-only field with no curation counterpart; carries no
    /// consistency category.
    pub added: bool,
    /// Declared on the type but never persisted directly (its value is
    /// folded into some other field or into the type itself).
    pub transient: bool,
}

/// One type of the graph model.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub name: String,
    pub parent: Option<String>,
    /// Marker interfaces contributing extra labels.
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldSpec>,
}

impl TypeDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    fn field(mut self, name: &str, origin: &str, kind: FieldKind, added: bool, transient: bool) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            origin: origin.to_string(),
            kind,
            added,
            transient,
        });
        self
    }

    pub fn prop(self, name: &str, kind: ScalarKind) -> Self {
        self.field(name, name, FieldKind::Property(kind), false, false)
    }

    pub fn prop_list(self, name: &str, kind: ScalarKind) -> Self {
        self.field(name, name, FieldKind::PropertyList(kind), false, false)
    }

    /// Graph-only property derived during translation.
    pub fn added_prop(self, name: &str, kind: ScalarKind) -> Self {
        self.field(name, name, FieldKind::Property(kind), true, false)
    }

    /// Property whose source attribute carries a different name.
    pub fn renamed_prop(self, name: &str, origin: &str, kind: ScalarKind) -> Self {
        self.field(name, origin, FieldKind::Property(kind), false, false)
    }

    pub fn renamed_prop_list(self, name: &str, origin: &str, kind: ScalarKind) -> Self {
        self.field(name, origin, FieldKind::PropertyList(kind), false, false)
    }

    pub fn rel(self, name: &str) -> Self {
        self.field(name, name, FieldKind::Relationship, false, false)
    }

    /// Graph-only relationship synthesized during translation.
    pub fn added_rel(self, name: &str) -> Self {
        self.field(name, name, FieldKind::Relationship, true, false)
    }

    /// Relationship stored under a different graph name than its source
    /// attribute.
    pub fn renamed_rel(self, name: &str, origin: &str) -> Self {
        self.field(name, origin, FieldKind::Relationship, false, false)
    }

    /// Declared relationship that is consumed by translation instead of
    /// being persisted.
    pub fn transient_rel(self, name: &str) -> Self {
        self.field(name, name, FieldKind::Relationship, false, true)
    }
}

/// Lookup structure over all declared types.
#[derive(Debug)]
pub struct ModelRegistry {
    types: HashMap<String, TypeDescriptor>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self { types: HashMap::new() }
    }

    /// The full pathway-curation model.
    pub fn curation() -> Self {
        curation::build()
    }

    pub fn insert(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    /// Strip the bookkeeping prefix some source classes carry.
    pub fn normalize(class: &str) -> &str {
        class.strip_prefix('_').unwrap_or(class)
    }

    pub fn get(&self, class: &str) -> Option<&TypeDescriptor> {
        self.types.get(Self::normalize(class))
    }

    pub fn contains(&self, class: &str) -> bool {
        self.get(class).is_some()
    }

    /// Whether `class` is `ancestor` or inherits from it.
    pub fn is_a(&self, class: &str, ancestor: &str) -> bool {
        let mut current = Self::normalize(class);
        loop {
            if current == ancestor {
                return true;
            }
            match self.get(current).and_then(|t| t.parent.as_deref()) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Node labels for `class`: the class itself, its marker interfaces,
    /// then each ancestor with its interfaces, up to the model root.
    pub fn labels(&self, class: &str) -> Vec<String> {
        let mut labels = Vec::new();
        let mut current = Some(Self::normalize(class).to_string());
        while let Some(name) = current {
            let Some(descriptor) = self.get(&name) else { break };
            if !labels.contains(&descriptor.name) {
                labels.push(descriptor.name.clone());
            }
            for interface in &descriptor.interfaces {
                if !labels.contains(interface) {
                    labels.push(interface.clone());
                }
            }
            current = descriptor.parent.clone();
        }
        labels
    }

    /// All fields of `class`, own declarations first, then inherited ones.
    /// A subclass redeclaration shadows the inherited field.
    pub fn fields(&self, class: &str) -> Vec<&FieldSpec> {
        let mut out: Vec<&FieldSpec> = Vec::new();
        let mut current = Some(Self::normalize(class).to_string());
        while let Some(name) = current {
            let Some(descriptor) = self.get(&name) else { break };
            for field in &descriptor.fields {
                if !out.iter().any(|f| f.name == field.name) {
                    out.push(field);
                }
            }
            current = descriptor.parent.clone();
        }
        out
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::curation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestry_walks_parent_chain() {
        let model = ModelRegistry::curation();
        assert!(model.is_a("Pathway", "Event"));
        assert!(model.is_a("Pathway", "DatabaseObject"));
        assert!(model.is_a("Reaction", "ReactionLikeEvent"));
        assert!(!model.is_a("Pathway", "PhysicalEntity"));
        assert!(model.is_a("Complex", "Complex"));
    }

    #[test]
    fn labels_include_interfaces_and_ancestors() {
        let model = ModelRegistry::curation();
        let labels = model.labels("Pathway");
        assert_eq!(labels[0], "Pathway");
        assert!(labels.contains(&"Event".to_string()));
        assert!(labels.contains(&"DatabaseObject".to_string()));
        assert!(labels.contains(&"Trackable".to_string()));
    }

    #[test]
    fn underscore_prefix_normalizes() {
        let model = ModelRegistry::curation();
        assert!(model.contains("_Deleted"));
        assert!(model.is_a("_Deleted", "DatabaseObject"));
        assert_eq!(model.labels("_Deleted")[0], "Deleted");
    }

    #[test]
    fn fields_inherit_and_shadow() {
        let model = ModelRegistry::curation();
        let fields = model.fields("Pathway");
        // Own field.
        assert!(fields.iter().any(|f| f.name == "hasEvent"));
        // Inherited from Event and DatabaseObject.
        assert!(fields.iter().any(|f| f.name == "speciesName"));
        assert!(fields.iter().any(|f| f.name == "created"));
        // No duplicates.
        let mut names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), fields.len());
    }

    #[test]
    fn go_term_identifier_is_renamed_accession() {
        let model = ModelRegistry::curation();
        let fields = model.fields("GO_BiologicalProcess");
        let identifier = fields.iter().find(|f| f.name == "identifier").unwrap();
        assert_eq!(identifier.origin, "accession");
    }
}
