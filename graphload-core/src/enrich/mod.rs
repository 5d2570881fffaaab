//! Interaction enrichment: a post-pass over the finished graph adding
//! binary molecular-interaction data from an external network.
//!
//! For every curated reference entity that participates in a reaction, the
//! dataset is queried for interaction partners. Partners unknown to the
//! curation snapshot get a minimal reference-entity node classified by
//! their resource; every interaction becomes an `UndirectedInteraction`
//! node with two `interactor` edges. Everything synthesized here carries
//! provenance through a synthetic importer person and per-node instance
//! edits.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use crate::engine::aggregate::{DATE_TIME_FORMAT, ORDER, STOICHIOMETRY};
use crate::engine::ImportSession;
use crate::error::{EnrichError, Result};
use crate::sink::{NodeRef, PropertyBag, PropertyValue};
use crate::source::{DbId, SourceObject};
use crate::taxonomy::TaxonomyHelper;

/// One side of an interaction as the dataset describes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Interactor {
    /// Raw accession, possibly resource-prefixed (`uniprotkb:P12345`).
    pub accession: String,
    /// Resource name the accession belongs to.
    pub resource: String,
    /// NCBI taxonomy id of the interactor's organism.
    pub tax_id: String,
    pub gene_name: Option<String>,
    pub alias: Option<String>,
    pub synonyms: Vec<String>,
}

/// One scored binary interaction. The curated side is the lookup key; the
/// record carries the other side.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub partner: Interactor,
    /// Confidence score from the network.
    pub score: f64,
    /// Evidence accessions backing the interaction.
    pub evidence: Vec<String>,
}

/// Access to the external interaction network.
pub trait InteractionSource {
    /// Interactions whose curated side is `identifier`, in
    /// `Database:Identifier` form.
    fn interactions(&self, identifier: &str) -> std::result::Result<Vec<Interaction>, EnrichError>;
}

/// Tab-separated interaction dataset, loaded whole.
///
/// Columns: curated-side key (`Database:Identifier`), partner accession,
/// partner resource, partner taxonomy id, score, comma-separated evidence
/// accessions, then optionally gene name, alias, and `$`-separated
/// synonyms. Blank lines and `#` comments are skipped; malformed lines are
/// logged and dropped.
#[derive(Debug, Default)]
pub struct TsvInteractions {
    by_key: HashMap<String, Vec<Interaction>>,
}

impl TsvInteractions {
    pub fn from_path(path: &Path) -> std::result::Result<Self, EnrichError> {
        let text = std::fs::read_to_string(path)?;
        let mut by_key: HashMap<String, Vec<Interaction>> = HashMap::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match Self::parse_line(line) {
                Ok((key, interaction)) => by_key.entry(key).or_default().push(interaction),
                Err(e) => warn!(line = number + 1, error = %e, "skipping malformed interaction line"),
            }
        }
        Ok(Self { by_key })
    }

    fn parse_line(line: &str) -> std::result::Result<(String, Interaction), EnrichError> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 6 {
            return Err(EnrichError::Malformed(format!(
                "expected at least 6 columns, got {}",
                columns.len()
            )));
        }
        let score: f64 = columns[4]
            .parse()
            .map_err(|_| EnrichError::Malformed(format!("bad score {:?}", columns[4])))?;
        let evidence = columns[5]
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let optional = |at: usize| {
            columns
                .get(at)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
        };
        let interaction = Interaction {
            partner: Interactor {
                accession: columns[1].to_string(),
                resource: columns[2].to_string(),
                tax_id: columns[3].to_string(),
                gene_name: optional(6),
                alias: optional(7),
                synonyms: columns
                    .get(8)
                    .map(|s| s.split('$').filter(|p| !p.is_empty()).map(str::to_string).collect())
                    .unwrap_or_default(),
            },
            score,
            evidence,
        };
        Ok((columns[0].to_string(), interaction))
    }

    pub fn len(&self) -> usize {
        self.by_key.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl InteractionSource for TsvInteractions {
    fn interactions(&self, identifier: &str) -> std::result::Result<Vec<Interaction>, EnrichError> {
        Ok(self.by_key.get(identifier).cloned().unwrap_or_default())
    }
}

/// Attribute slots whose inverse presence marks a physical entity as used
/// in a reaction.
const PARTICIPATION_SLOTS: [&str; 4] = ["input", "output", "physicalEntity", "regulator"];

fn standard_edge_properties() -> PropertyBag {
    let mut properties = PropertyBag::new();
    properties.insert(STOICHIOMETRY, 1i64);
    properties.insert(ORDER, 1i64);
    properties
}

impl ImportSession<'_> {
    pub(crate) fn enrich_interactions(&mut self, dataset: &dyn InteractionSource) -> Result<()> {
        let started = Instant::now();
        info!("starting interaction enrichment");

        let importer = self.create_importer_person()?;
        let intact = self.create_interaction_database(importer)?;
        let curated_databases = self.curated_reference_databases()?;

        // identifier -> curated reference entities carrying it, both with
        // and without the database prefix.
        let mut by_identifier: HashMap<String, Vec<DbId>> = HashMap::new();
        let mut targets: Vec<(SourceObject, String)> = Vec::new();
        for entity in self.source.fetch_by_class("ReferenceEntity")? {
            let Some(identifier) = self.entity_identifier(&entity)? else {
                continue;
            };
            let resource = self.reference_database_name(&entity);
            let key = format!("{resource}:{identifier}");
            by_identifier.entry(key.clone()).or_default().push(entity.db_id);
            by_identifier.entry(identifier).or_default().push(entity.db_id);
            if self.db_ids.contains_key(&entity.db_id) && self.is_interaction_target(&entity)? {
                targets.push((entity, key));
            }
        }
        info!(targets = targets.len(), "resolved interaction target entities");

        let mut seen_pairs: HashSet<(String, String)> = HashSet::new();
        let mut added_entities: u64 = 0;
        self.progress.start("adding interaction data", Some(targets.len() as u64));
        for (entity, key) in targets {
            self.progress.advance(1);
            let Some(&entity_node) = self.db_ids.get(&entity.db_id) else {
                continue;
            };
            for interaction in dataset.interactions(&key)? {
                let Some(partner_accession) =
                    interaction.partner.accession.trim().split(' ').next().map(str::to_string)
                else {
                    continue;
                };
                if partner_accession.is_empty() {
                    continue;
                }
                let pair = if key <= partner_accession {
                    (key.clone(), partner_accession.clone())
                } else {
                    (partner_accession.clone(), key.clone())
                };
                if !seen_pairs.insert(pair) {
                    continue;
                }

                let partner_node = match self.resolve_partner_node(&by_identifier, &partner_accession)
                {
                    Some(node) => node,
                    None => {
                        let (db_id, node) = self.create_partner_entity(
                            &interaction.partner,
                            &partner_accession,
                            importer,
                            intact,
                            &curated_databases,
                        )?;
                        by_identifier.entry(partner_accession.clone()).or_default().push(db_id);
                        added_entities += 1;
                        node
                    }
                };

                self.create_interaction_node(
                    &key,
                    &partner_accession,
                    &interaction,
                    entity_node,
                    partner_node,
                    importer,
                    intact.1,
                )?;
            }
        }
        self.progress.finish();
        info!(
            interactions = self.interaction_count,
            entities = added_entities,
            elapsed = ?started.elapsed(),
            "interaction enrichment finished"
        );
        Ok(())
    }

    /// Identifier the entity is known by in the network: the variant
    /// identifier when present, the plain one otherwise.
    fn entity_identifier(&self, entity: &SourceObject) -> Result<Option<String>> {
        for attribute in ["variantIdentifier", "identifier"] {
            if !self.source.is_valid_attribute(&entity.class, attribute) {
                continue;
            }
            if let Some(value) = self.source.first_value(entity.db_id, attribute)? {
                return Ok(Some(value.to_string()));
            }
        }
        Ok(None)
    }

    fn reference_database_name(&self, entity: &SourceObject) -> String {
        match self.source.first_reference(entity.db_id, "referenceDatabase") {
            Ok(Some(database)) => database
                .display_name
                .unwrap_or_else(|| "undefined".to_string()),
            _ => "undefined".to_string(),
        }
    }

    /// An entity is an enrichment target when any physical entity built on
    /// it participates in a reaction.
    fn is_interaction_target(&self, entity: &SourceObject) -> Result<bool> {
        for physical_entity in self.source.referrers(entity.db_id, "referenceEntity")? {
            for slot in PARTICIPATION_SLOTS {
                if !self.source.referrers(physical_entity.db_id, slot)?.is_empty() {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn resolve_partner_node(
        &self,
        by_identifier: &HashMap<String, Vec<DbId>>,
        accession: &str,
    ) -> Option<NodeRef> {
        by_identifier
            .get(accession)?
            .iter()
            .find_map(|id| self.db_ids.get(id).copied())
    }

    /// Curated reference database nodes by display name, for wiring
    /// synthesized partners to `UniProt`/`ChEBI` instead of the synthetic
    /// interaction database.
    fn curated_reference_databases(&self) -> Result<HashMap<String, NodeRef>> {
        let mut out = HashMap::new();
        for database in self.source.fetch_by_class("ReferenceDatabase")? {
            if let (Some(name), Some(&node)) =
                (database.display_name, self.db_ids.get(&database.db_id))
            {
                out.insert(name, node);
            }
        }
        Ok(out)
    }

    fn create_importer_person(&mut self) -> Result<NodeRef> {
        let labels = self.labels_for("Person");
        let mut properties = PropertyBag::new();
        properties.insert("dbId", self.next_db_id().0);
        properties.insert("displayName", "Interactions Importer");
        properties.insert("firstname", "Interactions Importer");
        properties.insert("surname", "Script");
        properties.insert("schemaClass", "Person");
        Ok(self.sink.create_node(&labels, &properties)?)
    }

    /// The synthetic reference database every interaction is attributed
    /// to. Returns its assigned db id and node.
    fn create_interaction_database(&mut self, importer: NodeRef) -> Result<(DbId, NodeRef)> {
        let labels = self.labels_for("ReferenceDatabase");
        let db_id = self.next_db_id();
        let mut properties = PropertyBag::new();
        properties.insert("dbId", db_id.0);
        properties.insert("displayName", "IntAct");
        properties.insert("name", PropertyValue::StrList(vec!["IntAct".to_string()]));
        properties.insert("schemaClass", "ReferenceDatabase");
        properties.insert("url", "https://www.ebi.ac.uk/intact");
        properties.insert("accessUrl", "https://www.ebi.ac.uk/intact/query/###ID###");
        let node = self.sink.create_node(&labels, &properties)?;
        self.attach_provenance(node, importer)?;
        self.db_ids.insert(db_id, node);
        Ok((db_id, node))
    }

    /// Instance edit recording when and by whom a synthetic node was made:
    /// `InstanceEdit -created-> node`, `Person -author-> InstanceEdit`.
    fn attach_provenance(&mut self, node: NodeRef, importer: NodeRef) -> Result<()> {
        let labels = self.labels_for("InstanceEdit");
        let date_time = chrono::Local::now().format(DATE_TIME_FORMAT).to_string();
        let mut properties = PropertyBag::new();
        properties.insert("dbId", self.next_db_id().0);
        properties.insert("displayName", format!("Interactions Importer, {date_time}"));
        properties.insert("dateTime", date_time);
        properties.insert("schemaClass", "InstanceEdit");
        let edit = self.sink.create_node(&labels, &properties)?;

        let standard = standard_edge_properties();
        self.write_edge(importer, edit, "author", &standard);
        self.write_edge(edit, node, "created", &standard);
        Ok(())
    }

    /// Minimal reference entity for a partner the curation snapshot does
    /// not know, classified by its resource.
    fn create_partner_entity(
        &mut self,
        partner: &Interactor,
        accession: &str,
        importer: NodeRef,
        intact: (DbId, NodeRef),
        curated_databases: &HashMap<String, NodeRef>,
    ) -> Result<(DbId, NodeRef)> {
        let raw = accession.split(':').next_back().unwrap_or(accession);
        let resource = partner.resource.to_lowercase();

        let mut properties = PropertyBag::new();
        let db_id = self.next_db_id();
        properties.insert("dbId", db_id.0);

        let (class, database_node) = if resource.contains("uniprot") {
            properties.insert("identifier", raw.split('-').next().unwrap_or(raw));
            properties.insert("databaseName", "UniProt");
            properties.insert("url", format!("http://www.uniprot.org/entry/{raw}"));
            let class = if raw.contains('-') {
                properties.insert("variantIdentifier", raw);
                "ReferenceIsoform"
            } else {
                "ReferenceGeneProduct"
            };
            (class, curated_databases.get("UniProt").copied().unwrap_or(intact.1))
        } else if resource.contains("chebi") {
            properties.insert("identifier", raw);
            properties.insert("databaseName", partner.resource.as_str());
            properties.insert(
                "url",
                format!("https://www.ebi.ac.uk/chebi/searchId.do?chebiId=CHEBI:{raw}"),
            );
            if let Some(alias) = &partner.alias {
                properties.insert("name", PropertyValue::StrList(vec![alias.clone()]));
            }
            ("ReferenceMolecule", curated_databases.get("ChEBI").copied().unwrap_or(intact.1))
        } else {
            properties.insert("identifier", raw);
            properties.insert("databaseName", "IntAct");
            properties.insert("url", format!("https://www.ebi.ac.uk/intact/query/{raw}"));
            ("ReferenceGeneProduct", intact.1)
        };

        match &partner.gene_name {
            Some(gene) => {
                properties.insert("geneName", PropertyValue::StrList(vec![gene.clone()]));
                properties.insert("displayName", format!("{accession} {gene}"));
            }
            None => properties.insert("displayName", accession),
        }
        if !partner.synonyms.is_empty() {
            properties.insert(
                "secondaryIdentifier",
                PropertyValue::StrList(partner.synonyms.clone()),
            );
        }
        properties.insert("schemaClass", class);

        let labels = self.labels_for(class);
        let node = self.sink.create_node(&labels, &properties)?;
        self.attach_provenance(node, importer)?;
        self.db_ids.insert(db_id, node);

        let standard = standard_edge_properties();
        self.write_edge(node, database_node, "referenceDatabase", &standard);

        // Species, when the partner's taxonomy resolves to a curated one.
        let species_node = self.taxonomy.and_then(|client| {
            TaxonomyHelper::new(client)
                .species_for(&partner.tax_id, &mut self.tax_ids)
                .and_then(|species| self.db_ids.get(&species).copied())
        });
        if let Some(species) = species_node {
            self.write_edge(node, species, "species", &standard);
        }

        Ok((db_id, node))
    }

    #[allow(clippy::too_many_arguments)]
    fn create_interaction_node(
        &mut self,
        key: &str,
        partner_accession: &str,
        interaction: &Interaction,
        entity_node: NodeRef,
        partner_node: NodeRef,
        importer: NodeRef,
        intact_node: NodeRef,
    ) -> Result<()> {
        let labels = self.labels_for("UndirectedInteraction");
        let db_id = self.next_db_id();
        let mut properties = PropertyBag::new();
        properties.insert("dbId", db_id.0);
        properties.insert("displayName", format!("{key} <-> {partner_accession} (IntAct)"));
        properties.insert("databaseName", "IntAct");
        properties.insert("score", PropertyValue::Float(interaction.score));
        properties.insert(
            "accession",
            PropertyValue::StrList(interaction.evidence.clone()),
        );
        properties.insert(
            "url",
            format!(
                "https://www.ebi.ac.uk/intact/pages/interactions/interactions.xhtml?query={}",
                interaction.evidence.join("%20OR%20")
            ),
        );
        properties.insert("schemaClass", "UndirectedInteraction");
        let node = self.sink.create_node(&labels, &properties)?;
        self.db_ids.insert(db_id, node);
        self.attach_provenance(node, importer)?;

        let standard = standard_edge_properties();
        self.write_edge(node, intact_node, "referenceDatabase", &standard);
        self.write_edge(node, entity_node, "interactor", &standard);
        let mut second = standard_edge_properties();
        second.insert(ORDER, 2i64);
        self.write_edge(node, partner_node, "interactor", &second);

        self.interaction_count += 1;
        Ok(())
    }

    /// Enrichment edges are best-effort; a rejected one is logged, not
    /// fatal.
    fn write_edge(&mut self, from: NodeRef, to: NodeRef, rel_type: &str, properties: &PropertyBag) {
        if let Err(e) = self.sink.create_relationship(from, to, rel_type, properties) {
            warn!(rel_type, %from, %to, error = %e, "cannot write enrichment relationship");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn tsv_parsing_full_and_minimal_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# key\tacc\tresource\ttaxid\tscore\tevidence\tgene\talias\tsynonyms").unwrap();
        writeln!(
            file,
            "UniProt:P12345\tQ67890\tuniprotkb\t9606\t0.97\tEBI-1,EBI-2\tKRAS\t\tK-Ras$c-K-ras"
        )
        .unwrap();
        writeln!(file, "ChEBI:15377\tCHEBI:29101\tchebi\t-1\t0.44\tEBI-3").unwrap();
        writeln!(file, "broken line without tabs").unwrap();

        let dataset = TsvInteractions::from_path(file.path()).unwrap();
        assert_eq!(dataset.len(), 2);

        let hits = dataset.interactions("UniProt:P12345").unwrap();
        assert_eq!(hits.len(), 1);
        let interaction = &hits[0];
        assert_eq!(interaction.partner.accession, "Q67890");
        assert_eq!(interaction.partner.gene_name.as_deref(), Some("KRAS"));
        assert_eq!(interaction.partner.alias, None);
        assert_eq!(interaction.partner.synonyms, vec!["K-Ras", "c-K-ras"]);
        assert!((interaction.score - 0.97).abs() < f64::EPSILON);
        assert_eq!(interaction.evidence, vec!["EBI-1", "EBI-2"]);

        let hits = dataset.interactions("ChEBI:15377").unwrap();
        assert_eq!(hits[0].partner.resource, "chebi");
        assert!(hits[0].partner.synonyms.is_empty());

        assert!(dataset.interactions("UniProt:NOPE").unwrap().is_empty());
    }

    #[test]
    fn tsv_rejects_bad_score() {
        assert!(matches!(
            TsvInteractions::parse_line("a\tb\tc\t9606\thigh\tEBI-1"),
            Err(EnrichError::Malformed(_))
        ));
    }
}
