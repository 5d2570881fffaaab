//! End-to-end walks over in-memory snapshots, asserting on the recorded
//! graph rather than on engine internals.

use graphload_core::error::ImportError;
use graphload_core::sink::{MemorySink, PropertyValue, RecordedNode};
use graphload_core::source::{DbId, MemorySource};
use graphload_test::{
    curated_snapshot, run_import, run_import_into, run_import_with_interactions, FixedTaxonomy,
    StaticInteractions, FRONT_PAGE, PATHWAY, REACTION,
};

fn node_named<'a>(sink: &'a MemorySink, display_name: &str) -> Option<&'a RecordedNode> {
    sink.nodes.iter().find(|n| {
        n.properties.get("displayName") == Some(&PropertyValue::Str(display_name.to_string()))
    })
}

#[test]
fn walk_imports_reachable_graph_with_top_level_label() {
    let source = curated_snapshot().build();
    let (summary, sink) = run_import(&source);

    assert_eq!(summary.instances, 3);
    assert_eq!(summary.top_level_pathways, 1);
    assert_eq!(summary.discarded, 0);
    assert!(sink.finalized);

    let pathway = sink.node_by_db_id(PATHWAY).unwrap();
    assert_eq!(pathway.labels[0], "TopLevelPathway");
    assert!(pathway.labels.contains(&"Pathway".to_string()));
    assert!(pathway.labels.contains(&"Event".to_string()));
    assert_eq!(
        pathway.properties.get("schemaClass"),
        Some(&PropertyValue::Str("TopLevelPathway".into()))
    );

    let reaction = sink.node_by_db_id(REACTION).unwrap();
    assert_eq!(reaction.labels[0], "Reaction");

    let front_page = sink.node_by_db_id(FRONT_PAGE).unwrap();
    assert_eq!(front_page.labels[0], "FrontPage");

    let has_event = sink.relationship(pathway.id, reaction.id, "hasEvent").unwrap();
    assert_eq!(has_event.properties.get("stoichiometry"), Some(&PropertyValue::Int(1)));
    assert_eq!(has_event.properties.get("order"), Some(&PropertyValue::Int(0)));

    let info = sink
        .nodes
        .iter()
        .find(|n| n.labels == vec!["DBInfo".to_string()])
        .unwrap();
    assert_eq!(info.properties.get("name"), Some(&PropertyValue::Str("curation".into())));
    assert_eq!(info.properties.get("version"), Some(&PropertyValue::Int(89)));
}

#[test]
fn schema_rules_are_declared_up_front() {
    let source = curated_snapshot().build();
    let (_, sink) = run_import(&source);

    let unique = sink.unique_rules();
    assert!(unique.iter().any(|r| r.label == "DatabaseObject" && r.property == "dbId"));
    assert!(unique.iter().any(|r| r.label == "Pathway" && r.property == "stId"));
    assert!(unique.iter().any(|r| r.label == "Species" && r.property == "taxId"));
}

#[test]
fn missing_front_page_imports_nothing() {
    // A pathway nothing points at: present in the source, never walked.
    let source = MemorySource::builder()
        .instance(PATHWAY, "Pathway", "orphan")
        .build();
    let (summary, sink) = run_import(&source);

    assert_eq!(summary.top_level_pathways, 0);
    assert_eq!(summary.instances, 0);
    // Only the info node.
    assert_eq!(sink.nodes.len(), 1);
    assert_eq!(sink.nodes[0].labels, vec!["DBInfo".to_string()]);
}

#[test]
fn provenance_edges_point_at_the_object() {
    let source = curated_snapshot()
        .instance(200, "InstanceEdit", "edit")
        .instance(201, "Person", "ignored")
        .reference(PATHWAY, "created", 200)
        .reference(200, "author", 201)
        .string(201, "surname", "Curie")
        .string(201, "initial", "M")
        .build();
    let (_, sink) = run_import(&source);

    let pathway = sink.node_by_db_id(PATHWAY).unwrap();
    let edit = sink.node_by_db_id(200).unwrap();
    let person = sink.node_by_db_id(201).unwrap();

    // Tracking nodes are the edge sources.
    assert!(sink.relationship(edit.id, pathway.id, "created").is_some());
    assert!(sink.relationship(person.id, edit.id, "author").is_some());

    // Person display names are rebuilt from surname and initials.
    assert_eq!(
        person.properties.get("displayName"),
        Some(&PropertyValue::Str("Curie, M".into()))
    );
}

#[test]
fn modification_trail_collapses_to_latest() {
    let source = curated_snapshot()
        .instance(210, "InstanceEdit", "old")
        .instance(211, "InstanceEdit", "latest")
        .instance(212, "InstanceEdit", "middle")
        .reference(PATHWAY, "modified", 210)
        .reference(PATHWAY, "modified", 211)
        .reference(PATHWAY, "modified", 212)
        .string(210, "dateTime", "2024-01-01 09:00:00")
        .string(211, "dateTime", "2025-03-01 09:00:00")
        .string(212, "dateTime", "2024-06-01 09:00:00")
        .build();
    let (summary, sink) = run_import(&source);

    let pathway = sink.node_by_db_id(PATHWAY).unwrap();
    let latest = sink.node_by_db_id(211).unwrap();

    // One collapsed edge to the latest modification.
    let modified = sink.relationships_of_type("modified");
    assert_eq!(modified.len(), 1);
    assert_eq!((modified[0].from, modified[0].to), (latest.id, pathway.id));

    // The full trail survives next to it, so nothing stays discarded.
    assert_eq!(sink.relationships_of_type("modifiedList").len(), 3);
    assert!(sink.node_by_db_id(210).is_some());
    assert!(sink.node_by_db_id(212).is_some());
    assert_eq!(summary.discarded, 0);
}

#[test]
fn malformed_modification_date_keeps_full_list() {
    let source = curated_snapshot()
        .instance(210, "InstanceEdit", "a")
        .instance(211, "InstanceEdit", "b")
        .reference(PATHWAY, "modified", 210)
        .reference(PATHWAY, "modified", 211)
        .string(210, "dateTime", "2024-01-01 09:00:00")
        .string(211, "dateTime", "around noon")
        .build();
    let (summary, sink) = run_import(&source);

    assert_eq!(sink.relationships_of_type("modified").len(), 2);
    assert_eq!(summary.discarded, 0);
}

#[test]
fn duplicate_targets_aggregate_into_one_edge() {
    let source = curated_snapshot()
        .instance(300, "SimpleEntity", "ATP")
        .instance(301, "SimpleEntity", "water")
        .reference(REACTION, "input", 300)
        .reference(REACTION, "input", 300)
        .reference(REACTION, "input", 301)
        .build();
    let (_, sink) = run_import(&source);

    let reaction = sink.node_by_db_id(REACTION).unwrap();
    let atp = sink.node_by_db_id(300).unwrap();
    let water = sink.node_by_db_id(301).unwrap();

    let to_atp = sink.relationship(reaction.id, atp.id, "input").unwrap();
    assert_eq!(to_atp.properties.get("stoichiometry"), Some(&PropertyValue::Int(2)));
    assert_eq!(to_atp.properties.get("order"), Some(&PropertyValue::Int(0)));

    let to_water = sink.relationship(reaction.id, water.id, "input").unwrap();
    assert_eq!(to_water.properties.get("stoichiometry"), Some(&PropertyValue::Int(1)));
    assert_eq!(to_water.properties.get("order"), Some(&PropertyValue::Int(1)));

    assert_eq!(sink.relationships_of_type("input").len(), 2);
}

#[test]
fn diamond_references_materialize_the_child_once() {
    // Two reactions sharing one summation: the child is reachable twice.
    let source = curated_snapshot()
        .instance(340, "Reaction", "second step")
        .instance(341, "Summation", "shared summary")
        .reference(PATHWAY, "hasEvent", 340)
        .reference(REACTION, "summation", 341)
        .reference(340, "summation", 341)
        .build();
    let (summary, sink) = run_import(&source);

    assert_eq!(summary.instances, 5);
    let copies = sink
        .nodes
        .iter()
        .filter(|n| n.properties.get("dbId") == Some(&PropertyValue::Int(341)))
        .count();
    assert_eq!(copies, 1);

    let first = sink.node_by_db_id(REACTION).unwrap();
    let second = sink.node_by_db_id(340).unwrap();
    let shared = sink.node_by_db_id(341).unwrap();
    assert!(sink.relationship(first.id, shared.id, "summation").is_some());
    assert!(sink.relationship(second.id, shared.id, "summation").is_some());
    assert_eq!(sink.relationships_of_type("summation").len(), 2);
}

#[test]
fn shared_input_keeps_per_reaction_multiplicity() {
    let source = MemorySource::builder()
        .instance(FRONT_PAGE, "FrontPage", "front page")
        .instance(PATHWAY, "Pathway", "Signal Transduction")
        .instance(350, "Reaction", "first step")
        .instance(351, "Reaction", "second step")
        .instance(352, "EntityWithAccessionedSequence", "kinase")
        .reference(FRONT_PAGE, "frontPageItem", PATHWAY)
        .reference(PATHWAY, "hasEvent", 350)
        .reference(PATHWAY, "hasEvent", 351)
        .reference(350, "input", 352)
        .reference(350, "input", 352)
        .reference(351, "input", 352)
        .reference(351, "input", 352)
        .build();
    let (summary, sink) = run_import(&source);

    // The pathway subgraph is four nodes; the front page rides along as a
    // bookkeeping import.
    assert_eq!(summary.instances, 5);
    let pathway = sink.node_by_db_id(PATHWAY).unwrap();
    let first = sink.node_by_db_id(350).unwrap();
    let second = sink.node_by_db_id(351).unwrap();
    let kinase = sink.node_by_db_id(352).unwrap();
    assert!(sink.relationship(pathway.id, first.id, "hasEvent").is_some());
    assert!(sink.relationship(pathway.id, second.id, "hasEvent").is_some());

    // One input edge per reaction, each carrying the multiplicity.
    assert_eq!(sink.relationships_of_type("input").len(), 2);
    for reaction in [first, second] {
        let input = sink.relationship(reaction.id, kinase.id, "input").unwrap();
        assert_eq!(input.properties.get("stoichiometry"), Some(&PropertyValue::Int(2)));
        assert_eq!(input.properties.get("order"), Some(&PropertyValue::Int(0)));
    }
}

#[test]
fn symmetric_relation_writes_one_edge_per_pair() {
    let source = curated_snapshot()
        .instance(310, "Reaction", "forward")
        .instance(311, "Reaction", "backward")
        .reference(PATHWAY, "hasEvent", 310)
        .reference(PATHWAY, "hasEvent", 311)
        .reference(310, "reverseReaction", 311)
        .reference(311, "reverseReaction", 310)
        .build();
    let (_, sink) = run_import(&source);

    assert_eq!(sink.relationships_of_type("reverseReaction").len(), 1);
}

#[test]
fn event_inference_is_reversed_to_the_forward_label() {
    let source = curated_snapshot()
        .instance(320, "Reaction", "inferred source")
        .reference(REACTION, "inferredFrom", 320)
        .build();
    let (_, sink) = run_import(&source);

    let reaction = sink.node_by_db_id(REACTION).unwrap();
    let origin = sink.node_by_db_id(320).unwrap();

    // Only the forward label exists, emitted origin-first.
    assert!(sink.relationships_of_type("inferredFrom").is_empty());
    assert!(sink.relationship(origin.id, reaction.id, "inferredTo").is_some());

    // The derived flag reflects the inference.
    assert_eq!(reaction.properties.get("isInferred"), Some(&PropertyValue::Bool(true)));
}

#[test]
fn orthology_follows_only_curated_events() {
    let source = curated_snapshot()
        .instance(330, "Pathway", "mouse pathway")
        .instance(331, "Pathway", "mouse pathway with backlink")
        .instance(332, "Pathway", "uncurated")
        .instance(333, "Pathway", "unreached ortholog")
        .string(PATHWAY, "_doRelease", "TRUE")
        .reference(PATHWAY, "orthologousEvent", 330)
        .reference(PATHWAY, "orthologousEvent", 331)
        .reference(331, "inferredFrom", PATHWAY)
        .reference(PATHWAY, "hasEvent", 332)
        .reference(332, "orthologousEvent", 333)
        .build();
    let (_, sink) = run_import(&source);

    let pathway = sink.node_by_db_id(PATHWAY).unwrap();
    let plain = sink.node_by_db_id(330).unwrap();
    let backlinked = sink.node_by_db_id(331).unwrap();

    // The plain ortholog links forward; the backlinked one is imported
    // without a forward edge and links through its own reversed inference.
    let inferred = sink.relationships_of_type("inferredTo");
    assert_eq!(inferred.len(), 2);
    assert!(sink.relationship(pathway.id, plain.id, "inferredTo").is_some());
    assert!(sink.relationship(pathway.id, backlinked.id, "inferredTo").is_some());

    // An event without the release flag does not pull its orthologs in.
    assert!(sink.node_by_db_id(332).is_some());
    assert!(sink.node_by_db_id(333).is_none());
}

#[test]
fn drug_subtype_resolves_from_drug_type() {
    let source = curated_snapshot()
        .instance(400, "Drug", "aspirin")
        .instance(401, "DrugType", "ChemicalDrug")
        .reference(REACTION, "input", 400)
        .reference(400, "drugType", 401)
        .build();
    let (_, sink) = run_import(&source);

    let drug = sink.node_by_db_id(400).unwrap();
    assert_eq!(drug.labels[0], "ChemicalDrug");
    assert!(drug.labels.contains(&"Drug".to_string()));
    assert!(drug.labels.contains(&"PhysicalEntity".to_string()));

    // The subtype marker itself never becomes a node.
    assert!(sink.node_by_db_id(401).is_none());
}

#[test]
fn mandatory_gaps_are_recorded_not_fatal() {
    use graphload_core::source::AttributeCategory;

    let source = curated_snapshot()
        .category("Event", "definition", Some(AttributeCategory::Mandatory))
        .build();
    let (summary, sink) = run_import(&source);

    // Pathway and reaction both lack the mandatory definition.
    assert_eq!(summary.violations, 2);
    assert_eq!(summary.instances, 3);
    assert!(sink.node_by_db_id(PATHWAY).is_some());
}

#[test]
fn schema_categories_resolve_at_most_once_per_class() {
    use graphload_core::source::AttributeCategory;

    let source = curated_snapshot()
        .instance(110, "Pathway", "second pathway")
        .reference(FRONT_PAGE, "frontPageItem", 110)
        .category("Event", "definition", Some(AttributeCategory::Optional))
        .string(PATHWAY, "definition", "first")
        .string(110, "definition", "second")
        .build();
    let (summary, _) = run_import(&source);

    assert_eq!(summary.instances, 4);
    assert_eq!(source.category_lookups("Pathway", "definition"), 1);
}

#[test]
fn rejected_instance_aborts_the_walk() {
    let source = curated_snapshot().build();
    let mut sink = MemorySink::new();
    sink.reject_label("Reaction");

    let err = run_import_into(&source, &mut sink).unwrap_err();
    match err {
        ImportError::Instance { db_id, display_name, .. } => {
            assert_eq!(db_id, DbId(REACTION));
            assert_eq!(display_name, "First step");
        }
        other => panic!("expected instance error, got {other}"),
    }
}

#[test]
fn interaction_enrichment_adds_partner_and_interaction() {
    use graphload_core::enrich::{Interaction, Interactor};

    let source = curated_snapshot()
        .instance(500, "EntityWithAccessionedSequence", "KRAS protein")
        .instance(501, "ReferenceGeneProduct", "UniProt:P12345 KRAS")
        .instance(502, "ReferenceDatabase", "UniProt")
        .instance(503, "Species", "Homo sapiens")
        .instance(504, "DatabaseIdentifier", "NCBI:9606")
        .reference(REACTION, "input", 500)
        .reference(500, "referenceEntity", 501)
        .string(501, "identifier", "P12345")
        .reference(501, "referenceDatabase", 502)
        .reference(501, "species", 503)
        .string(502, "accessUrl", "http://purl.uniprot.org/uniprot/###ID###")
        .reference(503, "crossReference", 504)
        .string(504, "identifier", "9606")
        .build();

    let partner = Interactor {
        accession: "Q67890".to_string(),
        resource: "uniprotkb".to_string(),
        tax_id: "9606".to_string(),
        gene_name: Some("TP53".to_string()),
        alias: None,
        synonyms: vec!["p53".to_string()],
    };
    let interaction = Interaction {
        partner,
        score: 0.87,
        evidence: vec!["EBI-1234".to_string()],
    };
    // The same pair twice: the duplicate must collapse.
    let dataset = StaticInteractions::new()
        .with("UniProt:P12345", interaction.clone())
        .with("UniProt:P12345", interaction);
    let taxonomy = FixedTaxonomy::new();

    let (summary, sink) = run_import_with_interactions(&source, &dataset, &taxonomy);
    assert_eq!(summary.interactions, 1);

    let partner_node = node_named(&sink, "Q67890 TP53").unwrap();
    assert_eq!(partner_node.labels[0], "ReferenceGeneProduct");
    assert_eq!(
        partner_node.properties.get("identifier"),
        Some(&PropertyValue::Str("Q67890".into()))
    );
    assert_eq!(
        partner_node.properties.get("geneName"),
        Some(&PropertyValue::StrList(vec!["TP53".into()]))
    );
    assert_eq!(
        partner_node.properties.get("secondaryIdentifier"),
        Some(&PropertyValue::StrList(vec!["p53".into()]))
    );

    // Partner wired to the curated UniProt node, not the synthetic one.
    let uniprot = sink.node_by_db_id(502).unwrap();
    assert!(sink.relationship(partner_node.id, uniprot.id, "referenceDatabase").is_some());

    // Species resolved through the registered taxonomy id.
    let species = sink.node_by_db_id(503).unwrap();
    assert!(sink.relationship(partner_node.id, species.id, "species").is_some());

    let interaction_node = node_named(&sink, "UniProt:P12345 <-> Q67890 (IntAct)").unwrap();
    assert_eq!(interaction_node.labels[0], "UndirectedInteraction");
    assert_eq!(
        interaction_node.properties.get("score"),
        Some(&PropertyValue::Float(0.87))
    );

    // Two interactor edges: the curated side and the partner.
    let curated = sink.node_by_db_id(501).unwrap();
    let first = sink
        .relationship(interaction_node.id, curated.id, "interactor")
        .unwrap();
    assert_eq!(first.properties.get("order"), Some(&PropertyValue::Int(1)));
    let second = sink
        .relationship(interaction_node.id, partner_node.id, "interactor")
        .unwrap();
    assert_eq!(second.properties.get("order"), Some(&PropertyValue::Int(2)));

    // Every synthetic node carries importer provenance.
    let importer = node_named(&sink, "Interactions Importer").unwrap();
    assert_eq!(importer.labels[0], "Person");
    assert_eq!(sink.relationships_of_type("author").len(), 3);
    assert_eq!(sink.relationships_of_type("created").len(), 3);
}

#[test]
fn chemical_partner_becomes_reference_molecule() {
    use graphload_core::enrich::{Interaction, Interactor};

    let source = curated_snapshot()
        .instance(500, "EntityWithAccessionedSequence", "KRAS protein")
        .instance(501, "ReferenceGeneProduct", "UniProt:P12345 KRAS")
        .instance(502, "ReferenceDatabase", "UniProt")
        .reference(REACTION, "input", 500)
        .reference(500, "referenceEntity", 501)
        .string(501, "identifier", "P12345")
        .reference(501, "referenceDatabase", 502)
        .build();

    let dataset = StaticInteractions::new().with(
        "UniProt:P12345",
        Interaction {
            partner: Interactor {
                accession: "CHEBI:15377".to_string(),
                resource: "chebi".to_string(),
                tax_id: "-1".to_string(),
                gene_name: None,
                alias: Some("water".to_string()),
                synonyms: Vec::new(),
            },
            score: 0.42,
            evidence: vec!["EBI-9".to_string()],
        },
    );
    let taxonomy = FixedTaxonomy::new();

    let (summary, sink) = run_import_with_interactions(&source, &dataset, &taxonomy);
    assert_eq!(summary.interactions, 1);

    let partner = node_named(&sink, "CHEBI:15377").unwrap();
    assert_eq!(partner.labels[0], "ReferenceMolecule");
    assert_eq!(
        partner.properties.get("identifier"),
        Some(&PropertyValue::Str("15377".into()))
    );
    assert_eq!(
        partner.properties.get("name"),
        Some(&PropertyValue::StrList(vec!["water".into()]))
    );
    // No curated species for the placeholder taxonomy id.
    assert!(
        !sink
            .relationships_of_type("species")
            .iter()
            .any(|r| r.from == partner.id)
    );
}
