//! Declarations of the pathway-curation model.
//!
//! Field order within a type is the order relationships are expanded in,
//! so it is load-bearing for edge `order` values.

use super::{ModelRegistry, ScalarKind::*, TypeDescriptor};

pub(super) fn build() -> ModelRegistry {
    let mut m = ModelRegistry::new();

    m.insert(
        TypeDescriptor::new("DatabaseObject")
            .added_prop("stId", Str)
            .rel("created")
            .rel("modified")
            .added_rel("modifiedList"),
    );

    // Events
    m.insert(
        TypeDescriptor::new("Event")
            .parent("DatabaseObject")
            .implements("Trackable")
            .implements("Deletable")
            .prop_list("name", Str)
            .prop("definition", Str)
            .prop("releaseDate", Str)
            .prop("releaseStatus", Str)
            .renamed_prop("doRelease", "_doRelease", Bool)
            .added_prop("speciesName", Str)
            .added_prop("isInDisease", Bool)
            .added_prop("isInferred", Bool)
            .rel("authored")
            .rel("edited")
            .rel("reviewed")
            .rel("revised")
            .rel("species")
            .rel("relatedSpecies")
            .rel("summation")
            .rel("literatureReference")
            .rel("goBiologicalProcess")
            .rel("compartment")
            .rel("disease")
            .rel("crossReference")
            .rel("figure")
            .rel("precedingEvent")
            .rel("inferredFrom")
            .rel("orthologousEvent"),
    );
    m.insert(
        TypeDescriptor::new("Pathway")
            .parent("Event")
            .prop("doi", Str)
            .added_prop("hasDiagram", Bool)
            .added_prop("hasEHLD", Bool)
            .rel("hasEvent")
            .rel("normalPathway"),
    );
    m.insert(TypeDescriptor::new("TopLevelPathway").parent("Pathway"));
    m.insert(
        TypeDescriptor::new("ReactionLikeEvent")
            .parent("Event")
            .prop("isChimeric", Bool)
            .prop("systematicName", Str)
            .rel("input")
            .rel("output")
            .rel("catalystActivity")
            .rel("regulatedBy")
            .rel("entityFunctionalStatus")
            .rel("normalReaction"),
    );
    m.insert(TypeDescriptor::new("Reaction").parent("ReactionLikeEvent").rel("reverseReaction"));
    m.insert(TypeDescriptor::new("BlackBoxEvent").parent("ReactionLikeEvent").rel("templateEvent"));
    m.insert(TypeDescriptor::new("Polymerisation").parent("ReactionLikeEvent"));
    m.insert(TypeDescriptor::new("Depolymerisation").parent("ReactionLikeEvent"));
    m.insert(TypeDescriptor::new("FailedReaction").parent("ReactionLikeEvent"));

    // Physical entities
    m.insert(
        TypeDescriptor::new("PhysicalEntity")
            .parent("DatabaseObject")
            .implements("Trackable")
            .implements("Deletable")
            .prop_list("name", Str)
            .prop("definition", Str)
            .prop("systematicName", Str)
            .added_prop("speciesName", Str)
            .added_prop("isInDisease", Bool)
            .rel("authored")
            .rel("edited")
            .rel("reviewed")
            .rel("compartment")
            .rel("crossReference")
            .rel("disease")
            .rel("figure")
            .rel("goCellularComponent")
            .rel("summation")
            .rel("literatureReference")
            .rel("inferredTo")
            .transient_rel("inferredFrom"),
    );
    m.insert(
        TypeDescriptor::new("Complex")
            .parent("PhysicalEntity")
            .prop("isChimeric", Bool)
            .prop("stoichiometryKnown", Bool)
            .rel("hasComponent")
            .rel("species")
            .rel("includedLocation"),
    );
    m.insert(
        TypeDescriptor::new("EntitySet")
            .parent("PhysicalEntity")
            .prop("isOrdered", Bool)
            .rel("hasMember")
            .rel("species"),
    );
    m.insert(TypeDescriptor::new("DefinedSet").parent("EntitySet"));
    m.insert(TypeDescriptor::new("CandidateSet").parent("EntitySet").rel("hasCandidate"));
    m.insert(
        TypeDescriptor::new("SimpleEntity")
            .parent("PhysicalEntity")
            .added_prop("referenceType", Str)
            .rel("referenceEntity")
            .rel("species"),
    );
    m.insert(
        TypeDescriptor::new("GenomeEncodedEntity")
            .parent("PhysicalEntity")
            .rel("species"),
    );
    m.insert(
        TypeDescriptor::new("EntityWithAccessionedSequence")
            .parent("GenomeEncodedEntity")
            .prop("startCoordinate", Int)
            .prop("endCoordinate", Int)
            .added_prop("referenceType", Str)
            .rel("referenceEntity")
            .rel("hasModifiedResidue"),
    );
    m.insert(TypeDescriptor::new("OtherEntity").parent("PhysicalEntity"));
    m.insert(TypeDescriptor::new("Polymer").parent("PhysicalEntity").rel("repeatedUnit").rel("species"));
    m.insert(
        TypeDescriptor::new("Drug")
            .parent("PhysicalEntity")
            .added_prop("referenceType", Str)
            .rel("referenceEntity")
            .transient_rel("drugType"),
    );
    m.insert(TypeDescriptor::new("ChemicalDrug").parent("Drug"));
    m.insert(TypeDescriptor::new("ProteinDrug").parent("Drug"));
    m.insert(TypeDescriptor::new("RNADrug").parent("Drug"));

    // Reference entities
    m.insert(
        TypeDescriptor::new("ReferenceEntity")
            .parent("DatabaseObject")
            .prop("identifier", Str)
            .prop_list("name", Str)
            .prop_list("otherIdentifier", Str)
            .prop_list("secondaryIdentifier", Str)
            .added_prop("url", Str)
            .rel("crossReference")
            .rel("referenceDatabase"),
    );
    m.insert(
        TypeDescriptor::new("ReferenceSequence")
            .parent("ReferenceEntity")
            .prop_list("geneName", Str)
            .prop_list("comment", Str)
            .prop("sequenceLength", Int)
            .rel("species"),
    );
    m.insert(
        TypeDescriptor::new("ReferenceGeneProduct")
            .parent("ReferenceSequence")
            .renamed_prop("chainChangeLog", "_chainChangeLog", Str)
            .rel("referenceGene")
            .rel("referenceTranscript"),
    );
    m.insert(
        TypeDescriptor::new("ReferenceIsoform")
            .parent("ReferenceGeneProduct")
            .prop("variantIdentifier", Str)
            .rel("isoformParent"),
    );
    m.insert(TypeDescriptor::new("ReferenceDNASequence").parent("ReferenceSequence"));
    m.insert(TypeDescriptor::new("ReferenceRNASequence").parent("ReferenceSequence"));
    m.insert(
        TypeDescriptor::new("ReferenceMolecule")
            .parent("ReferenceEntity")
            .prop("formula", Str)
            .added_prop("trivial", Bool),
    );
    m.insert(
        TypeDescriptor::new("ReferenceTherapeutic")
            .parent("ReferenceEntity")
            .prop_list("approvalSource", Str)
            .prop("type", Str),
    );
    m.insert(
        TypeDescriptor::new("ReferenceDatabase")
            .parent("DatabaseObject")
            .prop_list("name", Str)
            .prop("accessUrl", Str)
            .prop("url", Str),
    );

    m.insert(
        TypeDescriptor::new("DatabaseIdentifier")
            .parent("DatabaseObject")
            .prop("identifier", Str)
            .added_prop("url", Str)
            .rel("crossReference")
            .rel("referenceDatabase"),
    );

    // Taxonomy
    m.insert(
        TypeDescriptor::new("Taxon")
            .parent("DatabaseObject")
            .prop_list("name", Str)
            .added_prop("taxId", Str)
            .rel("superTaxon")
            .rel("crossReference"),
    );
    m.insert(TypeDescriptor::new("Species").parent("Taxon").prop("abbreviation", Str));

    // Provenance
    m.insert(
        TypeDescriptor::new("Person")
            .parent("DatabaseObject")
            .prop("firstname", Str)
            .prop("surname", Str)
            .prop("initial", Str)
            .prop("eMailAddress", Str)
            .prop("project", Str)
            .added_prop("orcidId", Str)
            .rel("affiliation")
            .rel("figure"),
    );
    m.insert(
        TypeDescriptor::new("InstanceEdit")
            .parent("DatabaseObject")
            .prop("dateTime", Str)
            .prop("note", Str)
            .rel("author"),
    );
    m.insert(TypeDescriptor::new("Affiliation").parent("DatabaseObject").prop_list("name", Str).prop("address", Str));
    m.insert(
        TypeDescriptor::new("Publication")
            .parent("DatabaseObject")
            .prop("title", Str)
            .rel("author"),
    );
    m.insert(
        TypeDescriptor::new("LiteratureReference")
            .parent("Publication")
            .prop("journal", Str)
            .prop("pages", Str)
            .prop("pubMedIdentifier", Int)
            .prop("volume", Int)
            .prop("year", Int),
    );
    m.insert(TypeDescriptor::new("Book").parent("Publication").prop("ISBN", Str).prop("year", Int));
    m.insert(TypeDescriptor::new("URL").parent("Publication").prop("uniformResourceLocator", Str));
    m.insert(
        TypeDescriptor::new("Summation")
            .parent("DatabaseObject")
            .prop("text", Str)
            .rel("literatureReference"),
    );
    m.insert(TypeDescriptor::new("Figure").parent("DatabaseObject").prop("url", Str));

    // Ontology terms
    m.insert(
        TypeDescriptor::new("GO_Term")
            .parent("DatabaseObject")
            .renamed_prop("identifier", "accession", Str)
            .prop("definition", Str)
            .prop_list("name", Str)
            .added_prop("url", Str)
            .rel("referenceDatabase"),
    );
    m.insert(TypeDescriptor::new("GO_BiologicalProcess").parent("GO_Term"));
    m.insert(TypeDescriptor::new("GO_MolecularFunction").parent("GO_Term").prop_list("ecNumber", Str));
    m.insert(TypeDescriptor::new("GO_CellularComponent").parent("GO_Term"));
    m.insert(TypeDescriptor::new("Compartment").parent("GO_CellularComponent"));
    m.insert(
        TypeDescriptor::new("Disease")
            .parent("DatabaseObject")
            .renamed_prop("identifier", "accession", Str)
            .prop_list("name", Str)
            .prop_list("synonym", Str)
            .added_prop("url", Str)
            .rel("referenceDatabase"),
    );

    // Catalysis and regulation
    m.insert(
        TypeDescriptor::new("CatalystActivity")
            .parent("DatabaseObject")
            .rel("physicalEntity")
            .rel("activity")
            .rel("activeUnit")
            .rel("literatureReference"),
    );
    m.insert(
        TypeDescriptor::new("Regulation")
            .parent("DatabaseObject")
            .rel("regulator")
            .rel("summation")
            .rel("literatureReference"),
    );
    m.insert(TypeDescriptor::new("PositiveRegulation").parent("Regulation"));
    m.insert(TypeDescriptor::new("NegativeRegulation").parent("Regulation"));
    m.insert(TypeDescriptor::new("Requirement").parent("PositiveRegulation"));
    m.insert(
        TypeDescriptor::new("EntityFunctionalStatus")
            .parent("DatabaseObject")
            .rel("diseaseEntity")
            .rel("normalEntity")
            .rel("functionalStatus"),
    );
    m.insert(TypeDescriptor::new("FunctionalStatus").parent("DatabaseObject").rel("functionalStatusType"));
    m.insert(TypeDescriptor::new("FunctionalStatusType").parent("DatabaseObject").prop_list("name", Str));
    m.insert(
        TypeDescriptor::new("AbstractModifiedResidue")
            .parent("DatabaseObject")
            .rel("referenceSequence"),
    );
    m.insert(TypeDescriptor::new("TranslationalModification").parent("AbstractModifiedResidue").prop("coordinate", Int).rel("psiMod"));
    m.insert(TypeDescriptor::new("ModifiedResidue").parent("TranslationalModification"));
    m.insert(TypeDescriptor::new("PsiMod").parent("DatabaseObject").renamed_prop("identifier", "accession", Str).prop_list("name", Str).added_prop("url", Str).rel("referenceDatabase"));

    // Bookkeeping classes imported whole
    m.insert(
        TypeDescriptor::new("StableIdentifier")
            .parent("DatabaseObject")
            .prop("identifier", Str)
            .prop("identifierVersion", Str),
    );
    m.insert(
        TypeDescriptor::new("DeletedInstance")
            .parent("DatabaseObject")
            .renamed_prop("className", "class", Str)
            .prop("name", Str)
            .added_prop("deletedStId", Str)
            .rel("species"),
    );
    m.insert(
        TypeDescriptor::new("Deleted")
            .parent("DatabaseObject")
            .prop("curatorComment", Str)
            .prop_list("deletedInstanceDbId", Int)
            .rel("deletedInstance")
            .rel("replacementInstances")
            .rel("reason"),
    );
    m.insert(TypeDescriptor::new("DeletedControlledVocabulary").parent("DatabaseObject").prop_list("name", Str));
    m.insert(
        TypeDescriptor::new("Release")
            .parent("DatabaseObject")
            .prop("releaseNumber", Int)
            .prop("releaseDate", Str),
    );
    m.insert(
        TypeDescriptor::new("UpdateTracker")
            .parent("DatabaseObject")
            .prop_list("action", Str)
            .renamed_rel("release", "_release")
            .rel("updatedInstance"),
    );
    m.insert(TypeDescriptor::new("FrontPage").parent("DatabaseObject").rel("frontPageItem"));
    m.insert(
        TypeDescriptor::new("PathwayDiagram")
            .parent("DatabaseObject")
            .prop("width", Int)
            .prop("height", Int)
            .rel("representedPathway"),
    );

    // Interaction enrichment output
    m.insert(
        TypeDescriptor::new("UndirectedInteraction")
            .parent("DatabaseObject")
            .prop("score", Float)
            .prop_list("accession", Str)
            .prop("url", Str)
            .prop("databaseName", Str)
            .added_rel("interactor")
            .rel("referenceDatabase"),
    );

    m
}
