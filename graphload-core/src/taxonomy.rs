//! Taxonomy lineage lookups for interaction partners.
//!
//! The curation snapshot only knows the species it curates. Interaction
//! partners come with arbitrary NCBI taxonomy ids, so unknown ids are
//! walked one level up through the Ensembl REST API in the hope that the
//! parent is a curated species.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::EnrichError;
use crate::source::DbId;

/// Resolves a taxonomy id to its parent taxonomy id.
pub trait TaxonomyClient {
    fn parent_tax_id(&self, tax_id: &str) -> Result<Option<String>, EnrichError>;
}

/// Client for the Ensembl taxonomy REST endpoint.
pub struct EnsemblClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl EnsemblClient {
    pub fn new() -> Result<Self, EnrichError> {
        Self::with_base_url("https://rest.ensembl.org")
    }

    /// Point the client somewhere else, for tests against a local server.
    pub fn with_base_url(base_url: &str) -> Result<Self, EnrichError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn fetch(&self, tax_id: &str) -> Result<reqwest::blocking::Response, EnrichError> {
        let url = format!("{}/taxonomy/id/{tax_id}?content-type=application/json", self.base_url);
        let response = self.http.get(&url).send()?;

        // The endpoint rate-limits; honor Retry-After once.
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let delay = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<f64>().ok());
            if let Some(seconds) = delay {
                debug!(tax_id, seconds, "rate limited, retrying after delay");
                thread::sleep(Duration::from_secs_f64(seconds));
                return Ok(self.http.get(&url).send()?);
            }
        }
        Ok(response)
    }
}

impl TaxonomyClient for EnsemblClient {
    fn parent_tax_id(&self, tax_id: &str) -> Result<Option<String>, EnrichError> {
        let response = self.fetch(tax_id)?;
        if !response.status().is_success() {
            warn!(tax_id, status = %response.status(), "taxonomy lookup failed");
            return Ok(None);
        }
        let body: serde_json::Value = response.json()?;
        Ok(body
            .get("parent")
            .and_then(|parent| parent.get("id"))
            .map(|id| match id {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }))
    }
}

/// One-level lineage resolution against the known-species table, with
/// memoization of resolved ids.
pub struct TaxonomyHelper<'a> {
    client: &'a dyn TaxonomyClient,
}

impl<'a> TaxonomyHelper<'a> {
    pub fn new(client: &'a dyn TaxonomyClient) -> Self {
        Self { client }
    }

    /// Species instance for `tax_id`. A direct hit in `known` is used as
    /// is; otherwise the parent taxon is looked up and, on a hit, the id
    /// is memoized into `known`. The root and placeholder ids never
    /// resolve.
    pub fn species_for(&self, tax_id: &str, known: &mut HashMap<String, DbId>) -> Option<DbId> {
        if matches!(tax_id, "1" | "0" | "-1") {
            return None;
        }
        if let Some(&species) = known.get(tax_id) {
            return Some(species);
        }
        let parent = match self.client.parent_tax_id(tax_id) {
            Ok(Some(parent)) => parent,
            Ok(None) => return None,
            Err(e) => {
                warn!(tax_id, error = %e, "cannot resolve taxonomy lineage");
                return None;
            }
        };
        let species = known.get(&parent).copied()?;
        known.insert(tax_id.to_string(), species);
        Some(species)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FixedParents {
        parents: HashMap<String, String>,
        calls: RefCell<Vec<String>>,
    }

    impl TaxonomyClient for FixedParents {
        fn parent_tax_id(&self, tax_id: &str) -> Result<Option<String>, EnrichError> {
            self.calls.borrow_mut().push(tax_id.to_string());
            Ok(self.parents.get(tax_id).cloned())
        }
    }

    fn client(pairs: &[(&str, &str)]) -> FixedParents {
        FixedParents {
            parents: pairs.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect(),
            calls: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn direct_hit_skips_lookup() {
        let client = client(&[]);
        let helper = TaxonomyHelper::new(&client);
        let mut known = HashMap::from([("9606".to_string(), DbId(48887))]);
        assert_eq!(helper.species_for("9606", &mut known), Some(DbId(48887)));
        assert!(client.calls.borrow().is_empty());
    }

    #[test]
    fn parent_hit_resolves_and_memoizes() {
        let client = client(&[("63221", "9606")]);
        let helper = TaxonomyHelper::new(&client);
        let mut known = HashMap::from([("9606".to_string(), DbId(48887))]);

        assert_eq!(helper.species_for("63221", &mut known), Some(DbId(48887)));
        assert_eq!(known.get("63221"), Some(&DbId(48887)));

        // Second resolution is served from the table.
        assert_eq!(helper.species_for("63221", &mut known), Some(DbId(48887)));
        assert_eq!(client.calls.borrow().len(), 1);
    }

    #[test]
    fn unknown_parent_resolves_to_none() {
        let client = client(&[("12345", "99999")]);
        let helper = TaxonomyHelper::new(&client);
        let mut known = HashMap::from([("9606".to_string(), DbId(48887))]);
        assert_eq!(helper.species_for("12345", &mut known), None);
        assert!(!known.contains_key("12345"));
    }

    #[test]
    fn placeholder_ids_short_circuit() {
        let client = client(&[]);
        let helper = TaxonomyHelper::new(&client);
        let mut known = HashMap::new();
        for id in ["1", "0", "-1"] {
            assert_eq!(helper.species_for(id, &mut known), None);
        }
        assert!(client.calls.borrow().is_empty());
    }
}
