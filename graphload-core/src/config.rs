use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level graphload configuration, matching `graphload.toml`.
///
/// Every field has a default so a missing or partial file still yields a
/// usable configuration; CLI flags override file values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub target: TargetSection,
    #[serde(default)]
    pub interactions: InteractionsSection,
}

impl ImportConfig {
    /// Load configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Path to the relational curation snapshot (SQLite database).
    pub path: PathBuf,
    /// Logical database name written into the graph's info node.
    pub name: String,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("curation.db"),
            name: "curation".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSection {
    /// Directory the bulk sink writes into. Cleared and recreated on open.
    pub path: PathBuf,
    /// Finish the progress bar at 100% even when bookkeeping estimates
    /// left it short. Disable for clean logs in batch environments.
    pub complete_progress: bool,
}

impl Default for TargetSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("graph.out"),
            complete_progress: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionsSection {
    /// Run the interaction enrichment pass after the main walk.
    pub enabled: bool,
    /// Pre-fetched tab-separated interaction dataset.
    pub file: Option<PathBuf>,
    /// Tab-separated list of trivial small-molecule accessions.
    pub trivial_molecules: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = ImportConfig::default();
        assert_eq!(config.source.name, "curation");
        assert!(config.target.complete_progress);
        assert!(!config.interactions.enabled);
    }

    #[test]
    fn parses_partial_file() {
        let config: ImportConfig = toml::from_str(
            r#"
            [source]
            path = "snapshot.db"
            name = "reactome"

            [interactions]
            enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(config.source.name, "reactome");
        assert!(config.interactions.enabled);
        assert!(config.interactions.file.is_none());
        assert_eq!(config.target.path, PathBuf::from("graph.out"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = ImportConfig::from_path(Path::new("/nonexistent/graphload.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
