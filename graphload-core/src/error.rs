use crate::source::DbId;

/// Top-level graphload error type.
///
/// All fallible operations in `graphload-core` return [`Result<T, ImportError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    /// Error from the relational source store (`SQLite` operations, schema lookups).
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Error from the graph sink (node/relationship creation, finalization).
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// A single instance could not be written to the sink. Carries the
    /// source identity so the offending curation entry can be located.
    #[error("Cannot persist instance {db_id} ({display_name}): {source}")]
    Instance {
        /// Source database id of the instance that failed.
        db_id: DbId,
        /// Display name of the instance that failed.
        display_name: String,
        /// Underlying sink failure.
        source: SinkError,
    },

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error reading or applying the interaction dataset.
    #[error("Interaction error: {0}")]
    Enrich(#[from] EnrichError),
}

/// Errors from the relational curation snapshot.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// Underlying `SQLite` operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A referenced instance does not exist in the snapshot.
    #[error("Instance not found: {0}")]
    InstanceNotFound(DbId),

    /// A stored value could not be interpreted (bad type tag, bad number).
    #[error("Malformed source data: {0}")]
    Malformed(String),
}

/// Errors from the bulk graph sink.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    /// Filesystem I/O error on the target directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization of a node or relationship record failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The sink rejected a record (bad property bag, unknown node id).
    #[error("Record rejected: {0}")]
    Rejected(String),

    /// A write was attempted after `shutdown`, or `shutdown` ran twice.
    #[error("Sink is already finalized")]
    Finalized,
}

/// Errors in graphload configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors reading the external interaction dataset.
#[derive(thiserror::Error, Debug)]
pub enum EnrichError {
    /// Filesystem I/O error reading the dataset.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A dataset line did not match the expected column layout.
    #[error("Malformed interaction record: {0}")]
    Malformed(String),

    /// Taxonomy lookup over HTTP failed.
    #[error("Taxonomy lookup failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenience alias for `Result<T, ImportError>`.
pub type Result<T> = std::result::Result<T, ImportError>;
