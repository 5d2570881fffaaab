//! The import engine: schema introspection, field classification,
//! consistency checking, instance translation, relationship aggregation,
//! and the depth-first walk, all driven by one [`ImportSession`].

pub mod aggregate;
pub mod classify;
pub mod consistency;
pub mod introspect;
pub mod session;
mod translate;
mod walker;

pub use consistency::{ConsistencyLedger, Violation, ViolationKind, TAXONOMY_ROOT};
pub use session::{ImportSession, ImportSummary, SessionOptions};
