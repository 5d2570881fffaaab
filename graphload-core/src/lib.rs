//! Graphload core library — batch migration of a relational curation
//! snapshot into a labeled property graph.
//!
//! The main entry point is [`engine::ImportSession`], which drives one
//! complete load from a [`source::SourceStore`] into a [`sink::GraphSink`].

pub mod config;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod model;
pub mod progress;
pub mod providers;
pub mod sink;
pub mod source;
pub mod taxonomy;
