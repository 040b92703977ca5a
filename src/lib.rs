//! Scriptorium: Query Federation and Entity Resolution
//!
//! Federated search over a schemaless text-corpus document store. Queries are
//! nodes in a dependency graph whose producers hand id sets to their
//! consumers; typed references in results are hydrated in bulk, and dating
//! thesaurus entries are folded into nested attestation summaries.

pub mod attestation;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod executor;
pub mod federation;
pub mod logging;
pub mod query;
pub mod registry;
pub mod resolver;
pub mod result;
pub mod search;
pub mod service;
pub mod store;
pub mod types;
