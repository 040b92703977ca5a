//! CLI presentation: text and json formatters per command family.

mod attestation;
mod document;
mod search;
mod shared;

pub use attestation::format_attestations_text;
pub use document::{format_document_text, format_envelope_text};
pub use search::format_search_text;
pub use shared::{format_config_text, to_json};
