//! Attestation trees: hierarchy reconstruction from object paths and count
//! folding into nested period summaries.

pub mod period;
pub mod tree;

pub use period::{NestedAttestation, Period};
pub use tree::AttestationTree;
