//! Query federation: dependency graphs between single-collection queries and
//! their producers-first execution.

pub mod cancel;
pub mod graph;
pub mod scheduler;

pub use cancel::CancellationFlag;
pub use graph::{DependencyEdge, NodeId, QueryGraph};
pub use scheduler::Scheduler;
