//! Query building: boolean filter DSL, aggregations, paging and the query node builder.

pub mod aggregation;
pub mod expr;
pub mod node;
pub mod page;

pub use aggregation::{AggregationSpec, DEFAULT_FACET_SIZE, ID_AGGREGATION};
pub use expr::{normalize_text, BoolExpr, Expr, MatchOperator};
pub use node::{QueryNode, QuerySnapshot};
pub use page::{Page, SortOrder, SortSpec};
