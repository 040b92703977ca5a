//! Query node builder and its frozen snapshot.

use super::aggregation::AggregationSpec;
use super::expr::{BoolExpr, Expr};
use super::page::{Page, SortSpec};
use crate::error::FederationError;
use crate::types::TypeTag;
use serde::Serialize;

/// Mutable query builder targeting the collection of one entity type.
///
/// Clauses and aggregations accumulate until [`QueryNode::build`] freezes the
/// node into a [`QuerySnapshot`]. Dependency edges keep mutating the node
/// after construction, up to the moment it is executed.
#[derive(Debug, Clone)]
pub struct QueryNode {
    label: String,
    target: TypeTag,
    query: BoolExpr,
    aggregations: Vec<AggregationSpec>,
    sort: Vec<SortSpec>,
}

impl QueryNode {
    /// Create a node for `target`; the label defaults to the type tag
    pub fn new(target: impl Into<TypeTag>) -> Self {
        let target = target.into();
        Self {
            label: target.clone(),
            target,
            query: BoolExpr::default(),
            aggregations: Vec::new(),
            sort: Vec::new(),
        }
    }

    /// Name used in logs and errors
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn must(&mut self, expr: Expr) -> &mut Self {
        self.query.must.push(expr);
        self
    }

    pub fn should(&mut self, expr: Expr) -> &mut Self {
        self.query.should.push(expr);
        self
    }

    pub fn filter(&mut self, expr: Expr) -> &mut Self {
        self.query.filter.push(expr);
        self
    }

    pub fn must_not(&mut self, expr: Expr) -> &mut Self {
        self.query.must_not.push(expr);
        self
    }

    pub fn minimum_should_match(&mut self, n: usize) -> &mut Self {
        self.query.minimum_should_match = Some(n);
        self
    }

    pub fn aggregate(&mut self, spec: AggregationSpec) -> &mut Self {
        self.aggregations.push(spec);
        self
    }

    pub fn sort(&mut self, spec: SortSpec) -> &mut Self {
        self.sort.push(spec);
        self
    }

    pub fn query(&self) -> &BoolExpr {
        &self.query
    }

    pub fn aggregations(&self) -> &[AggregationSpec] {
        &self.aggregations
    }

    /// Freeze the node into an executable description.
    ///
    /// An unpaged build carries no sort: only aggregations are computed.
    pub fn build(&self, page: Page) -> Result<QuerySnapshot, FederationError> {
        page.validate()?;
        let query = if self.query.is_empty() {
            Expr::MatchAll
        } else {
            Expr::Bool(self.query.clone())
        };
        let sort = if page.is_unpaged() {
            Vec::new()
        } else {
            self.sort.clone()
        };
        Ok(QuerySnapshot {
            label: self.label.clone(),
            target: self.target.clone(),
            query,
            aggregations: self.aggregations.clone(),
            sort,
            page,
        })
    }
}

/// Immutable, executable description of one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySnapshot {
    label: String,
    target: TypeTag,
    query: Expr,
    aggregations: Vec<AggregationSpec>,
    sort: Vec<SortSpec>,
    page: Page,
}

impl QuerySnapshot {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn query(&self) -> &Expr {
        &self.query
    }

    pub fn aggregations(&self) -> &[AggregationSpec] {
        &self.aggregations
    }

    pub fn sort(&self) -> &[SortSpec] {
        &self.sort
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Short content hash used to correlate log lines for one query
    pub fn fingerprint(&self) -> String {
        let encoded = serde_json::to_vec(self).unwrap_or_default();
        let digest = blake3::hash(&encoded);
        hex::encode(&digest.as_bytes()[..6])
    }
}
