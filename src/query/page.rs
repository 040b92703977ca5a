//! Paging and sort specifications.

use crate::error::FederationError;
use serde::{Deserialize, Serialize};

/// Requested result window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    /// Zero-based page `number` of `size` hits
    Paged { number: usize, size: usize },
    /// No hit payload; only aggregations are computed
    Unpaged,
}

impl Page {
    pub fn of(number: usize, size: usize) -> Self {
        Page::Paged { number, size }
    }

    pub fn is_unpaged(&self) -> bool {
        matches!(self, Page::Unpaged)
    }

    /// Offset of the first hit
    pub fn offset(&self) -> usize {
        match self {
            Page::Paged { number, size } => number.saturating_mul(*size),
            Page::Unpaged => 0,
        }
    }

    /// Number of hits to fetch
    pub fn fetch_size(&self) -> usize {
        match self {
            Page::Paged { size, .. } => *size,
            Page::Unpaged => 0,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), FederationError> {
        match self {
            Page::Paged { size: 0, .. } => Err(FederationError::InvalidPage(
                "page size must be greater than zero".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }

    /// Parse `field_asc` / `field_desc`; a bare field sorts ascending
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        if let Some(field) = spec.strip_suffix("_desc") {
            return (!field.is_empty()).then(|| Self::desc(field));
        }
        let field = spec.strip_suffix("_asc").unwrap_or(spec);
        (!field.is_empty()).then(|| Self::asc(field))
    }
}
