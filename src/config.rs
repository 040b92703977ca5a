//! Configuration System
//!
//! Layered configuration: built-in defaults, the global user file, workspace
//! files and `SCRIPTORIUM__SECTION__KEY` environment variables, later sources
//! overriding earlier ones.

use crate::logging::LoggingConfig;
use crate::types::tags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub federation: FederationConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Type tag → collection name; every entry becomes a registry entry
    #[serde(default = "default_collections")]
    pub collections: BTreeMap<String, String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            federation: FederationConfig::default(),
            resolver: ResolverConfig::default(),
            collections: default_collections(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_collections() -> BTreeMap<String, String> {
    tags::ALL
        .iter()
        .map(|tag| (tag.to_string(), format!("{}_entries", tag)))
        .collect()
}

/// Document store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sled,
    Http,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Sled => write!(f, "sled"),
            StoreBackend::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Base URL of the search service (http backend)
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Database directory (sled backend)
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Per-call timeout in milliseconds; 0 disables it
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Sled
}

fn default_store_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".scriptorium/store")
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_store_url(),
            path: default_store_path(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.backend {
            StoreBackend::Http if !self.url.starts_with("http://") && !self.url.starts_with("https://") => {
                Err(format!("url '{}' must start with http:// or https://", self.url))
            }
            StoreBackend::Sled if self.path.as_os_str().is_empty() => {
                Err("path cannot be empty for the sled backend".to_string())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Bucket limit of id-handoff aggregations; joins larger than this truncate
    #[serde(default = "default_id_aggregation_size")]
    pub id_aggregation_size: usize,

    /// Producers executed at once; 1 runs the execution order strictly in sequence
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,

    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    #[serde(default = "default_facet_size")]
    pub facet_size: usize,
}

fn default_id_aggregation_size() -> usize {
    100_000
}

fn default_max_concurrent_queries() -> usize {
    1
}

fn default_page_size() -> usize {
    20
}

fn default_facet_size() -> usize {
    crate::query::DEFAULT_FACET_SIZE
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            id_aggregation_size: default_id_aggregation_size(),
            max_concurrent_queries: default_max_concurrent_queries(),
            default_page_size: default_page_size(),
            facet_size: default_facet_size(),
        }
    }
}

impl FederationConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.id_aggregation_size == 0 {
            problems.push("id_aggregation_size must be greater than zero".to_string());
        }
        if self.max_concurrent_queries == 0 {
            problems.push("max_concurrent_queries must be at least 1".to_string());
        }
        if self.default_page_size == 0 {
            problems.push("default_page_size must be greater than zero".to_string());
        }
        if self.facet_size == 0 {
            problems.push("facet_size must be greater than zero".to_string());
        }
        problems
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

fn default_max_concurrent_fetches() -> usize {
    crate::resolver::DEFAULT_MAX_CONCURRENT_FETCHES
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Store(String),
    Federation(String),
    Resolver(String),
    Collection(String, String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Store(msg) => write!(f, "Store: {}", msg),
            ValidationError::Federation(msg) => write!(f, "Federation: {}", msg),
            ValidationError::Resolver(msg) => write!(f, "Resolver: {}", msg),
            ValidationError::Collection(tag, msg) => write!(f, "Collection '{}': {}", tag, msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl EngineConfig {
    /// Validate the entire configuration, reporting every problem found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.store.validate() {
            errors.push(ValidationError::Store(e));
        }

        errors.extend(
            self.federation
                .validate()
                .into_iter()
                .map(ValidationError::Federation),
        );

        if self.resolver.max_concurrent_fetches == 0 {
            errors.push(ValidationError::Resolver(
                "max_concurrent_fetches must be at least 1".to_string(),
            ));
        }

        for (tag, collection) in &self.collections {
            if tag.trim().is_empty() {
                errors.push(ValidationError::Collection(
                    tag.clone(),
                    "type tag cannot be empty".to_string(),
                ));
            }
            if collection.trim().is_empty() {
                errors.push(ValidationError::Collection(
                    tag.clone(),
                    "collection name cannot be empty".to_string(),
                ));
            }
        }

        errors.extend(
            crate::logging::validate(&self.logging)
                .into_iter()
                .map(ValidationError::Logging),
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
