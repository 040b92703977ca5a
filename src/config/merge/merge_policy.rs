//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Collections are not defaulted here: a configured `collections` table
/// replaces the built-in one instead of extending it.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("store.backend", "sled")?
        .set_default("store.url", "http://localhost:9200")?
        .set_default("store.path", ".scriptorium/store")?
        .set_default("store.timeout_ms", 30_000i64)?
        .set_default("federation.id_aggregation_size", 100_000i64)?
        .set_default("federation.max_concurrent_queries", 1i64)?
        .set_default("federation.default_page_size", 20i64)?
        .set_default("federation.facet_size", 50i64)?
        .set_default("resolver.max_concurrent_fetches", 4i64)
}
