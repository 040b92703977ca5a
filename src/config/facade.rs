//! Config loading entry point: source order and deserialization.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::EngineConfig;
use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use tracing::debug;

/// Environment variable prefix; `SCRIPTORIUM__STORE__BACKEND=http` sets `store.backend`
pub const ENV_PREFIX: &str = "SCRIPTORIUM";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the layered configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, workspace
    /// files, environment variables.
    pub fn load(workspace_root: &Path) -> Result<EngineConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            backend = %config.store.backend,
            collections = config.collections.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load a single TOML file; absent keys take their defaults
    pub fn load_from_file(path: &Path) -> Result<EngineConfig, ConfigError> {
        Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults only
    pub fn default() -> EngineConfig {
        EngineConfig::default()
    }
}
