//! Shared presentation: json rendering and the effective configuration.

use crate::config::EngineConfig;
use crate::error::EngineError;
use serde::Serialize;

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, EngineError> {
    serde_json::to_string_pretty(value).map_err(|e| EngineError::Output(e.to_string()))
}

pub fn format_config_text(config: &EngineConfig) -> Result<String, EngineError> {
    toml::to_string_pretty(config).map_err(|e| EngineError::Output(e.to_string()))
}

/// Display name of an optional string column
pub(super) fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}
