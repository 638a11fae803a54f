//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::OptimizerConfig;
use std::path::Path;

/// Loads and validates a `tqec.toml` configuration from a directory.
///
/// Reads `<dir>/tqec.toml`, parses it, and validates the values.
pub fn load_config(dir: &Path) -> Result<OptimizerConfig, ConfigError> {
    let config_path = dir.join("tqec.toml");
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `tqec.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<OptimizerConfig, ConfigError> {
    let config: OptimizerConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are consistent.
///
/// Programmatically built configurations should pass through here before use.
pub fn validate_config(config: &OptimizerConfig) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.phases.is_empty() {
        return invalid("phases must name at least one sublattice");
    }

    let anneal = &config.anneal;
    if !(anneal.cooling_rate > 0.0 && anneal.cooling_rate < 1.0) {
        return invalid("anneal.cooling_rate must be in (0, 1)");
    }
    if anneal.final_temperature <= 0.0 {
        return invalid("anneal.final_temperature must be positive");
    }
    if anneal.initial_temperature <= anneal.final_temperature {
        return invalid("anneal.initial_temperature must exceed anneal.final_temperature");
    }
    if anneal.moves_per_temperature == 0 {
        return invalid("anneal.moves_per_temperature must be at least 1");
    }
    if !(0.0..1.0).contains(&anneal.net_weight) {
        return invalid("anneal.net_weight must be in [0, 1)");
    }

    let route = &config.route;
    if route.margin <= 0 || route.margin % 2 != 0 {
        return invalid("route.margin must be a positive even number of lattice units");
    }
    if route.penalty_growth < 1.0 {
        return invalid("route.penalty_growth must be at least 1");
    }
    if route.parallel_penalty < 0.0 || route.cross_penalty < 0.0 {
        return invalid("route penalties must not be negative");
    }

    Ok(())
}
