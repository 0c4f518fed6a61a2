//! Configuration file upkeep: report and fill in fields that older files
//! do not carry yet. Existing values are never overwritten.

use super::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

fn read_mapping(path: &Path) -> AppResult<Mapping> {
    let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
    let value: Value = serde_yaml::from_str(&content)
        .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;

    match value {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(AppError::Config(format!(
            "{}: expected a mapping at top level",
            path.display()
        ))),
    }
}

fn defaults_mapping() -> AppResult<Mapping> {
    match serde_yaml::to_value(Config::default()).map_err(|_| AppError::ConfigSave)? {
        Value::Mapping(m) => Ok(m),
        _ => Err(AppError::ConfigSave),
    }
}

/// Top-level keys the file does not set.
pub fn missing_fields(path: &Path) -> AppResult<Vec<String>> {
    let current = read_mapping(path)?;
    let defaults = defaults_mapping()?;

    Ok(defaults
        .keys()
        .filter(|k| !current.contains_key(*k))
        .filter_map(|k| k.as_str().map(str::to_string))
        .collect())
}

/// Add missing top-level fields with their defaults. Returns true when the
/// file was rewritten.
pub fn upgrade_config_file(path: &Path) -> AppResult<bool> {
    if !path.exists() {
        info(format!("No configuration file at {}", path.display()));
        return Ok(false);
    }

    let mut current = read_mapping(path)?;
    let mut added = Vec::new();

    for (k, v) in defaults_mapping()? {
        if !current.contains_key(&k) {
            if let Some(name) = k.as_str() {
                added.push(name.to_string());
            }
            current.insert(k, v);
        }
    }

    if added.is_empty() {
        info("Configuration file is up to date");
        return Ok(false);
    }

    let yaml = serde_yaml::to_string(&Value::Mapping(current)).map_err(|_| AppError::ConfigSave)?;
    fs::write(path, yaml)?;
    success(format!("Configuration updated, added: {}", added.join(", ")));
    Ok(true)
}
