//! `studybuddy-config`: runtime configuration.
//!
//! Provides:
//! - Typed config schema (endpoint, extraction, context, summary, store, logging)
//! - YAML read/write
//! - `${ENV_VAR}` substitution and `STUDYBUDDY_*` overrides
//! - Default value application
//! - Validation with warnings and errors

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides, apply_env_overrides_with, resolve_env_vars, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use schema::{
    ApiConfig, ContextConfig, ExtractionConfig, LoggingConfig, StoreConfig, StudyBuddyConfig,
    SummaryConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

/// Load a config file and make it ready to use: env substitution, env
/// overrides, defaults, validation. Validation errors fail the load;
/// warnings are logged.
pub async fn load_and_prepare(path: &Path) -> Result<StudyBuddyConfig> {
    let raw_config = load_config(path).await?;

    let value: Value =
        serde_json::to_value(&raw_config).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: StudyBuddyConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_overrides(config);
    let anchor = path.parent().map(Path::to_path_buf).unwrap_or_else(config_dir);
    let config = apply_all_defaults(config, &anchor);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.first() {
        bail!("{} (and {} more)", first, report.errors.len() - 1);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prepared_config_is_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "context:\n  maxPageChars: 6000\n").await.unwrap();

        let config = load_and_prepare(&path).await.unwrap();
        assert_eq!(config.context.as_ref().unwrap().max_page_chars, Some(6000));
        assert_eq!(config.context.as_ref().unwrap().head_ratio, Some(0.6));
        assert_eq!(
            config.store.unwrap().path,
            Some(dir.path().join(defaults::DEFAULT_STORE_FILE))
        );
    }

    #[tokio::test]
    async fn invalid_config_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "context:\n  headRatio: 2.0\n").await.unwrap();
        let err = load_and_prepare(&path).await.unwrap_err();
        assert!(err.to_string().contains("context.headRatio"));
    }
}
