//! Environment handling for config values.
//!
//! Two mechanisms, applied in this order at load time:
//! - `${VAR_NAME}` references inside string values are substituted
//!   (uppercase names only; `$${VAR}` escapes to a literal `${VAR}`).
//! - Well-known `STUDYBUDDY_*` variables override individual fields.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::schema::{ApiConfig, LoggingConfig, StoreConfig, StudyBuddyConfig};

pub const API_URL_VAR: &str = "STUDYBUDDY_API_URL";
pub const DB_PATH_VAR: &str = "STUDYBUDDY_DB";
pub const LOG_LEVEL_VAR: &str = "STUDYBUDDY_LOG";

/// `$${NAME}` (escaped) or `${NAME}`.
static ENV_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\$)?\{([A-Z_][A-Z0-9_]*)\}").unwrap());

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

fn process_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Substitute `${VAR}` references in every string of a config value tree.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &process_env())
}

pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, v) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                out.insert(key.clone(), substitute_value(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }
    let mut missing: Option<MissingEnvVarError> = None;
    let replaced = ENV_REFERENCE.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if caps.get(1).is_some() {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });
    if let Some(err) = missing {
        bail!(err);
    }
    Ok(replaced.into_owned())
}

/// Apply `STUDYBUDDY_*` overrides from the process environment.
pub fn apply_env_overrides(config: StudyBuddyConfig) -> StudyBuddyConfig {
    apply_env_overrides_with(config, &process_env())
}

pub fn apply_env_overrides_with(
    mut config: StudyBuddyConfig,
    env: &HashMap<String, String>,
) -> StudyBuddyConfig {
    let set = |name: &str| env.get(name).filter(|v| !v.trim().is_empty()).cloned();

    if let Some(url) = set(API_URL_VAR) {
        config.api.get_or_insert_with(ApiConfig::default).url = Some(url);
    }
    if let Some(path) = set(DB_PATH_VAR) {
        config.store.get_or_insert_with(StoreConfig::default).path = Some(PathBuf::from(path));
    }
    if let Some(level) = set(LOG_LEVEL_VAR) {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_nested_reference() {
        let v = json!({"api": {"url": "http://${CHAT_HOST}/api/chat"}});
        let out = resolve_env_vars_with(&v, &env(&[("CHAT_HOST", "10.0.0.2:3000")])).unwrap();
        assert_eq!(out["api"]["url"], "http://10.0.0.2:3000/api/chat");
    }

    #[test]
    fn missing_reference_names_var_and_path() {
        let v = json!({"api": {"url": "${NOPE}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err().to_string();
        assert!(err.contains("NOPE"));
        assert!(err.contains("api.url"));
    }

    #[test]
    fn escaped_reference_is_literal() {
        let v = json!({"x": "$${KEEP_ME}"});
        let out = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(out["x"], "${KEEP_ME}");
    }

    #[test]
    fn named_overrides_win() {
        let config = apply_env_overrides_with(
            StudyBuddyConfig::default(),
            &env(&[
                (API_URL_VAR, "https://chat.example.com/api"),
                (DB_PATH_VAR, "/var/lib/sb.db"),
                (LOG_LEVEL_VAR, "debug"),
            ]),
        );
        assert_eq!(
            config.api.unwrap().url.as_deref(),
            Some("https://chat.example.com/api")
        );
        assert_eq!(config.store.unwrap().path, Some(PathBuf::from("/var/lib/sb.db")));
        assert_eq!(config.logging.unwrap().level.as_deref(), Some("debug"));
    }

    #[test]
    fn blank_override_is_ignored() {
        let config = apply_env_overrides_with(StudyBuddyConfig::default(), &env(&[(API_URL_VAR, " ")]));
        assert!(config.api.is_none());
    }
}
