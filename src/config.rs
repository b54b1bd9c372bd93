use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::dialect::{is_plain_identifier, GeneratedKeyKind};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Engine limits and statement-shaping options
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of tables in one join chain (the root table included)
    #[validate(range(
        min = 2,
        max = 64,
        message = "Max join tables must be between 2 and 64"
    ))]
    pub max_join_tables: usize,

    /// Maximum rows accepted by a single batch insert/update call
    #[validate(range(
        min = 1,
        max = 100000,
        message = "Max batch rows must be between 1 and 100000"
    ))]
    pub max_batch_rows: usize,

    /// How single-row inserts read back the database-assigned key
    pub generated_key_kind: GeneratedKeyKind,

    /// Column alias given to aggregate results
    #[validate(custom(function = "validate_alias"))]
    pub aggregate_alias: String,

    /// Log every rendered statement (with inlined literals) at debug level
    pub log_statements: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_join_tables: 7,
            max_batch_rows: 1000,
            generated_key_kind: GeneratedKeyKind::Integer,
            aggregate_alias: "Value".to_string(),
            log_statements: false,
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            max_join_tables: parse_env_var("SQLSYNTH_MAX_JOIN_TABLES", "7")?,
            max_batch_rows: parse_env_var("SQLSYNTH_MAX_BATCH_ROWS", "1000")?,
            generated_key_kind: parse_env_var("SQLSYNTH_GENERATED_KEY_KIND", "integer")?,
            aggregate_alias: env_var_or("SQLSYNTH_AGGREGATE_ALIAS", "Value")?,
            log_statements: parse_env_var("SQLSYNTH_LOG_STATEMENTS", "false")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file; missing keys take their defaults
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }
}

fn validate_alias(alias: &str) -> Result<(), ValidationError> {
    if !is_plain_identifier(alias) {
        let mut err = ValidationError::new("aggregate_alias");
        err.message = Some("Aggregate alias must be a plain identifier".into());
        return Err(err);
    }
    Ok(())
}

/// Unset variables take `default`; set but non-unicode ones are an error
fn env_var_or(key: &str, default: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) => Ok(value),
        Err(env::VarError::NotPresent) => Ok(default.to_string()),
        Err(err) => {
            log::warn!("{} is set but not valid unicode", key);
            Err(err.into())
        }
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env_var_or(key, default)?;
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
