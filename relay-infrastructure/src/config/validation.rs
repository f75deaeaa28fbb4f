use std::collections::HashSet;

use thiserror::Error;

use relay_domain::RetentionPolicy;

/// Fatal startup configuration problems. The process exits on any of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub fn require<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(key))
}

pub fn validate_retention(policies: &[RetentionPolicy]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for policy in policies {
        if !seen.insert(policy.category) {
            return Err(ConfigError::Invalid {
                key: "retention",
                reason: format!("category {} listed twice", policy.category),
            });
        }
        if policy.retention_days == 0 {
            return Err(ConfigError::Invalid {
                key: "retention",
                reason: format!("{} retention_days must be at least 1", policy.category),
            });
        }
        if policy.hour_utc > 23 || policy.minute_utc > 59 {
            return Err(ConfigError::Invalid {
                key: "retention",
                reason: format!("{} sweep time out of range", policy.category),
            });
        }
    }
    Ok(())
}
