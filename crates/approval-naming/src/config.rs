//! Process-wide naming configuration
//!
//! Configuration is read once from the environment on first use and can be
//! replaced with [`set`]. It only holds defaults; the scope stack itself is
//! never process-wide.

use crate::error::NamingError;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Environment variable selecting the default [`FailureMode`]
pub const FAILURE_MODE_ENV: &str = "APPROVAL_NAMING_FAILURE_MODE";

/// Environment variable with extra comma-separated frame skip prefixes
pub const SKIP_FRAMES_ENV: &str = "APPROVAL_NAMING_SKIP_FRAMES";

/// How a qualifier reacts to an environment it cannot classify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureMode {
    /// Fail with [`NamingError::UnsupportedEnvironment`]
    #[default]
    Strict,

    /// Fall back to the raw, unclassified description
    BestEffort,
}

impl FromStr for FailureMode {
    type Err = NamingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "best-effort" | "best_effort" | "besteffort" => Ok(Self::BestEffort),
            other => Err(NamingError::Config(format!(
                "{FAILURE_MODE_ENV} must be `strict` or `best-effort`, got `{other}`"
            ))),
        }
    }
}

/// Naming configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamingConfig {
    /// Default failure mode for OS and runtime qualifiers
    pub failure_mode: FailureMode,
    /// Extra path prefixes whose frames are skipped during base resolution
    ///
    /// Useful when test helpers in another crate wrap the naming calls.
    pub skip_prefixes: Vec<String>,
}

impl NamingConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With default failure mode
    #[inline]
    #[must_use]
    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// With an extra frame skip prefix
    #[inline]
    #[must_use]
    pub fn with_skip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.skip_prefixes.push(prefix.into());
        self
    }

    /// Read overrides from the process environment
    ///
    /// # Errors
    /// Returns [`NamingError::Config`] if [`FAILURE_MODE_ENV`] holds an
    /// unrecognized value.
    pub fn from_env() -> Result<Self, NamingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NamingError> {
        let mut config = Self::default();
        if let Some(mode) = lookup(FAILURE_MODE_ENV) {
            config.failure_mode = mode.parse()?;
        }
        if let Some(prefixes) = lookup(SKIP_FRAMES_ENV) {
            config.skip_prefixes = prefixes
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(config)
    }
}

static CONFIG: Lazy<RwLock<NamingConfig>> = Lazy::new(|| {
    let config = NamingConfig::from_env().unwrap_or_else(|err| {
        tracing::warn!("ignoring naming environment overrides: {}", err);
        NamingConfig::default()
    });
    RwLock::new(config)
});

/// Snapshot of the active configuration
#[must_use]
pub fn current() -> NamingConfig {
    CONFIG.read().clone()
}

/// Replace the active configuration
pub fn set(config: NamingConfig) {
    tracing::debug!(?config, "naming configuration replaced");
    *CONFIG.write() = config;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_is_strict() {
        let config = NamingConfig::new();
        assert_eq!(config.failure_mode, FailureMode::Strict);
        assert!(config.skip_prefixes.is_empty());
    }

    #[test]
    fn builder() {
        let config = NamingConfig::new()
            .with_failure_mode(FailureMode::BestEffort)
            .with_skip_prefix("my_helpers");
        assert_eq!(config.failure_mode, FailureMode::BestEffort);
        assert_eq!(config.skip_prefixes, vec!["my_helpers".to_string()]);
    }

    #[test]
    fn env_overrides() {
        let config = NamingConfig::from_lookup(lookup(&[
            (FAILURE_MODE_ENV, "Best-Effort"),
            (SKIP_FRAMES_ENV, "helpers, other::mod ,,"),
        ]))
        .unwrap();
        assert_eq!(config.failure_mode, FailureMode::BestEffort);
        assert_eq!(config.skip_prefixes, vec!["helpers", "other::mod"]);
    }

    #[test]
    fn env_rejects_unknown_mode() {
        let err = NamingConfig::from_lookup(lookup(&[(FAILURE_MODE_ENV, "lenient")])).unwrap_err();
        assert!(matches!(err, NamingError::Config(_)));
    }

    #[test]
    fn failure_mode_serde_names() {
        let json = serde_json::to_string(&FailureMode::BestEffort).unwrap();
        assert_eq!(json, "\"best-effort\"");
    }
}
