//! Binding configuration.
//!
//! Defaults, environment variable names and the TOML form of [`BindConfig`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BindError, Result};

/// Environment variable names.
pub mod env_vars {
    /// `lenient` or `strict`.
    pub const POLICY: &str = "PLUGBIND_POLICY";
}

/// How missing symbols are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindPolicy {
    /// Missing callables become no-op stubs, missing data stays unbound.
    #[default]
    Lenient,
    /// Every declared symbol is mandatory; the first missing one aborts binding.
    Strict,
}

impl FromStr for BindPolicy {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" | "check" => Ok(Self::Strict),
            other => Err(BindError::config(format!("unknown bind policy '{}'", other))),
        }
    }
}

impl fmt::Display for BindPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => f.write_str("lenient"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

/// Binder configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    pub policy: BindPolicy,
}

impl BindConfig {
    pub fn with_policy(mut self, policy: BindPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Defaults overridden by [`env_vars::POLICY`] when set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(policy) = lookup(env_vars::POLICY) {
            config.policy = policy.parse()?;
        }
        Ok(config)
    }

    /// Parse from TOML, e.g. `policy = "strict"`.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| BindError::config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!("lenient".parse::<BindPolicy>().unwrap(), BindPolicy::Lenient);
        assert_eq!(" Strict ".parse::<BindPolicy>().unwrap(), BindPolicy::Strict);
        assert_eq!("check".parse::<BindPolicy>().unwrap(), BindPolicy::Strict);
        assert!(matches!(
            "maybe".parse::<BindPolicy>(),
            Err(BindError::Config(_))
        ));
    }

    #[test]
    fn test_policy_display_roundtrip() {
        for policy in [BindPolicy::Lenient, BindPolicy::Strict] {
            assert_eq!(policy.to_string().parse::<BindPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_default_is_lenient() {
        assert_eq!(BindConfig::default().policy, BindPolicy::Lenient);
    }

    #[test]
    fn test_from_lookup() {
        let config = BindConfig::from_lookup(|key| {
            (key == env_vars::POLICY).then(|| "strict".to_string())
        })
        .unwrap();
        assert_eq!(config.policy, BindPolicy::Strict);

        let config = BindConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, BindConfig::default());

        assert!(BindConfig::from_lookup(|_| Some("bogus".to_string())).is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = BindConfig::from_toml_str("policy = \"strict\"").unwrap();
        assert_eq!(config.policy, BindPolicy::Strict);

        assert_eq!(BindConfig::from_toml_str("").unwrap(), BindConfig::default());
        assert!(BindConfig::from_toml_str("policy = \"other\"").is_err());
    }
}
