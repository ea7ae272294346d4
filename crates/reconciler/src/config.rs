//! Configuration for the reconciler and gateway.

use std::path::Path;
use std::time::Duration;

use lifehook_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`ReconcilerConfig::lookup`].
pub const LOOKUP_ENV: &str = "LIFEHOOK_LOOKUP";

/// Environment variable overriding [`GatewayConfig::call_timeout`], in seconds.
pub const CALL_TIMEOUT_ENV: &str = "LIFEHOOK_CALL_TIMEOUT_SECS";

/// How existing hooks are looked up while processing the desired set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupStrategy {
    /// Describe each desired hook by name, then list all hooks again before pruning.
    #[default]
    PerHook,
    /// List all hooks once and derive existence and orphans from that snapshot.
    Snapshot,
}

impl std::str::FromStr for LookupStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "per-hook" => Ok(Self::PerHook),
            "snapshot" => Ok(Self::Snapshot),
            other => Err(Error::invalid_config(format!(
                "unknown lookup strategy '{other}' (expected 'per-hook' or 'snapshot')"
            ))),
        }
    }
}

/// Configuration for the convergence engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    #[serde(default)]
    pub lookup: LookupStrategy,
}

/// Configuration for the remote hook gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Deadline applied to every remote call. None leaves calls unbounded.
    #[serde(with = "duration_secs", rename = "call_timeout_secs", default)]
    pub call_timeout: Option<Duration>,
}

impl GatewayConfig {
    /// Set the call timeout.
    #[must_use]
    pub const fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }
}

/// Top-level settings document.
///
/// ```toml
/// [reconciler]
/// lookup = "snapshot"
///
/// [gateway]
/// call_timeout_secs = 30
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Settings {
    /// Parse settings from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the document is malformed.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| Error::invalid_config(e.to_string()))
    }

    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_config(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if an override is malformed.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if an override is malformed.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(strategy) = lookup(LOOKUP_ENV) {
            self.reconciler.lookup = strategy.parse()?;
        }

        if let Some(secs) = lookup(CALL_TIMEOUT_ENV) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::invalid_config(format!("{CALL_TIMEOUT_ENV} must be whole seconds, got '{secs}'"))
            })?;
            self.gateway.call_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(self)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_u64(duration.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs))
    }
}
