use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DriverError, DriverResult};
use crate::path::PathResolver;

/// Daemon API address used when none is configured.
pub const DEFAULT_ADDR: &str = "localhost:5001";

/// Storage root used when none is configured. Qualified with the daemon's
/// identity on startup.
pub const DEFAULT_ROOT: &str = "/ipns/local/docker-registry";

/// Parameter key for the daemon address.
pub const PARAM_ADDR: &str = "addr";
/// Parameter key for the storage root.
pub const PARAM_ROOT: &str = "root";

/// Driver configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// `host:port` of the daemon API, or a full `http(s)://` URL.
    pub addr: String,
    /// Storage root, e.g. `/ipns/local/docker-registry`.
    pub root: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.into(),
            root: DEFAULT_ROOT.into(),
        }
    }
}

impl DriverConfig {
    /// Build from a string parameter map. Missing or empty keys fall back to
    /// the defaults; unknown keys are ignored.
    pub fn from_parameters(params: &HashMap<String, String>) -> Self {
        let pick = |key: &str, default: &str| {
            params
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        Self {
            addr: pick(PARAM_ADDR, DEFAULT_ADDR),
            root: pick(PARAM_ROOT, DEFAULT_ROOT),
        }
    }

    /// Parse and validate a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> DriverResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| DriverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> DriverResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DriverError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Check the fields without contacting the daemon.
    ///
    /// A self-referential root is accepted as is; it is only qualified once
    /// a store is available.
    pub fn validate(&self) -> DriverResult<()> {
        if self.addr.trim().is_empty() {
            return Err(DriverError::Config("addr must not be empty".into()));
        }
        PathResolver::new(&self.root)?;
        Ok(())
    }
}
