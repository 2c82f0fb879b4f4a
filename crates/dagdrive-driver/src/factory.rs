//! Named driver construction from string parameter maps.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::config::DriverConfig;
use crate::driver::{DagDriver, StorageDriver, DRIVER_NAME};
use crate::error::{DriverError, DriverResult};

/// Builds a driver from its configuration parameters.
pub trait DriverFactory: Send + Sync {
    fn create(
        &self,
        parameters: &HashMap<String, String>,
    ) -> DriverResult<Box<dyn StorageDriver>>;
}

/// Factory for [`DagDriver`] over the daemon HTTP API.
#[derive(Clone, Copy, Debug, Default)]
pub struct DagDriverFactory;

impl DriverFactory for DagDriverFactory {
    fn create(
        &self,
        parameters: &HashMap<String, String>,
    ) -> DriverResult<Box<dyn StorageDriver>> {
        let config = DriverConfig::from_parameters(parameters);
        Ok(Box::new(DagDriver::from_config(&config)?))
    }
}

/// Driver factories keyed by driver name.
#[derive(Default)]
pub struct DriverRegistry {
    factories: BTreeMap<String, Box<dyn DriverFactory>>,
}

impl DriverRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the `ipfs` factory installed.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .factories
            .insert(DRIVER_NAME.to_string(), Box::new(DagDriverFactory));
        registry
    }

    /// Register `factory` under `name`. Fails if the name is taken.
    pub fn register(&mut self, name: &str, factory: Box<dyn DriverFactory>) -> DriverResult<()> {
        if self.factories.contains_key(name) {
            return Err(DriverError::Config(format!("driver {name:?} is already registered")));
        }
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    /// Build the driver registered as `name` from `parameters`.
    pub fn create(
        &self,
        name: &str,
        parameters: &HashMap<String, String>,
    ) -> DriverResult<Box<dyn StorageDriver>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| DriverError::Config(format!("unknown driver {name:?}")))?;
        debug!(driver = name, "creating storage driver");
        factory.create(parameters)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
