use std::collections::HashSet;

use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::models::ServiceDay;
use crate::occurrence::{self, OccurrenceError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read service catalog: {0}")]
    Config(#[from] ConfigError),
    #[error("service '{id}' is misconfigured: {source}")]
    Invalid {
        id: String,
        #[source]
        source: OccurrenceError,
    },
    #[error("service id '{0}' is defined more than once")]
    DuplicateId(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    services: Vec<ServiceDay>,
}

/// Service days known to the application, validated once when loaded.
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    services: Vec<ServiceDay>,
}

impl ServiceCatalog {
    pub fn load(path: &str) -> Result<Self, CatalogError> {
        let config = Config::builder()
            .add_source(File::new(path, FileFormat::Toml))
            .build()?;
        let catalog = Self::from_config(config)?;
        info!(path, services = catalog.len(), "loaded service catalog");
        Ok(catalog)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, CatalogError> {
        let config = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, CatalogError> {
        let file: CatalogFile = config.try_deserialize()?;
        Self::new(file.services)
    }

    pub fn new(services: Vec<ServiceDay>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for service in &services {
            if !seen.insert(service.id.as_str()) {
                return Err(CatalogError::DuplicateId(service.id.clone()));
            }
            occurrence::validate(service).map_err(|source| CatalogError::Invalid {
                id: service.id.clone(),
                source,
            })?;
        }
        Ok(Self { services })
    }

    pub fn get(&self, id: &str) -> Option<&ServiceDay> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn all(&self) -> &[ServiceDay] {
        &self.services
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
