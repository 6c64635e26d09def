use crate::core::models::configuration::{Configuration, ConfigurationError};
use crate::core::models::particle::ParticleType;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SiteTypeDefinition {
    pub charge: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SiteDefinition {
    #[serde(rename = "type")]
    pub site_type: String,
    pub position: [f64; 3],
}

/// A rigid particle type as written in a TOML file:
///
/// ```toml
/// name = "spce"
///
/// [site-types]
/// O = { charge = -0.8476 }
/// H = { charge = 0.4238 }
///
/// [[sites]]
/// type = "O"
/// position = [0.0, 0.0, 0.0]
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ParticleTypeDefinition {
    pub name: String,
    #[serde(rename = "site-types")]
    pub site_types: HashMap<String, SiteTypeDefinition>,
    pub sites: Vec<SiteDefinition>,
}

impl ParticleTypeDefinition {
    pub fn load(path: &Path) -> Result<Self, ParticleTypeLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParticleTypeLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ParticleTypeLoadError::Toml { source, .. } => ParticleTypeLoadError::Toml {
                path: path.to_string_lossy().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ParticleTypeLoadError> {
        toml::from_str(content).map_err(|e| ParticleTypeLoadError::Toml {
            path: "<inline>".to_string(),
            source: e,
        })
    }

    /// Registers the site types and the particle type with a configuration.
    ///
    /// Site types are registered in order of first appearance among the sites,
    /// so loading the same file into two configurations yields the same indices.
    /// Returns the new particle type index.
    pub fn register(&self, config: &mut Configuration) -> Result<usize, ParticleTypeLoadError> {
        let mut particle_type = ParticleType::new(&self.name);
        for site in &self.sites {
            let definition = self
                .site_types
                .get(&site.site_type)
                .ok_or_else(|| ParticleTypeLoadError::UndefinedSiteType(site.site_type.clone()))?;
            let index = config
                .model_params_mut()
                .add_site_type(&site.site_type, definition.charge);
            particle_type = particle_type.with_site(index, site.position);
        }
        Ok(config.add_particle_type(particle_type)?)
    }
}

#[derive(Debug, Error)]
pub enum ParticleTypeLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Site references undefined site type '{0}'")]
    UndefinedSiteType(String),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
