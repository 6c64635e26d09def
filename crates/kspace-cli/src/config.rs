use crate::cli::EwaldOverrides;
use crate::error::{CliError, Result};
use kspace::core::constants::{DEFAULT_CONSTANTS, PhysicalConstants};
use kspace::engine::config::{EwaldConfig, EwaldConfigBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialEwaldConfig {
    alpha: Option<f64>,
    kmax_squared: Option<u32>,
    kxmax: Option<i32>,
    kymax: Option<i32>,
    kzmax: Option<i32>,
    tolerance: Option<f64>,
    tolerance_num_sites: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialModelConfig {
    cutoff: Option<f64>,
    physical_constants: Option<String>,
    particle_types: Option<Vec<PathBuf>>,
}

/// A run file as written on disk. Every field is optional until merged.
///
/// ```toml
/// [ewald]
/// alpha = 0.28
/// kmax-squared = 27
///
/// [model]
/// cutoff = 10.0
/// physical-constants = "CODATA2018"
/// particle-types = ["spce.toml"]
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    ewald: Option<PartialEwaldConfig>,
    model: Option<PartialModelConfig>,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Fully merged settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub ewald: EwaldConfig,
    pub cutoff: f64,
    pub constants: PhysicalConstants,
    /// Particle type files, resolved against the run file's directory.
    pub particle_types: Vec<PathBuf>,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    pub fn merge_with_cli(mut self, overrides: &EwaldOverrides) -> Result<RunConfig> {
        let mut ewald = self.ewald.take().unwrap_or_default();
        if overrides.selects_cutoff() {
            debug!("Command-line cutoff replaces the one from the config file.");
            ewald.kmax_squared = overrides.kmax_squared;
            ewald.kxmax = overrides.kxmax;
            ewald.kymax = overrides.kymax;
            ewald.kzmax = overrides.kzmax;
            ewald.tolerance = overrides.tolerance;
            if overrides.tolerance.is_some() {
                ewald.alpha = None;
            } else {
                ewald.tolerance_num_sites = None;
            }
        }
        if overrides.alpha.is_some() {
            ewald.alpha = overrides.alpha;
        }
        let ewald = Self::build_ewald(ewald)?;

        let model = self.model.take().unwrap_or_default();
        let cutoff = model.cutoff.ok_or_else(|| {
            CliError::Config("A value for 'model.cutoff' is required in the config file.".into())
        })?;
        if !(cutoff.is_finite() && cutoff > 0.0) {
            return Err(CliError::Config(format!(
                "Invalid value for 'model.cutoff': {}",
                cutoff
            )));
        }
        let constants_name = model.physical_constants.as_deref().unwrap_or(DEFAULT_CONSTANTS);
        let constants = PhysicalConstants::by_name(constants_name).ok_or_else(|| {
            CliError::Config(format!(
                "Unknown physical constants '{}'. Available: {}",
                constants_name,
                PhysicalConstants::available().collect::<Vec<_>>().join(", ")
            ))
        })?;
        let particle_types: Vec<PathBuf> = model
            .particle_types
            .unwrap_or_default()
            .into_iter()
            .map(|p| if p.is_absolute() { p } else { self.base_dir.join(p) })
            .collect();
        if particle_types.is_empty() {
            return Err(CliError::Config(
                "At least one file in 'model.particle-types' is required.".into(),
            ));
        }

        Ok(RunConfig {
            ewald,
            cutoff,
            constants,
            particle_types,
        })
    }

    fn build_ewald(partial: PartialEwaldConfig) -> Result<EwaldConfig> {
        let mut builder = EwaldConfigBuilder::new();
        if let Some(alpha) = partial.alpha {
            builder = builder.alpha(alpha);
        }
        if let Some(kmax_squared) = partial.kmax_squared {
            builder = builder.kmax_squared(kmax_squared);
        }
        if let Some(kxmax) = partial.kxmax {
            builder = builder.kxmax(kxmax);
        }
        if let Some(kymax) = partial.kymax {
            builder = builder.kymax(kymax);
        }
        if let Some(kzmax) = partial.kzmax {
            builder = builder.kzmax(kzmax);
        }
        if let Some(tolerance) = partial.tolerance {
            builder = builder.tolerance(tolerance);
        }
        if let Some(num_sites) = partial.tolerance_num_sites {
            builder = builder.tolerance_num_sites(num_sites);
        }
        builder
            .build()
            .map_err(|e| CliError::Config(format!("[ewald] {}", e)))
    }
}
