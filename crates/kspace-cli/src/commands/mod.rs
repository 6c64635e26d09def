pub mod energy;
pub mod params;

use crate::config::RunConfig;
use crate::error::Result;
use kspace::core::io::particle_type::ParticleTypeDefinition;
use kspace::core::io::xyz::{XyzError, XyzFile};
use kspace::core::models::configuration::Configuration;
use kspace::core::models::domain::Domain;
use kspace::core::models::params::ModelParams;
use std::path::Path;
use tracing::info;

/// Builds a configuration from the run's particle types and an XYZ file.
pub fn load_configuration(run: &RunConfig, input: &Path) -> Result<Configuration> {
    info!("Loading coordinates from {:?}", input);
    let frame = XyzFile::read_from_path(input)?;
    let sides = frame.side_lengths;
    let domain = Domain::new(sides.x, sides.y, sides.z).map_err(XyzError::from)?;
    let mut configuration = Configuration::new(domain, ModelParams::new(run.cutoff, run.constants));

    for path in &run.particle_types {
        let index = ParticleTypeDefinition::load(path)?.register(&mut configuration)?;
        info!("Registered particle type {} from {:?}", index, path);
    }
    frame.apply_to(&mut configuration)?;
    info!(
        "Loaded {} particles with {} physical sites.",
        configuration.num_particles(),
        configuration.num_sites()
    );
    Ok(configuration)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::EwaldOverrides;
    use crate::config::PartialRunConfig;

    #[test]
    fn configuration_is_assembled_from_run_files() {
        let dir = tempfile::tempdir().unwrap();
        let (config, input) = fixtures::write_run(dir.path(), "alpha = 0.3\nkmax-squared = 9");
        let run = PartialRunConfig::from_file(&config)
            .unwrap()
            .merge_with_cli(&EwaldOverrides::default())
            .unwrap();
        let configuration = load_configuration(&run, &input).unwrap();

        assert_eq!(configuration.num_particles(), 2);
        assert_eq!(configuration.num_sites(), 6);
        assert_eq!(configuration.domain().side_length(1), 12.0);
        assert_eq!(configuration.site(1, 0).unwrap().position.z, 7.0);
    }
}
