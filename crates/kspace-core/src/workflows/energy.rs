use crate::core::models::configuration::Configuration;
use crate::engine::config::EwaldConfig;
use crate::engine::error::EngineError;
use crate::engine::ewald::Ewald;
use crate::engine::params::{EwaldParams, ParameterResolver};
use tracing::{info, instrument, warn};

/// Net charges smaller than this are treated as neutral.
const NEUTRALITY_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq)]
pub struct ReciprocalReport {
    pub energy: f64,
    pub net_charge: f64,
    pub params: EwaldParams,
    pub kmax_squared: f64,
    pub num_vectors: usize,
}

#[derive(Debug, Clone)]
pub struct EnergyResult {
    pub report: ReciprocalReport,
    /// The engine with the full rebuild committed, ready for trial moves.
    pub engine: Ewald,
}

#[instrument(skip_all, name = "energy_workflow")]
pub fn run(configuration: &Configuration, config: &EwaldConfig) -> Result<EnergyResult, EngineError> {
    info!(
        "Evaluating reciprocal energy of {} particles ({} physical sites).",
        configuration.num_particles(),
        configuration.num_sites()
    );
    let mut engine = Ewald::new(config.clone());
    engine.precompute(configuration)?;
    let energy = engine.compute(configuration, 0)?;
    engine.finalize()?;

    let net_charge = engine.net_charge(configuration);
    if net_charge.abs() > NEUTRALITY_TOLERANCE {
        warn!(
            "Configuration carries a net charge of {}; the neutralizing background term is not included.",
            net_charge
        );
    }
    info!("Reciprocal energy: {}", energy);

    let report = ReciprocalReport {
        energy,
        net_charge,
        params: *engine.params(),
        kmax_squared: engine.kmax_squared(),
        num_vectors: engine.num_vectors(),
    };
    Ok(EnergyResult { report, engine })
}

/// Resolves the Ewald parameters without building any cached state.
#[instrument(skip_all, name = "resolve_workflow")]
pub fn resolve(configuration: &Configuration, config: &EwaldConfig) -> Result<EwaldParams, EngineError> {
    ParameterResolver::new(config.clone()).resolve(configuration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::EwaldConfigBuilder;
    use crate::testing::{brute_force_energy, salt_configuration, spce_configuration};

    #[test]
    fn run_reports_committed_energy_and_parameters() {
        let configuration = spce_configuration(30, 18.0);
        let config = EwaldConfigBuilder::new()
            .alpha(0.3)
            .kmax_squared(20)
            .build()
            .unwrap();
        let result = run(&configuration, &config).unwrap();
        let report = &result.report;

        assert_eq!(report.energy, result.engine.stored_energy());
        assert_eq!(report.params.kxmax, 5);
        assert_eq!(report.num_vectors, result.engine.num_vectors());
        assert!(report.net_charge.abs() < 1e-12);
        let expected = brute_force_energy(&configuration, 0.3, report.kmax_squared, [5, 5, 5]);
        assert!((report.energy - expected).abs() < 1e-9 * expected.abs());
        result.engine.check(&configuration).unwrap();
    }

    #[test]
    fn run_reports_net_charge_of_unbalanced_configuration() {
        let mut configuration = salt_configuration(5, 10.0, 9);
        configuration.add_particle_of_type(0).unwrap();
        let config = EwaldConfigBuilder::new()
            .alpha(0.5)
            .kxmax(4)
            .kymax(4)
            .kzmax(4)
            .build()
            .unwrap();
        let report = run(&configuration, &config).unwrap().report;
        assert!((report.net_charge - 1.0).abs() < 1e-12);
    }

    #[test]
    fn resolve_does_not_require_a_cubic_box_for_explicit_maxima() {
        let mut configuration = salt_configuration(2, 10.0, 1);
        configuration
            .set_side_lengths(nalgebra::Vector3::new(10.0, 12.0, 14.0))
            .unwrap();
        let explicit = EwaldConfigBuilder::new()
            .alpha(0.5)
            .kxmax(3)
            .kymax(4)
            .kzmax(5)
            .build()
            .unwrap();
        assert_eq!(resolve(&configuration, &explicit).unwrap().kzmax, 5);

        let shortcut = EwaldConfigBuilder::new()
            .alpha(0.5)
            .kmax_squared(9)
            .build()
            .unwrap();
        assert!(matches!(
            resolve(&configuration, &shortcut),
            Err(EngineError::NonCubicDomain)
        ));
    }
}
