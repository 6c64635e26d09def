use super::config::{ConfigError, EwaldConfig};
use super::error::EngineError;
use crate::core::models::configuration::Configuration;
use crate::core::models::domain::Domain;
use bincode::{Decode, Encode};
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Relative shrink applied to the wave-vector cutoff.
const CUTOFF_SHRINK: f64 = 1e-7;

/// Upper bound on the per-axis search when estimating kmax from a tolerance.
const MAX_KMAX: i32 = 1000;

/// How the scalar wave-vector cutoff is derived from the domain.
#[derive(Debug, Clone, Copy, PartialEq, Default, Encode, Decode)]
pub enum CutoffRule {
    /// `kmax_squared · (2π / min_side_length)²`.
    Shortcut { kmax_squared: u32 },
    /// The largest `(2π · kmax_axis / side_length_axis)²` over the three axes.
    #[default]
    PerAxis,
}

/// Resolved Ewald parameters: the splitting parameter and the wave-number
/// maxima along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Encode, Decode)]
pub struct EwaldParams {
    pub alpha: f64,
    pub kxmax: i32,
    pub kymax: i32,
    pub kzmax: i32,
    pub cutoff_rule: CutoffRule,
}

impl EwaldParams {
    pub fn num_kx(&self) -> usize {
        self.kxmax as usize + 1
    }

    pub fn num_ky(&self) -> usize {
        2 * self.kymax as usize + 1
    }

    pub fn num_kz(&self) -> usize {
        2 * self.kzmax as usize + 1
    }

    /// Scalar cutoff on `k²` used to select wave vectors in the given domain.
    ///
    /// Selection is always spherical, even when the maxima were given per axis.
    pub fn kmax_squared_cutoff(&self, domain: &Domain) -> f64 {
        let kmax_squared = match self.cutoff_rule {
            CutoffRule::Shortcut { kmax_squared } => {
                kmax_squared as f64 * (2.0 * PI / domain.min_side_length()).powi(2)
            }
            CutoffRule::PerAxis => [self.kxmax, self.kymax, self.kzmax]
                .iter()
                .enumerate()
                .map(|(dim, &kmax)| (2.0 * PI * kmax as f64 / domain.side_length(dim)).powi(2))
                .fold(0.0, f64::max),
        };
        kmax_squared * (1.0 - CUTOFF_SHRINK)
    }
}

/// Turns an [`EwaldConfig`] into concrete [`EwaldParams`] for a configuration.
#[derive(Debug, Clone)]
pub struct ParameterResolver {
    config: EwaldConfig,
}

impl ParameterResolver {
    pub fn new(config: EwaldConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EwaldConfig {
        &self.config
    }

    pub fn resolve(&self, configuration: &Configuration) -> Result<EwaldParams, EngineError> {
        let domain = configuration.domain();
        let cutoff = configuration.model_params().cutoff();
        if cutoff > 0.5 * domain.min_side_length() {
            warn!(
                "Real-space cutoff {} exceeds half the minimum side length {}; minimum image may be violated",
                cutoff,
                domain.min_side_length()
            );
        }

        match self.config {
            EwaldConfig::KmaxSquared { alpha, kmax_squared } => {
                if !domain.is_cubic() {
                    return Err(EngineError::NonCubicDomain);
                }
                let kmax = (kmax_squared as f64).sqrt() as i32 + 1;
                Ok(EwaldParams {
                    alpha,
                    kxmax: kmax,
                    kymax: kmax,
                    kzmax: kmax,
                    cutoff_rule: CutoffRule::Shortcut { kmax_squared },
                })
            }
            EwaldConfig::Explicit {
                alpha,
                kxmax,
                kymax,
                kzmax,
            } => Ok(EwaldParams {
                alpha,
                kxmax,
                kymax,
                kzmax,
                cutoff_rule: CutoffRule::PerAxis,
            }),
            EwaldConfig::Tolerance {
                tolerance,
                num_sites,
            } => tolerance_to_alpha_ks(tolerance, num_sites, configuration),
        }
    }
}

/// Sum of squared charges over the physical sites of a configuration.
///
/// An empty configuration sums to zero, which sends [`alpha_from_tolerance`]
/// to its asymptotic form.
pub fn sum_squared_charge(configuration: &Configuration) -> f64 {
    let params = configuration.model_params();
    configuration
        .num_sites_of_type()
        .iter()
        .enumerate()
        .map(|(site_type, &count)| params.charge(site_type).powi(2) * count as f64)
        .sum()
}

/// Estimates alpha from a target accuracy, following the LAMMPS heuristic.
pub fn alpha_from_tolerance(
    tolerance: f64,
    num_sites: usize,
    cutoff: f64,
    volume: f64,
    sum_sq_charge: f64,
) -> Result<f64, EngineError> {
    let estimate = (num_sites as f64 * cutoff * volume).sqrt() * tolerance / (2.0 * sum_sq_charge);
    let alpha = if estimate >= 1.0 {
        (1.35 - 0.15 * tolerance.ln()) / cutoff
    } else {
        (-estimate.ln()).sqrt() / cutoff
    };
    if !alpha.is_finite() {
        return Err(EngineError::InvalidAlpha { tolerance, cutoff });
    }
    Ok(alpha)
}

/// Root-mean-square error of the Fourier sum truncated at `kmax` along one axis.
pub fn fourier_rms(
    alpha: f64,
    kmax: i32,
    side_length: f64,
    sum_sq_charge: f64,
    num_sites: usize,
) -> f64 {
    let kmax = kmax as f64;
    2.0 * sum_sq_charge * alpha / side_length
        * (1.0 / (PI * kmax * num_sites as f64)).sqrt()
        * (-(PI * kmax / alpha / side_length).powi(2)).exp()
}

/// Smallest kmax along `dim` whose truncation error is within `tolerance`.
pub fn estimate_kmax(
    alpha: f64,
    tolerance: f64,
    side_length: f64,
    dim: usize,
    sum_sq_charge: f64,
    num_sites: usize,
) -> Result<i32, EngineError> {
    let mut kmax = 0;
    let mut err = f64::INFINITY;
    while err > tolerance {
        kmax += 1;
        if kmax > MAX_KMAX {
            return Err(EngineError::KmaxSearchFailed {
                dim,
                tolerance,
                max_kmax: MAX_KMAX,
            });
        }
        err = fourier_rms(alpha, kmax, side_length, sum_sq_charge, num_sites);
    }
    Ok(kmax)
}

fn tolerance_to_alpha_ks(
    tolerance: f64,
    num_sites: Option<usize>,
    configuration: &Configuration,
) -> Result<EwaldParams, EngineError> {
    let num_sites = num_sites.unwrap_or_else(|| configuration.num_sites());
    if num_sites == 0 {
        return Err(ConfigError::InvalidValue {
            parameter: "tolerance_num_sites",
            reason: "no sites available to estimate charge statistics".to_string(),
        }
        .into());
    }
    let domain = configuration.domain();
    let cutoff = configuration.model_params().cutoff();
    let sum_sq_charge = sum_squared_charge(configuration);

    let alpha = alpha_from_tolerance(tolerance, num_sites, cutoff, domain.volume(), sum_sq_charge)?;
    debug!("alpha from tolerance {}: {}", tolerance, alpha);

    let mut kmax = [0; 3];
    for (dim, slot) in kmax.iter_mut().enumerate() {
        *slot = estimate_kmax(
            alpha,
            tolerance,
            domain.side_length(dim),
            dim,
            sum_sq_charge,
            num_sites,
        )?;
    }
    debug!("kmax from tolerance: {:?}", kmax);

    Ok(EwaldParams {
        alpha,
        kxmax: kmax[0],
        kymax: kmax[1],
        kzmax: kmax[2],
        cutoff_rule: CutoffRule::PerAxis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{salt_configuration, spce_configuration};

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() <= TOLERANCE * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn kmax_squared_shortcut_truncates_square_root() {
        let configuration = spce_configuration(0, 20.0);
        let resolver = ParameterResolver::new(EwaldConfig::KmaxSquared {
            alpha: 5.6 / 20.0,
            kmax_squared: 27,
        });
        let params = resolver.resolve(&configuration).unwrap();
        assert_eq!((params.kxmax, params.kymax, params.kzmax), (6, 6, 6));
        assert_eq!(params.num_kx(), 7);
        assert_eq!(params.num_ky(), 13);

        let expected = 27.0 * (2.0 * PI / 20.0).powi(2) * (1.0 - 1e-7);
        assert!(f64_approx_equal(
            params.kmax_squared_cutoff(configuration.domain()),
            expected
        ));
    }

    #[test]
    fn kmax_squared_shortcut_rejects_non_cubic_domain() {
        let mut configuration = spce_configuration(0, 20.0);
        configuration
            .set_side_lengths(nalgebra::Vector3::new(20.0, 20.0, 25.0))
            .unwrap();
        let resolver = ParameterResolver::new(EwaldConfig::KmaxSquared {
            alpha: 0.28,
            kmax_squared: 27,
        });
        assert!(matches!(
            resolver.resolve(&configuration),
            Err(EngineError::NonCubicDomain)
        ));
    }

    #[test]
    fn explicit_maxima_use_largest_axis_cutoff() {
        let mut configuration = spce_configuration(0, 20.0);
        configuration
            .set_side_lengths(nalgebra::Vector3::new(10.0, 20.0, 30.0))
            .unwrap();
        let params = ParameterResolver::new(EwaldConfig::Explicit {
            alpha: 0.3,
            kxmax: 2,
            kymax: 5,
            kzmax: 6,
        })
        .resolve(&configuration)
        .unwrap();
        // y: (2π·5/20)² dominates x: (2π·2/10)² and z: (2π·6/30)².
        let expected = (2.0 * PI * 5.0 / 20.0_f64).powi(2) * (1.0 - 1e-7);
        assert!(f64_approx_equal(
            params.kmax_squared_cutoff(configuration.domain()),
            expected
        ));
    }

    #[test]
    fn alpha_from_tolerance_uses_log_estimate_below_one() {
        // sqrt(2 · 10 · 8000) · 1e-5 / (2 · 2) = 1e-3
        let alpha = alpha_from_tolerance(1e-5, 2, 10.0, 8000.0, 2.0).unwrap();
        let expected = (-(1e-3_f64).ln()).sqrt() / 10.0;
        assert!((alpha - expected).abs() < 1e-12);
    }

    #[test]
    fn alpha_from_tolerance_falls_back_to_asymptotic_form() {
        // sqrt(2 · 10 · 8000) · 0.5 / (2 · 2) = 50
        let alpha = alpha_from_tolerance(0.5, 2, 10.0, 8000.0, 2.0).unwrap();
        let expected = (1.35 - 0.15 * 0.5_f64.ln()) / 10.0;
        assert!((alpha - expected).abs() < 1e-12);
    }

    #[test]
    fn nan_alpha_is_rejected() {
        assert!(matches!(
            alpha_from_tolerance(f64::NAN, 2, 10.0, 8000.0, 2.0),
            Err(EngineError::InvalidAlpha { .. })
        ));
    }

    #[test]
    fn estimated_kmax_is_the_smallest_within_tolerance() {
        let configuration = salt_configuration(20, 15.0, 7);
        let tolerance = 1e-5;
        let params = ParameterResolver::new(EwaldConfig::Tolerance {
            tolerance,
            num_sites: None,
        })
        .resolve(&configuration)
        .unwrap();
        assert_eq!(params.cutoff_rule, CutoffRule::PerAxis);

        let sum_sq = sum_squared_charge(&configuration);
        assert!((sum_sq - 40.0).abs() < 1e-12);
        let kmax = params.kxmax;
        assert!(kmax >= 1);
        assert!(fourier_rms(params.alpha, kmax, 15.0, sum_sq, 40) <= tolerance);
        if kmax > 1 {
            assert!(fourier_rms(params.alpha, kmax - 1, 15.0, sum_sq, 40) > tolerance);
        }
        assert_eq!(params.kxmax, params.kymax);
        assert_eq!(params.kymax, params.kzmax);
    }

    #[test]
    fn fourier_rms_decreases_with_kmax() {
        let mut previous = f64::INFINITY;
        for kmax in 1..20 {
            let err = fourier_rms(0.3, kmax, 20.0, 100.0, 300);
            assert!(err < previous);
            previous = err;
        }
    }

    #[test]
    fn empty_configuration_has_no_charge_statistics() {
        let configuration = spce_configuration(0, 20.0);
        assert_eq!(sum_squared_charge(&configuration), 0.0);

        let params = ParameterResolver::new(EwaldConfig::Tolerance {
            tolerance: 1e-4,
            num_sites: Some(300),
        })
        .resolve(&configuration)
        .unwrap();
        // (1.35 - 0.15 ln 1e-4) / 10, and a zero Fourier error at kmax = 1.
        assert!(f64_approx_equal(params.alpha, 0.27315510557964273));
        assert_eq!((params.kxmax, params.kymax, params.kzmax), (1, 1, 1));
    }

    #[test]
    fn cutoff_beyond_half_box_still_resolves() {
        let configuration = spce_configuration(0, 15.0);
        assert!(configuration.model_params().cutoff() > 0.5 * configuration.domain().min_side_length());
        let params = ParameterResolver::new(EwaldConfig::KmaxSquared {
            alpha: 0.3,
            kmax_squared: 9,
        })
        .resolve(&configuration)
        .unwrap();
        assert_eq!((params.kxmax, params.kymax, params.kzmax), (4, 4, 4));
    }

    #[test]
    fn tolerance_without_sites_is_rejected() {
        let configuration = spce_configuration(0, 20.0);
        let result = ParameterResolver::new(EwaldConfig::Tolerance {
            tolerance: 1e-4,
            num_sites: None,
        })
        .resolve(&configuration);
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::InvalidValue { .. }))
        ));
    }
}
