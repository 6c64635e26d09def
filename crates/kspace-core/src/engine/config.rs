use bincode::{Decode, Encode};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Conflicting parameters: {0}")]
    ConflictingParameters(String),
    #[error("Invalid value for {parameter}: {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

/// How the Ewald splitting parameter and the wave-vector cutoff are chosen.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum EwaldConfig {
    /// Dimensionless cutoff in units of `(2π / L)²`. Requires a cubic domain.
    KmaxSquared { alpha: f64, kmax_squared: u32 },
    /// Explicit wave-number maxima per axis.
    Explicit {
        alpha: f64,
        kxmax: i32,
        kymax: i32,
        kzmax: i32,
    },
    /// Alpha and the maxima are estimated from a target relative accuracy.
    /// `num_sites` overrides the number of sites used in the estimate.
    Tolerance {
        tolerance: f64,
        num_sites: Option<usize>,
    },
}

#[derive(Debug, Default, Clone)]
pub struct EwaldConfigBuilder {
    alpha: Option<f64>,
    kmax_squared: Option<u32>,
    kxmax: Option<i32>,
    kymax: Option<i32>,
    kzmax: Option<i32>,
    tolerance: Option<f64>,
    tolerance_num_sites: Option<usize>,
}

impl EwaldConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }
    pub fn kmax_squared(mut self, kmax_squared: u32) -> Self {
        self.kmax_squared = Some(kmax_squared);
        self
    }
    pub fn kxmax(mut self, kxmax: i32) -> Self {
        self.kxmax = Some(kxmax);
        self
    }
    pub fn kymax(mut self, kymax: i32) -> Self {
        self.kymax = Some(kymax);
        self
    }
    pub fn kzmax(mut self, kzmax: i32) -> Self {
        self.kzmax = Some(kzmax);
        self
    }
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn tolerance_num_sites(mut self, num_sites: usize) -> Self {
        self.tolerance_num_sites = Some(num_sites);
        self
    }

    pub fn build(self) -> Result<EwaldConfig, ConfigError> {
        let explicit = self.kxmax.is_some() || self.kymax.is_some() || self.kzmax.is_some();
        let mut modes = Vec::new();
        if self.kmax_squared.is_some() {
            modes.push("kmax_squared");
        }
        if explicit {
            modes.push("kxmax/kymax/kzmax");
        }
        if self.tolerance.is_some() {
            modes.push("tolerance");
        }
        if modes.len() > 1 {
            return Err(ConfigError::ConflictingParameters(format!(
                "only one of kmax_squared, kxmax/kymax/kzmax or tolerance may be given, got {}",
                modes.join(" and ")
            )));
        }
        if self.tolerance_num_sites.is_some() && self.tolerance.is_none() {
            return Err(ConfigError::ConflictingParameters(
                "tolerance_num_sites requires tolerance".to_string(),
            ));
        }

        if let Some(tolerance) = self.tolerance {
            if self.alpha.is_some() {
                return Err(ConfigError::ConflictingParameters(
                    "alpha is derived from tolerance and cannot also be given".to_string(),
                ));
            }
            if !(tolerance.is_finite() && tolerance > 0.0 && tolerance < 1.0) {
                return Err(ConfigError::InvalidValue {
                    parameter: "tolerance",
                    reason: format!("{} is not in (0, 1)", tolerance),
                });
            }
            return Ok(EwaldConfig::Tolerance {
                tolerance,
                num_sites: self.tolerance_num_sites,
            });
        }

        let alpha = self.alpha.ok_or(ConfigError::MissingParameter("alpha"))?;
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(ConfigError::InvalidValue {
                parameter: "alpha",
                reason: format!("{} is not positive", alpha),
            });
        }

        if let Some(kmax_squared) = self.kmax_squared {
            if kmax_squared == 0 {
                return Err(ConfigError::InvalidValue {
                    parameter: "kmax_squared",
                    reason: "must be at least 1".to_string(),
                });
            }
            return Ok(EwaldConfig::KmaxSquared { alpha, kmax_squared });
        }

        if explicit {
            let kxmax = self.kxmax.ok_or(ConfigError::MissingParameter("kxmax"))?;
            let kymax = self.kymax.ok_or(ConfigError::MissingParameter("kymax"))?;
            let kzmax = self.kzmax.ok_or(ConfigError::MissingParameter("kzmax"))?;
            for (parameter, value) in [("kxmax", kxmax), ("kymax", kymax), ("kzmax", kzmax)] {
                if value < 0 {
                    return Err(ConfigError::InvalidValue {
                        parameter,
                        reason: format!("{} is negative", value),
                    });
                }
            }
            return Ok(EwaldConfig::Explicit {
                alpha,
                kxmax,
                kymax,
                kzmax,
            });
        }

        Err(ConfigError::MissingParameter(
            "kmax_squared, kxmax/kymax/kzmax or tolerance",
        ))
    }
}
