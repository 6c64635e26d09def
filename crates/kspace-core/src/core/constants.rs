use phf::phf_map;
use std::f64::consts::PI;

/// A set of base physical constants in SI units.
///
/// Derived quantities such as the electrostatic charge conversion are computed
/// from these rather than stored, so every named set stays self-consistent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalConstants {
    /// Boltzmann constant in J/K.
    pub boltzmann_constant: f64,
    /// Avogadro constant in 1/mol.
    pub avogadro_constant: f64,
    /// Vacuum permittivity in C²/(J·m).
    pub permittivity_vacuum: f64,
    /// Elementary charge in C.
    pub elementary_charge: f64,
}

pub const DEFAULT_CONSTANTS: &str = "CODATA2018";

static CONSTANT_SETS: phf::Map<&'static str, PhysicalConstants> = phf_map! {
    "CODATA2018" => PhysicalConstants {
        boltzmann_constant: 1.380649E-23,
        avogadro_constant: 6.02214076E+23,
        permittivity_vacuum: 8.8541878128E-12,
        elementary_charge: 1.602176634E-19,
    },
    "CODATA2014" => PhysicalConstants {
        boltzmann_constant: 1.38064852E-23,
        avogadro_constant: 6.022140857E+23,
        permittivity_vacuum: 8.854187817E-12,
        elementary_charge: 1.6021766208E-19,
    },
    "CODATA2010" => PhysicalConstants {
        boltzmann_constant: 1.3806488E-23,
        avogadro_constant: 6.02214129E+23,
        permittivity_vacuum: 8.854187817E-12,
        elementary_charge: 1.602176565E-19,
    },
};

impl PhysicalConstants {
    /// Looks up a named constant set such as `"CODATA2018"`.
    pub fn by_name(name: &str) -> Option<Self> {
        CONSTANT_SETS.get(name).copied()
    }

    /// Names of every known constant set.
    pub fn available() -> impl Iterator<Item = &'static str> {
        CONSTANT_SETS.keys().copied()
    }

    /// Ideal gas constant in J/(K·mol).
    pub fn ideal_gas_constant(&self) -> f64 {
        self.boltzmann_constant * self.avogadro_constant
    }

    /// Converts e²/Å to kJ/mol, i.e. the factor in units of kJ·Å/(mol·e²).
    pub fn charge_conversion(&self) -> f64 {
        self.elementary_charge.powi(2)
            / (4.0 * PI * self.permittivity_vacuum * 1e3 / 1e10 / self.avogadro_constant)
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        CONSTANT_SETS[DEFAULT_CONSTANTS]
    }
}
