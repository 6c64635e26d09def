use crate::core::constants::PhysicalConstants;

/// A site type and the point charge it carries, in elementary charge units.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteType {
    pub name: String,
    pub charge: f64,
}

/// Per-site-type model parameters shared by every potential acting on a configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    site_types: Vec<SiteType>,
    /// Real-space interaction cutoff in Angstroms.
    cutoff: f64,
    constants: PhysicalConstants,
}

impl ModelParams {
    pub fn new(cutoff: f64, constants: PhysicalConstants) -> Self {
        Self {
            site_types: Vec::new(),
            cutoff,
            constants,
        }
    }

    /// Registers a site type, or returns the index of an existing one with the same name.
    ///
    /// Re-registering a name overwrites its charge.
    pub fn add_site_type(&mut self, name: &str, charge: f64) -> usize {
        if let Some(index) = self.site_type_index(name) {
            self.site_types[index].charge = charge;
            return index;
        }
        self.site_types.push(SiteType {
            name: name.to_string(),
            charge,
        });
        self.site_types.len() - 1
    }

    pub fn site_type_index(&self, name: &str) -> Option<usize> {
        self.site_types.iter().position(|t| t.name == name)
    }

    pub fn site_types(&self) -> &[SiteType] {
        &self.site_types
    }

    pub fn num_site_types(&self) -> usize {
        self.site_types.len()
    }

    /// Charge of a registered site type.
    ///
    /// Site types are validated when particle types are added to a configuration,
    /// so every site reaching the engine indexes a registered type.
    #[inline]
    pub fn charge(&self, site_type: usize) -> f64 {
        self.site_types[site_type].charge
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn constants(&self) -> &PhysicalConstants {
        &self.constants
    }

    pub fn charge_conversion(&self) -> f64 {
        self.constants.charge_conversion()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_site_type_is_idempotent_by_name() {
        let mut params = ModelParams::new(10.0, PhysicalConstants::default());
        let o = params.add_site_type("O", -0.8476);
        let h = params.add_site_type("H", 0.4238);
        assert_eq!(params.add_site_type("O", -0.8), o);
        assert_eq!(params.num_site_types(), 2);
        assert_eq!(params.charge(o), -0.8);
        assert_eq!(params.charge(h), 0.4238);
    }

    #[test]
    fn site_type_index_finds_registered_names_only() {
        let mut params = ModelParams::new(10.0, PhysicalConstants::default());
        params.add_site_type("Na", 1.0);
        assert_eq!(params.site_type_index("Na"), Some(0));
        assert_eq!(params.site_type_index("Cl"), None);
    }
}
