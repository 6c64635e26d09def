use nalgebra::{Point3, Vector3};

/// A site of a particle type, positioned relative to the particle's reference point.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteTemplate {
    pub site_type: usize,
    pub position: Vector3<f64>,
}

/// A rigid template from which particles are instantiated.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleType {
    pub name: String,
    pub sites: Vec<SiteTemplate>,
}

impl ParticleType {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sites: Vec::new(),
        }
    }

    pub fn with_site(mut self, site_type: usize, position: [f64; 3]) -> Self {
        self.sites.push(SiteTemplate {
            site_type,
            position: Vector3::from(position),
        });
        self
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }
}

/// An interaction site carrying a point charge.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub site_type: usize,
    pub position: Point3<f64>,
    physical: bool,
}

impl Site {
    pub(crate) fn new(site_type: usize, position: Point3<f64>) -> Self {
        Self {
            site_type,
            position,
            physical: true,
        }
    }

    /// Non-physical sites exist in storage but contribute to no energy.
    pub fn is_physical(&self) -> bool {
        self.physical
    }

    pub(crate) fn set_physical(&mut self, physical: bool) {
        self.physical = physical;
    }
}

/// A particle slot. Removed particles stay in place as ghosts until a later
/// insertion of the same type reuses the slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    particle_type: usize,
    sites: Vec<Site>,
    ghost: bool,
}

impl Particle {
    pub(crate) fn from_type(type_index: usize, particle_type: &ParticleType) -> Self {
        let sites = particle_type
            .sites
            .iter()
            .map(|t| Site::new(t.site_type, Point3::from(t.position)))
            .collect();
        Self {
            particle_type: type_index,
            sites,
            ghost: false,
        }
    }

    pub fn particle_type(&self) -> usize {
        self.particle_type
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn site(&self, index: usize) -> Option<&Site> {
        self.sites.get(index)
    }

    pub(crate) fn site_mut(&mut self, index: usize) -> Option<&mut Site> {
        self.sites.get_mut(index)
    }

    pub(crate) fn sites_mut(&mut self) -> impl Iterator<Item = &mut Site> {
        self.sites.iter_mut()
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn is_ghost(&self) -> bool {
        self.ghost
    }

    pub(crate) fn bury(&mut self) {
        self.ghost = true;
        self.sites.iter_mut().for_each(|s| s.set_physical(false));
    }

    /// Brings a ghost back to life at the template geometry.
    pub(crate) fn revive(&mut self, particle_type: &ParticleType) {
        self.ghost = false;
        for (site, template) in self.sites.iter_mut().zip(&particle_type.sites) {
            site.position = Point3::from(template.position);
            site.set_physical(true);
        }
    }
}
