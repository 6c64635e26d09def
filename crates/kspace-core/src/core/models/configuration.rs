use super::domain::Domain;
use super::params::ModelParams;
use super::particle::{Particle, ParticleType, Site};
use super::select::Select;
use nalgebra::{Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Side length {length} along dimension {dim} must be positive and finite")]
    InvalidSideLength { dim: usize, length: f64 },
    #[error("Site type {0} is not registered in the model parameters")]
    UnknownSiteType(usize),
    #[error("Particle type {0} does not exist")]
    UnknownParticleType(usize),
    #[error("Particle {0} does not exist")]
    ParticleNotFound(usize),
    #[error("Particle {0} is a ghost")]
    GhostParticle(usize),
    #[error("Site {site} does not exist in particle {particle}")]
    SiteNotFound { particle: usize, site: usize },
    #[error("Group {0} does not exist")]
    UnknownGroup(usize),
    #[error("Expected {expected} site positions but found {found}")]
    SiteCountMismatch { expected: usize, found: usize },
}

/// A subset of the configuration defined by particle type. An empty type list
/// selects every particle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    pub particle_types: Vec<usize>,
}

impl Group {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of_types(particle_types: Vec<usize>) -> Self {
        Self { particle_types }
    }

    pub fn contains_type(&self, particle_type: usize) -> bool {
        self.particle_types.is_empty() || self.particle_types.contains(&particle_type)
    }
}

/// The particles in a periodic cell, along with the model parameters they use.
///
/// Particle storage is a slot arena: removing a particle turns its slot into a
/// ghost (all sites non-physical) and files it on a per-type free list, and the
/// next insertion of that type reuses the slot. Particle indices therefore stay
/// stable for the lifetime of the configuration.
#[derive(Debug, Clone)]
pub struct Configuration {
    domain: Domain,
    model_params: ModelParams,
    particle_types: Vec<ParticleType>,
    particles: Vec<Particle>,
    /// Ghost slots available for reuse, per particle type.
    ghosts: Vec<Vec<usize>>,
    /// Group 0 always selects everything.
    groups: Vec<Group>,
}

impl Configuration {
    pub fn new(domain: Domain, model_params: ModelParams) -> Self {
        Self {
            domain,
            model_params,
            particle_types: Vec::new(),
            particles: Vec::new(),
            ghosts: Vec::new(),
            groups: vec![Group::all()],
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn set_domain(&mut self, domain: Domain) {
        self.domain = domain;
    }

    pub fn set_side_lengths(&mut self, side_lengths: Vector3<f64>) -> Result<(), ConfigurationError> {
        self.domain.set_side_lengths(side_lengths)
    }

    pub fn model_params(&self) -> &ModelParams {
        &self.model_params
    }

    pub fn model_params_mut(&mut self) -> &mut ModelParams {
        &mut self.model_params
    }

    /// Registers a particle type and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownSiteType`] if a site references a
    /// site type missing from the model parameters.
    pub fn add_particle_type(&mut self, particle_type: ParticleType) -> Result<usize, ConfigurationError> {
        let num_site_types = self.model_params.num_site_types();
        if let Some(bad) = particle_type
            .sites
            .iter()
            .find(|s| s.site_type >= num_site_types)
        {
            return Err(ConfigurationError::UnknownSiteType(bad.site_type));
        }
        self.particle_types.push(particle_type);
        self.ghosts.push(Vec::new());
        Ok(self.particle_types.len() - 1)
    }

    pub fn particle_types(&self) -> &[ParticleType] {
        &self.particle_types
    }

    pub fn num_particle_types(&self) -> usize {
        self.particle_types.len()
    }

    /// Inserts a particle at its template geometry and returns its slot index.
    ///
    /// A ghost slot of the same type is reused when one is available.
    pub fn add_particle_of_type(&mut self, type_index: usize) -> Result<usize, ConfigurationError> {
        let particle_type = self
            .particle_types
            .get(type_index)
            .ok_or(ConfigurationError::UnknownParticleType(type_index))?;
        if let Some(slot) = self.ghosts[type_index].pop() {
            self.particles[slot].revive(particle_type);
            return Ok(slot);
        }
        self.particles
            .push(Particle::from_type(type_index, particle_type));
        Ok(self.particles.len() - 1)
    }

    /// Turns a particle into a ghost. Its slot keeps its sites but none are physical.
    pub fn remove_particle(&mut self, index: usize) -> Result<(), ConfigurationError> {
        let particle = self.live_particle_mut(index)?;
        particle.bury();
        let type_index = particle.particle_type();
        self.ghosts[type_index].push(index);
        Ok(())
    }

    /// Returns the particle in a slot, ghost or not.
    pub fn particle(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    /// Number of slots, including ghosts.
    pub fn num_particle_slots(&self) -> usize {
        self.particles.len()
    }

    /// Number of non-ghost particles.
    pub fn num_particles(&self) -> usize {
        self.particles.iter().filter(|p| !p.is_ghost()).count()
    }

    pub fn num_ghosts(&self) -> usize {
        self.ghosts.iter().map(Vec::len).sum()
    }

    /// Iterates over non-ghost particles with their slot indices.
    pub fn particles_iter(&self) -> impl Iterator<Item = (usize, &Particle)> {
        self.particles
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_ghost())
    }

    /// Number of physical sites.
    pub fn num_sites(&self) -> usize {
        self.physical_sites().count()
    }

    /// Number of physical sites of each site type, indexed by site type.
    pub fn num_sites_of_type(&self) -> Vec<usize> {
        let mut counts = vec![0; self.model_params.num_site_types()];
        for site in self.physical_sites() {
            counts[site.site_type] += 1;
        }
        counts
    }

    pub fn physical_sites(&self) -> impl Iterator<Item = &Site> {
        self.particles
            .iter()
            .flat_map(|p| p.sites().iter())
            .filter(|s| s.is_physical())
    }

    pub fn site(&self, particle: usize, site: usize) -> Option<&Site> {
        self.particles.get(particle).and_then(|p| p.site(site))
    }

    pub fn set_site_position(
        &mut self,
        particle: usize,
        site: usize,
        position: Point3<f64>,
    ) -> Result<(), ConfigurationError> {
        self.live_site_mut(particle, site)?.position = position;
        Ok(())
    }

    /// Marks a single site as (non-)physical, e.g. while a particle is grown site by site.
    pub fn set_site_physical(
        &mut self,
        particle: usize,
        site: usize,
        physical: bool,
    ) -> Result<(), ConfigurationError> {
        self.live_site_mut(particle, site)?.set_physical(physical);
        Ok(())
    }

    pub fn displace_particle(&mut self, index: usize, displacement: &Vector3<f64>) -> Result<(), ConfigurationError> {
        let particle = self.live_particle_mut(index)?;
        for site in particle.sites_mut() {
            site.position += *displacement;
        }
        Ok(())
    }

    /// Displaces every site of every particle, ghosts included.
    pub fn translate_all(&mut self, displacement: &Vector3<f64>) {
        for particle in &mut self.particles {
            for site in particle.sites_mut() {
                site.position += *displacement;
            }
        }
    }

    /// Overwrites site positions of all non-ghost particles, in slot then site order.
    pub fn update_positions(&mut self, positions: &[Point3<f64>]) -> Result<(), ConfigurationError> {
        let expected: usize = self.particles_iter().map(|(_, p)| p.num_sites()).sum();
        if expected != positions.len() {
            return Err(ConfigurationError::SiteCountMismatch {
                expected,
                found: positions.len(),
            });
        }
        let mut next = positions.iter();
        for particle in self.particles.iter_mut().filter(|p| !p.is_ghost()) {
            for (site, position) in particle.sites_mut().zip(next.by_ref()) {
                site.position = *position;
            }
        }
        Ok(())
    }

    pub fn add_group(&mut self, group: Group) -> usize {
        self.groups.push(group);
        self.groups.len() - 1
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Selects every site of every non-ghost particle in a group.
    pub fn group_select(&self, group_index: usize) -> Result<Select, ConfigurationError> {
        let group = self
            .groups
            .get(group_index)
            .ok_or(ConfigurationError::UnknownGroup(group_index))?;
        let mut select = Select::new();
        for (index, particle) in self.particles_iter() {
            if group.contains_type(particle.particle_type()) {
                select.add_particle(index, (0..particle.num_sites()).collect());
            }
        }
        Ok(select)
    }

    pub fn selection_of_all(&self) -> Select {
        let mut select = Select::new();
        for (index, particle) in self.particles_iter() {
            select.add_particle(index, (0..particle.num_sites()).collect());
        }
        select
    }

    /// Selects every site of one non-ghost particle.
    pub fn select_particle(&self, index: usize) -> Result<Select, ConfigurationError> {
        let particle = self
            .particles
            .get(index)
            .ok_or(ConfigurationError::ParticleNotFound(index))?;
        if particle.is_ghost() {
            return Err(ConfigurationError::GhostParticle(index));
        }
        let mut select = Select::new();
        select.add_particle(index, (0..particle.num_sites()).collect());
        Ok(select)
    }

    fn live_particle_mut(&mut self, index: usize) -> Result<&mut Particle, ConfigurationError> {
        let particle = self
            .particles
            .get_mut(index)
            .ok_or(ConfigurationError::ParticleNotFound(index))?;
        if particle.is_ghost() {
            return Err(ConfigurationError::GhostParticle(index));
        }
        Ok(particle)
    }

    fn live_site_mut(&mut self, particle: usize, site: usize) -> Result<&mut Site, ConfigurationError> {
        self.live_particle_mut(particle)?
            .site_mut(site)
            .ok_or(ConfigurationError::SiteNotFound { particle, site })
    }
}
