use thiserror::Error;

/// Describes how the sites of a selection take part in a Monte Carlo trial.
///
/// The Monte Carlo framework hands selections around with a raw integer tag; it is
/// converted into this enum exactly once, when the Ewald engine reads the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrialState {
    /// Sites are read at their committed positions; nothing changes.
    Old,
    /// Sites moved without changing the number of particles.
    NewPosition,
    /// Sites are leaving the system.
    Removal,
    /// Sites are entering the system.
    Addition,
    /// Everything in the target group is recomputed from scratch.
    FullRebuild,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Unrecognized trial state tag: {0} (expected 0 to 4)")]
pub struct InvalidTrialState(pub i32);

impl TryFrom<i32> for TrialState {
    type Error = InvalidTrialState;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::Old),
            1 => Ok(Self::NewPosition),
            2 => Ok(Self::Removal),
            3 => Ok(Self::Addition),
            4 => Ok(Self::FullRebuild),
            other => Err(InvalidTrialState(other)),
        }
    }
}

impl From<TrialState> for i32 {
    fn from(state: TrialState) -> Self {
        match state {
            TrialState::Old => 0,
            TrialState::NewPosition => 1,
            TrialState::Removal => 2,
            TrialState::Addition => 3,
            TrialState::FullRebuild => 4,
        }
    }
}

/// Sites of one particle taking part in a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedParticle {
    pub particle_index: usize,
    pub site_indices: Vec<usize>,
}

/// A subset of particles and sites, tagged with the trial state it represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    particles: Vec<SelectedParticle>,
    trial_tag: i32,
}

impl Default for Select {
    fn default() -> Self {
        Self {
            particles: Vec::new(),
            trial_tag: -1,
        }
    }
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trial_state(mut self, state: TrialState) -> Self {
        self.set_trial_state(state);
        self
    }

    pub fn add_particle(&mut self, particle_index: usize, site_indices: Vec<usize>) {
        self.particles.push(SelectedParticle {
            particle_index,
            site_indices,
        });
    }

    pub fn particles(&self) -> &[SelectedParticle] {
        &self.particles
    }

    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn num_sites(&self) -> usize {
        self.particles.iter().map(|p| p.site_indices.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Iterates over `(particle_index, site_index)` pairs in selection order.
    pub fn sites(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.particles.iter().flat_map(|p| {
            p.site_indices
                .iter()
                .map(move |&site_index| (p.particle_index, site_index))
        })
    }

    /// The raw tag as set by the Monte Carlo framework; `-1` when unset.
    pub fn trial_tag(&self) -> i32 {
        self.trial_tag
    }

    pub fn set_trial_tag(&mut self, tag: i32) {
        self.trial_tag = tag;
    }

    pub fn set_trial_state(&mut self, state: TrialState) {
        self.trial_tag = state.into();
    }

    /// Decodes the raw tag.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTrialState`] for any tag outside `0..=4`.
    pub fn trial_state(&self) -> Result<TrialState, InvalidTrialState> {
        TrialState::try_from(self.trial_tag)
    }
}
