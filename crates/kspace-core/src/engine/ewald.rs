use super::config::EwaldConfig;
use super::eik::{EikLayout, EikTable};
use super::error::EngineError;
use super::params::{EwaldParams, ParameterResolver};
use super::structure_factor::{EwaldState, StructureFactor};
use super::wave_vectors::{ReciprocalBasis, WaveVector, WaveVectorSet};
use crate::core::models::configuration::{Configuration, ConfigurationError};
use crate::core::models::select::{Select, TrialState};
use nalgebra::Point3;
use tracing::{debug, info, trace};

/// Agreement required between committed and recomputed state in [`Ewald::check`].
const CHECK_TOLERANCE: f64 = 1e-4;

/// A physical site taking part in a computation.
#[derive(Debug, Clone, Copy)]
struct SelectedSite {
    particle: usize,
    site: usize,
    particle_sites: usize,
    position: Point3<f64>,
    charge: f64,
}

fn physical_sites(
    selection: &Select,
    configuration: &Configuration,
) -> Result<Vec<SelectedSite>, EngineError> {
    let params = configuration.model_params();
    let mut sites = Vec::with_capacity(selection.num_sites());
    for (particle_index, site_index) in selection.sites() {
        let particle = configuration
            .particle(particle_index)
            .ok_or(ConfigurationError::ParticleNotFound(particle_index))?;
        let site = particle
            .site(site_index)
            .ok_or(ConfigurationError::SiteNotFound {
                particle: particle_index,
                site: site_index,
            })?;
        if !site.is_physical() {
            continue;
        }
        sites.push(SelectedSite {
            particle: particle_index,
            site: site_index,
            particle_sites: particle.num_sites(),
            position: site.position,
            charge: params.charge(site.site_type),
        });
    }
    Ok(sites)
}

/// Computes one eik row per site into `rows`, in site order.
fn fill_rows(layout: &EikLayout, basis: &ReciprocalBasis, sites: &[SelectedSite], rows: &mut Vec<f64>) {
    let len = layout.row_len();
    rows.clear();
    rows.resize(sites.len() * len, 0.0);
    for (site, row) in sites.iter().zip(rows.chunks_exact_mut(len)) {
        layout.compute_row(basis.dots(&site.position), row);
    }
}

/// What a pending trial will install on [`Ewald::finalize`].
#[derive(Debug, Clone)]
struct PendingTrial {
    state: TrialState,
    sites: Vec<SelectedSite>,
    /// Regenerated wave vectors of a full rebuild.
    waves: Option<WaveVectorSet>,
}

/// The reciprocal-space part of an Ewald sum, updated incrementally through
/// Monte Carlo trials.
///
/// A trial is priced with [`Ewald::compute`] or [`Ewald::compute_selection`]
/// and only ever writes scratch buffers. [`Ewald::finalize`] promotes the
/// scratch buffers after an accepted trial; a rejected trial needs no call, as
/// the next trial starts over from the committed state.
#[derive(Debug, Clone)]
pub struct Ewald {
    resolver: ParameterResolver,
    precomputed: bool,
    params: EwaldParams,
    waves: WaveVectorSet,
    eik: EikTable,
    state: EwaldState,
    trial_rows: Vec<f64>,
    pending: Option<PendingTrial>,
}

impl Ewald {
    pub fn new(config: EwaldConfig) -> Self {
        Self {
            resolver: ParameterResolver::new(config),
            precomputed: false,
            params: EwaldParams::default(),
            waves: WaveVectorSet::default(),
            eik: EikTable::default(),
            state: EwaldState::default(),
            trial_rows: Vec::new(),
            pending: None,
        }
    }

    pub(crate) fn from_parts(
        config: EwaldConfig,
        params: EwaldParams,
        waves: WaveVectorSet,
        eik: EikTable,
        committed: StructureFactor,
        committed_energy: f64,
    ) -> Self {
        let mut state = EwaldState {
            committed,
            committed_energy,
            ..EwaldState::default()
        };
        state.discard();
        Self {
            resolver: ParameterResolver::new(config),
            precomputed: true,
            params,
            waves,
            eik,
            state,
            trial_rows: Vec::new(),
            pending: None,
        }
    }

    /// Resolves the parameters, generates the wave vectors and clears all
    /// cached state. Call once before any computation and again whenever
    /// alpha or the domain changes.
    pub fn precompute(&mut self, configuration: &Configuration) -> Result<(), EngineError> {
        let params = self.resolver.resolve(configuration)?;
        let kmax_squared = params.kmax_squared_cutoff(configuration.domain());
        let waves = WaveVectorSet::generate(
            configuration.domain(),
            params.alpha,
            kmax_squared,
            params.kxmax,
            params.kymax,
            params.kzmax,
        )?;
        info!("alpha: {}", params.alpha);
        info!(
            "kmax: ({}, {}, {}), kmax_squared: {}, wave vectors: {}",
            params.kxmax,
            params.kymax,
            params.kzmax,
            kmax_squared,
            waves.len()
        );

        self.eik = EikTable::new(EikLayout::new(params.kxmax, params.kymax, params.kzmax));
        self.state = EwaldState::new(waves.len());
        self.params = params;
        self.waves = waves;
        self.trial_rows.clear();
        self.pending = None;
        self.precomputed = true;
        Ok(())
    }

    /// Recomputes a group from scratch and returns its reciprocal energy.
    ///
    /// Wave vectors and the reciprocal basis are regenerated for the current
    /// domain; they replace the committed ones on [`Ewald::finalize`].
    pub fn compute(&mut self, configuration: &Configuration, group_index: usize) -> Result<f64, EngineError> {
        self.ensure_precomputed()?;
        let domain = configuration.domain();
        let waves = WaveVectorSet::generate(
            domain,
            self.params.alpha,
            self.params.kmax_squared_cutoff(domain),
            self.params.kxmax,
            self.params.kymax,
            self.params.kzmax,
        )?;
        let selection = configuration.group_select(group_index)?;
        let sites = physical_sites(&selection, configuration)?;

        let layout = *self.eik.layout();
        fill_rows(&layout, waves.basis(), &sites, &mut self.trial_rows);
        self.state.begin_rebuild(waves.len());
        for (site, row) in sites.iter().zip(self.trial_rows.chunks_exact(layout.row_len())) {
            self.state
                .trial
                .add_site(&layout, row, waves.vectors(), site.charge);
        }
        let conversion = configuration.model_params().charge_conversion();
        self.state.trial_energy = conversion * self.state.trial.fourier_energy(waves.vectors());
        debug!(
            "full rebuild over {} sites: {}",
            sites.len(),
            self.state.trial_energy
        );

        self.pending = Some(PendingTrial {
            state: TrialState::FullRebuild,
            sites,
            waves: Some(waves),
        });
        Ok(self.state.trial_energy)
    }

    /// Prices a trial on a selection, dispatching on its trial state.
    ///
    /// | state          | returns                       |
    /// |----------------|-------------------------------|
    /// | `Old`          | committed energy              |
    /// | `NewPosition`  | energy after the move         |
    /// | `Removal`      | committed minus trial energy  |
    /// | `Addition`     | trial minus committed energy  |
    /// | `FullRebuild`  | see [`Ewald::compute`]        |
    ///
    /// A move subtracts the committed contribution of the selected sites and
    /// adds their contribution at the current positions, so it needs no prior
    /// `Old` read.
    pub fn compute_selection(
        &mut self,
        selection: &Select,
        configuration: &Configuration,
        group_index: usize,
    ) -> Result<f64, EngineError> {
        self.ensure_precomputed()?;
        if group_index != 0 {
            return Err(EngineError::UnsupportedGroup(group_index));
        }
        let state = selection.trial_state()?;
        if state == TrialState::FullRebuild {
            return self.compute(configuration, group_index);
        }
        let sites = physical_sites(selection, configuration)?;
        let conversion = configuration.model_params().charge_conversion();

        let energy = match state {
            TrialState::Old => {
                for site in &sites {
                    self.committed_row(site)?;
                }
                self.pending = None;
                self.state.committed_energy
            }
            TrialState::NewPosition => {
                self.incremental_trial(&sites, true, true, conversion)?;
                self.state.trial_energy
            }
            TrialState::Removal => {
                self.incremental_trial(&sites, true, false, conversion)?;
                self.state.committed_energy - self.state.trial_energy
            }
            TrialState::Addition => {
                self.incremental_trial(&sites, false, true, conversion)?;
                self.state.trial_energy - self.state.committed_energy
            }
            TrialState::FullRebuild => {
                return Err(EngineError::Internal(
                    "full rebuild reached incremental dispatch".to_string(),
                ));
            }
        };
        debug!(
            "{:?} over {} sites: {} (committed {}, trial {})",
            state,
            sites.len(),
            energy,
            self.state.committed_energy,
            self.state.trial_energy
        );

        if state != TrialState::Old {
            self.pending = Some(PendingTrial {
                state,
                sites,
                waves: None,
            });
        }
        Ok(energy)
    }

    fn incremental_trial(
        &mut self,
        sites: &[SelectedSite],
        subtract_committed: bool,
        add_current: bool,
        conversion: f64,
    ) -> Result<(), EngineError> {
        self.state.begin_trial();
        let layout = *self.eik.layout();
        if subtract_committed {
            for site in sites {
                let row = self.eik.row(site.particle, site.site).ok_or(EngineError::MissingEik {
                    particle: site.particle,
                    site: site.site,
                })?;
                self.state
                    .trial
                    .add_site(&layout, row, self.waves.vectors(), -site.charge);
            }
        }
        if add_current {
            fill_rows(&layout, self.waves.basis(), sites, &mut self.trial_rows);
            for (site, row) in sites.iter().zip(self.trial_rows.chunks_exact(layout.row_len())) {
                trace!(
                    "site ({}, {}) charge {} at {:?}",
                    site.particle, site.site, site.charge, site.position
                );
                self.state
                    .trial
                    .add_site(&layout, row, self.waves.vectors(), site.charge);
            }
        }
        self.state.trial_energy = conversion * self.state.trial.fourier_energy(self.waves.vectors());
        Ok(())
    }

    /// Commits the pending trial. Without a pending trial this does nothing.
    ///
    /// The structure factor and energy are always promoted. Eik rows of the
    /// trial sites are copied into the committed table except after a
    /// removal, and a full rebuild also installs its regenerated wave vectors.
    pub fn finalize(&mut self) -> Result<(), EngineError> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        let num_vectors = pending
            .waves
            .as_ref()
            .map_or(self.waves.len(), WaveVectorSet::len);
        self.state.commit(num_vectors)?;
        if let Some(waves) = pending.waves {
            self.waves = waves;
        }
        if pending.state != TrialState::Removal {
            let len = self.eik.layout().row_len();
            for (site, row) in pending.sites.iter().zip(self.trial_rows.chunks_exact(len)) {
                self.eik
                    .set_row(site.particle, site.site, row, site.particle_sites);
            }
        }
        debug!("finalized {:?}: {}", pending.state, self.state.committed_energy);
        Ok(())
    }

    /// Drops any pending trial.
    pub fn revert(&mut self) {
        self.pending = None;
        self.state.discard();
    }

    /// Volume moves would need the wave vectors of the resized domain.
    pub fn change_volume(&mut self, _delta_volume: f64, _dimension: Option<usize>) -> Result<(), EngineError> {
        Err(EngineError::VolumeChangeUnsupported)
    }

    /// Sum of the charges of all physical sites.
    pub fn net_charge(&self, configuration: &Configuration) -> f64 {
        let params = configuration.model_params();
        configuration
            .physical_sites()
            .map(|site| params.charge(site.site_type))
            .sum()
    }

    /// Recomputes everything from the configuration and compares it with the
    /// committed state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Inconsistent`] listing every disagreement larger
    /// than `1e-4`.
    pub fn check(&self, configuration: &Configuration) -> Result<(), EngineError> {
        self.ensure_precomputed()?;
        let domain = configuration.domain();
        let waves = WaveVectorSet::generate(
            domain,
            self.params.alpha,
            self.params.kmax_squared_cutoff(domain),
            self.params.kxmax,
            self.params.kymax,
            self.params.kzmax,
        )?;
        let sites = physical_sites(&configuration.selection_of_all(), configuration)?;
        let layout = *self.eik.layout();
        let mut rows = Vec::new();
        fill_rows(&layout, waves.basis(), &sites, &mut rows);
        let mut sf = StructureFactor::zeros(waves.len());
        for (site, row) in sites.iter().zip(rows.chunks_exact(layout.row_len())) {
            sf.add_site(&layout, row, waves.vectors(), site.charge);
        }

        let mut problems = Vec::new();
        if waves.len() != self.waves.len() {
            problems.push(format!(
                "number of wave vectors: recomputed {}, stored {}",
                waves.len(),
                self.waves.len()
            ));
        }
        let mut compare = |what: String, expected: f64, found: f64| {
            if (expected - found).abs() > CHECK_TOLERANCE {
                problems.push(format!("{what}: recomputed {expected}, stored {found}"));
            }
        };
        compare(
            "kmax_squared".to_string(),
            waves.kmax_squared(),
            self.waves.kmax_squared(),
        );
        let (a, b) = (waves.basis(), self.waves.basis());
        for (name, x, y) in [
            ("ux", a.ux, b.ux),
            ("uy", a.uy, b.uy),
            ("uz", a.uz, b.uz),
            ("vy", a.vy, b.vy),
            ("vz", a.vz, b.vz),
            ("wz", a.wz, b.wz),
        ] {
            compare(name.to_string(), x, y);
        }
        for (k, (x, y)) in waves.vectors().iter().zip(self.waves.vectors()).enumerate() {
            compare(format!("prefactor {k}"), x.prefactor, y.prefactor);
        }
        let committed = &self.state.committed;
        for k in 0..sf.len().min(committed.len()) {
            compare(format!("real structure factor {k}"), sf.real()[k], committed.real()[k]);
            compare(format!("imaginary structure factor {k}"), sf.imag()[k], committed.imag()[k]);
        }
        for (site, row) in sites.iter().zip(rows.chunks_exact(layout.row_len())) {
            match self.eik.row(site.particle, site.site) {
                None => problems.push(format!("eik ({}, {}): missing", site.particle, site.site)),
                Some(stored) => {
                    if row
                        .iter()
                        .zip(stored)
                        .any(|(x, y)| (x - y).abs() > CHECK_TOLERANCE)
                    {
                        problems.push(format!("eik ({}, {}): differs", site.particle, site.site));
                    }
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Inconsistent(problems))
        }
    }

    fn ensure_precomputed(&self) -> Result<(), EngineError> {
        if self.precomputed {
            Ok(())
        } else {
            Err(EngineError::NotPrecomputed)
        }
    }

    fn committed_row(&self, site: &SelectedSite) -> Result<&[f64], EngineError> {
        self.eik
            .row(site.particle, site.site)
            .ok_or(EngineError::MissingEik {
                particle: site.particle,
                site: site.site,
            })
    }

    pub fn config(&self) -> &EwaldConfig {
        self.resolver.config()
    }

    pub fn is_precomputed(&self) -> bool {
        self.precomputed
    }

    pub fn params(&self) -> &EwaldParams {
        &self.params
    }

    pub fn alpha(&self) -> f64 {
        self.params.alpha
    }

    pub fn kxmax(&self) -> i32 {
        self.params.kxmax
    }

    pub fn kymax(&self) -> i32 {
        self.params.kymax
    }

    pub fn kzmax(&self) -> i32 {
        self.params.kzmax
    }

    pub fn num_kx(&self) -> usize {
        self.params.num_kx()
    }

    pub fn num_ky(&self) -> usize {
        self.params.num_ky()
    }

    pub fn num_kz(&self) -> usize {
        self.params.num_kz()
    }

    pub fn kmax_squared(&self) -> f64 {
        self.waves.kmax_squared()
    }

    pub fn num_vectors(&self) -> usize {
        self.waves.len()
    }

    pub fn wave_vectors(&self) -> &[WaveVector] {
        self.waves.vectors()
    }

    pub(crate) fn wave_vector_set(&self) -> &WaveVectorSet {
        &self.waves
    }

    /// Integer index of wave vector `vector` along dimension `dim`.
    ///
    /// Returns `None` if either index is out of range.
    pub fn wave_num(&self, vector: usize, dim: usize) -> Option<i32> {
        self.waves.vectors().get(vector)?.index(dim)
    }

    pub fn basis(&self) -> &ReciprocalBasis {
        self.waves.basis()
    }

    pub fn struct_fact_real(&self) -> &[f64] {
        self.state.committed.real()
    }

    pub fn struct_fact_imag(&self) -> &[f64] {
        self.state.committed.imag()
    }

    pub(crate) fn committed_structure_factor(&self) -> &StructureFactor {
        &self.state.committed
    }

    /// Committed eik row of a site, if one has been built.
    pub fn eik(&self, particle: usize, site: usize) -> Option<&[f64]> {
        self.eik.row(particle, site)
    }

    pub fn eik_layout(&self) -> &EikLayout {
        self.eik.layout()
    }

    pub(crate) fn eik_table(&self) -> &EikTable {
        &self.eik
    }

    /// Reciprocal energy of the committed state.
    pub fn stored_energy(&self) -> f64 {
        self.state.committed_energy
    }

    /// Reciprocal energy of the most recent trial.
    pub fn trial_energy(&self) -> f64 {
        self.state.trial_energy
    }

    pub fn has_pending_trial(&self) -> bool {
        self.pending.is_some()
    }
}
