use super::eik::EikLayout;
use super::error::EngineError;
use super::wave_vectors::WaveVector;
use bincode::{Decode, Encode};

/// Complex structure factor, one entry per wave vector, stored as parallel
/// real and imaginary sequences.
#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
pub struct StructureFactor {
    real: Vec<f64>,
    imag: Vec<f64>,
}

impl StructureFactor {
    pub fn zeros(num_vectors: usize) -> Self {
        Self {
            real: vec![0.0; num_vectors],
            imag: vec![0.0; num_vectors],
        }
    }

    pub fn len(&self) -> usize {
        self.real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    pub fn real(&self) -> &[f64] {
        &self.real
    }

    pub fn imag(&self) -> &[f64] {
        &self.imag
    }

    pub fn reset(&mut self, num_vectors: usize) {
        self.real.clear();
        self.real.resize(num_vectors, 0.0);
        self.imag.clear();
        self.imag.resize(num_vectors, 0.0);
    }

    /// Adds `weight · exp(i k·r)` for every wave vector, reading the per-axis
    /// factors of one site from its eik row.
    pub fn add_site(&mut self, layout: &EikLayout, row: &[f64], vectors: &[WaveVector], weight: f64) {
        for ((vector, re), im) in vectors.iter().zip(&mut self.real).zip(&mut self.imag) {
            let (eikr, eiki) = layout.factor(row, vector.kx, vector.ky, vector.kz);
            *re += weight * eikr;
            *im += weight * eiki;
        }
    }

    /// `Σ_k prefactor_k · (real_k² + imag_k²)`, before unit conversion.
    pub fn fourier_energy(&self, vectors: &[WaveVector]) -> f64 {
        vectors
            .iter()
            .zip(self.real.iter().zip(&self.imag))
            .map(|(v, (re, im))| v.prefactor * (re * re + im * im))
            .sum()
    }
}

/// Committed and trial generations of the structure factor and its energy.
///
/// Only [`EwaldState::commit`] writes the committed generation. A trial always
/// starts from [`EwaldState::begin_trial`] or [`EwaldState::begin_rebuild`], so
/// a rejected trial needs no explicit cleanup.
#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
pub struct EwaldState {
    pub committed: StructureFactor,
    pub trial: StructureFactor,
    pub committed_energy: f64,
    pub trial_energy: f64,
}

impl EwaldState {
    pub fn new(num_vectors: usize) -> Self {
        Self {
            committed: StructureFactor::zeros(num_vectors),
            trial: StructureFactor::zeros(num_vectors),
            committed_energy: 0.0,
            trial_energy: 0.0,
        }
    }

    /// Seeds the trial generation from the committed one.
    pub fn begin_trial(&mut self) {
        self.trial.clone_from(&self.committed);
        self.trial_energy = self.committed_energy;
    }

    /// Clears the trial generation for a rebuild over `num_vectors` wave vectors.
    pub fn begin_rebuild(&mut self, num_vectors: usize) {
        self.trial.reset(num_vectors);
        self.trial_energy = 0.0;
    }

    /// Promotes the trial generation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StructureFactorMismatch`] if the trial does not
    /// hold exactly `num_vectors` entries.
    pub fn commit(&mut self, num_vectors: usize) -> Result<(), EngineError> {
        if self.trial.len() != num_vectors || self.trial.imag.len() != num_vectors {
            return Err(EngineError::StructureFactorMismatch {
                trial: self.trial.len(),
                expected: num_vectors,
            });
        }
        self.committed.clone_from(&self.trial);
        self.committed_energy = self.trial_energy;
        Ok(())
    }

    /// Drops the trial generation.
    pub fn discard(&mut self) {
        self.begin_trial();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors() -> Vec<WaveVector> {
        vec![
            WaveVector {
                kx: 0,
                ky: 0,
                kz: 1,
                prefactor: 0.5,
            },
            WaveVector {
                kx: 1,
                ky: -1,
                kz: 0,
                prefactor: 0.25,
            },
        ]
    }

    #[test]
    fn opposite_weights_cancel() {
        let layout = EikLayout::new(1, 1, 1);
        let mut row = vec![0.0; layout.row_len()];
        layout.compute_row([0.4, 1.2, -0.7], &mut row);

        let mut sf = StructureFactor::zeros(2);
        sf.add_site(&layout, &row, &vectors(), 1.5);
        assert!(sf.real().iter().any(|v| *v != 0.0));
        sf.add_site(&layout, &row, &vectors(), -1.5);
        assert!(sf.real().iter().chain(sf.imag()).all(|v| v.abs() < 1e-15));
    }

    #[test]
    fn fourier_energy_weights_squared_magnitude() {
        let sf = StructureFactor {
            real: vec![1.0, 3.0],
            imag: vec![2.0, 0.0],
        };
        assert_eq!(sf.fourier_energy(&vectors()), 0.5 * 5.0 + 0.25 * 9.0);
    }

    #[test]
    fn commit_copies_trial_bitwise_and_discard_restores() {
        let mut state = EwaldState::new(2);
        state.begin_trial();
        state.trial.real[0] = 0.1 + 0.2;
        state.trial_energy = 4.0;
        state.commit(2).unwrap();
        assert_eq!(state.committed, state.trial);
        assert_eq!(state.committed_energy, 4.0);

        state.begin_trial();
        state.trial.imag[1] = -9.0;
        state.discard();
        assert_eq!(state.trial, state.committed);
    }

    #[test]
    fn commit_rejects_mismatched_sizes() {
        let mut state = EwaldState::new(2);
        state.begin_rebuild(3);
        assert!(matches!(
            state.commit(2),
            Err(EngineError::StructureFactorMismatch {
                trial: 3,
                expected: 2
            })
        ));
        assert_eq!(state.committed.len(), 2);
    }
}
