use super::config::EwaldConfig;
use super::eik::EikTable;
use super::error::EngineError;
use super::ewald::Ewald;
use super::params::EwaldParams;
use super::structure_factor::StructureFactor;
use super::wave_vectors::WaveVectorSet;
use bincode::{Decode, Encode};
use std::fs;
use std::path::Path;
use tracing::info;

const CHECKPOINT_VERSION: u32 = 1;

/// Committed engine state as written to disk. Trial buffers are not saved.
#[derive(Debug, Encode, Decode)]
struct Checkpoint {
    version: u32,
    config: EwaldConfig,
    params: EwaldParams,
    waves: WaveVectorSet,
    eik: EikTable,
    committed: StructureFactor,
    committed_energy: f64,
}

impl Ewald {
    /// Serializes the committed state. Floating-point values round-trip bit for bit.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EngineError> {
        if !self.is_precomputed() {
            return Err(EngineError::NotPrecomputed);
        }
        let checkpoint = Checkpoint {
            version: CHECKPOINT_VERSION,
            config: self.config().clone(),
            params: *self.params(),
            waves: self.wave_vector_set().clone(),
            eik: self.eik_table().clone(),
            committed: self.committed_structure_factor().clone(),
            committed_energy: self.stored_energy(),
        };
        bincode::encode_to_vec(&checkpoint, bincode::config::standard())
            .map_err(|e| EngineError::Checkpoint(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        let (checkpoint, _): (Checkpoint, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| EngineError::Checkpoint(e.to_string()))?;
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(EngineError::Checkpoint(format!(
                "unsupported checkpoint version {} (expected {})",
                checkpoint.version, CHECKPOINT_VERSION
            )));
        }
        if checkpoint.committed.len() != checkpoint.waves.len() {
            return Err(EngineError::StructureFactorMismatch {
                trial: checkpoint.committed.len(),
                expected: checkpoint.waves.len(),
            });
        }
        Ok(Ewald::from_parts(
            checkpoint.config,
            checkpoint.params,
            checkpoint.waves,
            checkpoint.eik,
            checkpoint.committed,
            checkpoint.committed_energy,
        ))
    }

    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        let bytes = self.to_bytes()?;
        fs::write(path, &bytes)
            .map_err(|e| EngineError::Checkpoint(format!("{}: {}", path.display(), e)))?;
        info!("Wrote checkpoint ({} bytes) to {}", bytes.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let bytes = fs::read(path)
            .map_err(|e| EngineError::Checkpoint(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::select::{Select, TrialState};
    use crate::engine::config::EwaldConfigBuilder;
    use crate::testing::spce_configuration;
    use nalgebra::Vector3;
    use tempfile::tempdir;

    fn committed_engine() -> (crate::core::models::configuration::Configuration, Ewald) {
        let configuration = spce_configuration(20, 15.0);
        let config = EwaldConfigBuilder::new()
            .alpha(0.35)
            .kmax_squared(12)
            .build()
            .unwrap();
        let mut ewald = Ewald::new(config);
        ewald.precompute(&configuration).unwrap();
        ewald.compute(&configuration, 0).unwrap();
        ewald.finalize().unwrap();
        (configuration, ewald)
    }

    #[test]
    fn restored_engine_matches_bit_for_bit() {
        let (configuration, ewald) = committed_engine();
        let restored = Ewald::from_bytes(&ewald.to_bytes().unwrap()).unwrap();

        assert_eq!(restored.stored_energy().to_bits(), ewald.stored_energy().to_bits());
        assert_eq!(restored.struct_fact_real(), ewald.struct_fact_real());
        assert_eq!(restored.struct_fact_imag(), ewald.struct_fact_imag());
        assert_eq!(restored.wave_vectors(), ewald.wave_vectors());
        assert_eq!(restored.basis(), ewald.basis());
        assert_eq!(restored.params(), ewald.params());
        assert_eq!(restored.config(), ewald.config());
        assert_eq!(restored.eik(7, 2), ewald.eik(7, 2));
        restored.check(&configuration).unwrap();
    }

    #[test]
    fn restored_engine_continues_the_trial_protocol() {
        let (mut configuration, mut ewald) = committed_engine();
        let mut restored = Ewald::from_bytes(&ewald.to_bytes().unwrap()).unwrap();

        configuration
            .displace_particle(4, &Vector3::new(0.3, -0.8, 1.1))
            .unwrap();
        let mut select = Select::new().with_trial_state(TrialState::NewPosition);
        select.add_particle(4, vec![0, 1, 2]);
        let original = ewald.compute_selection(&select, &configuration, 0).unwrap();
        let resumed = restored.compute_selection(&select, &configuration, 0).unwrap();
        assert_eq!(original.to_bits(), resumed.to_bits());
    }

    #[test]
    fn save_and_load_through_a_file() {
        let (_, ewald) = committed_engine();
        let dir = tempdir().unwrap();
        let path = dir.path().join("ewald.ckpt");
        ewald.save(&path).unwrap();
        let loaded = Ewald::load(&path).unwrap();
        assert_eq!(loaded.stored_energy().to_bits(), ewald.stored_energy().to_bits());
        assert!(!loaded.has_pending_trial());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let (_, ewald) = committed_engine();
        let mut bytes = ewald.to_bytes().unwrap();
        // The leading varint is the version.
        bytes[0] = 99;
        assert!(matches!(
            Ewald::from_bytes(&bytes),
            Err(EngineError::Checkpoint(message)) if message.contains("version 99")
        ));
    }

    #[test]
    fn engine_without_state_cannot_be_saved() {
        let config = EwaldConfigBuilder::new()
            .alpha(0.3)
            .kmax_squared(9)
            .build()
            .unwrap();
        assert!(matches!(
            Ewald::new(config).to_bytes(),
            Err(EngineError::NotPrecomputed)
        ));
    }

    #[test]
    fn truncated_bytes_are_rejected() {
        let (_, ewald) = committed_engine();
        let bytes = ewald.to_bytes().unwrap();
        assert!(matches!(
            Ewald::from_bytes(&bytes[..bytes.len() / 2]),
            Err(EngineError::Checkpoint(_))
        ));
    }
}
