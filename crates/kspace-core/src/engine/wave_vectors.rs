use super::error::EngineError;
use crate::core::models::domain::Domain;
use bincode::{Decode, Encode};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;
use tracing::debug;

/// Squared wave numbers at or below this are treated as the excluded `k = 0` term.
const NEAR_ZERO: f64 = 1e-15;

/// Reciprocal basis of an upper-triangular box matrix.
///
/// `u`, `v` and `w` are the reciprocal lattice vectors; by construction `v`
/// has no x component and `w` has only a z component.
#[derive(Debug, Clone, Copy, PartialEq, Default, Encode, Decode)]
pub struct ReciprocalBasis {
    pub ux: f64,
    pub uy: f64,
    pub uz: f64,
    pub vy: f64,
    pub vz: f64,
    pub wz: f64,
}

impl ReciprocalBasis {
    pub fn from_domain(domain: &Domain) -> Self {
        let lx = domain.side_length(0);
        let ly = domain.side_length(1);
        let lz = domain.side_length(2);
        let (xy, xz, yz) = (domain.xy(), domain.xz(), domain.yz());
        Self {
            ux: 2.0 * PI / lx,
            uy: 2.0 * PI * (-xy) / lx / ly,
            uz: 2.0 * PI * (xy * yz - ly * xz) / lx / ly / lz,
            vy: 2.0 * PI / ly,
            vz: 2.0 * PI * (-yz) / ly / lz,
            wz: 2.0 * PI / lz,
        }
    }

    /// Cartesian wave vector for the integer indices `(kx, ky, kz)`.
    #[inline]
    pub fn kvec(&self, kx: i32, ky: i32, kz: i32) -> Vector3<f64> {
        let (kx, ky, kz) = (kx as f64, ky as f64, kz as f64);
        Vector3::new(
            kx * self.ux,
            kx * self.uy + ky * self.vy,
            kx * self.uz + ky * self.vz + kz * self.wz,
        )
    }

    /// Projections `(u·r, v·r, w·r)` of a position onto the reciprocal basis.
    #[inline]
    pub fn dots(&self, r: &Point3<f64>) -> [f64; 3] {
        [
            self.ux * r.x + self.uy * r.y + self.uz * r.z,
            self.vy * r.y + self.vz * r.z,
            self.wz * r.z,
        ]
    }
}

/// One reciprocal lattice vector in the `kx >= 0` half space and its damped prefactor.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub struct WaveVector {
    pub kx: i32,
    pub ky: i32,
    pub kz: i32,
    pub prefactor: f64,
}

impl WaveVector {
    /// Integer index along dimension `dim`, or `None` if `dim` is not 0, 1 or 2.
    pub fn index(&self, dim: usize) -> Option<i32> {
        match dim {
            0 => Some(self.kx),
            1 => Some(self.ky),
            2 => Some(self.kz),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
pub struct WaveVectorSet {
    vectors: Vec<WaveVector>,
    basis: ReciprocalBasis,
    kmax_squared: f64,
}

impl WaveVectorSet {
    /// Enumerates every lattice vector with `0 < k² < kmax_squared` inside the
    /// index box `[0, kxmax] × [-kymax, kymax] × [-kzmax, kzmax]`.
    ///
    /// Vectors with `kx != 0` stand in for their `-k` partners as well, so their
    /// prefactor is doubled.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoWaveVectors`] if nothing passes the cutoff.
    pub fn generate(
        domain: &Domain,
        alpha: f64,
        kmax_squared: f64,
        kxmax: i32,
        kymax: i32,
        kzmax: i32,
    ) -> Result<Self, EngineError> {
        let basis = ReciprocalBasis::from_domain(domain);
        let volume = domain.volume();
        let mut vectors = Vec::new();
        for kx in 0..=kxmax {
            for ky in -kymax..=kymax {
                for kz in -kzmax..=kzmax {
                    let k_sq = basis.kvec(kx, ky, kz).norm_squared();
                    if k_sq < kmax_squared && k_sq.abs() > NEAR_ZERO {
                        let factor = if kx != 0 { 2.0 } else { 1.0 };
                        let prefactor = 2.0 * PI * factor * (-k_sq / 4.0 / alpha / alpha).exp()
                            / k_sq
                            / volume;
                        vectors.push(WaveVector {
                            kx,
                            ky,
                            kz,
                            prefactor,
                        });
                    }
                }
            }
        }
        debug!("generated {} wave vectors", vectors.len());
        if vectors.is_empty() {
            return Err(EngineError::NoWaveVectors { kmax_squared });
        }
        Ok(Self {
            vectors,
            basis,
            kmax_squared,
        })
    }

    pub fn vectors(&self) -> &[WaveVector] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn basis(&self) -> &ReciprocalBasis {
        &self.basis
    }

    pub fn kmax_squared(&self) -> f64 {
        self.kmax_squared
    }
}
