use crate::core::constants::PhysicalConstants;
use crate::core::models::configuration::Configuration;
use crate::core::models::domain::Domain;
use crate::core::models::params::ModelParams;
use crate::core::models::particle::ParticleType;
use crate::engine::wave_vectors::ReciprocalBasis;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

pub const SPCE_OXYGEN_CHARGE: f64 = -0.8476;
pub const SPCE_HYDROGEN_CHARGE: f64 = 0.4238;

pub fn spce_particle_type(params: &mut ModelParams) -> ParticleType {
    let o = params.add_site_type("O", SPCE_OXYGEN_CHARGE);
    let h = params.add_site_type("H", SPCE_HYDROGEN_CHARGE);
    ParticleType::new("spce")
        .with_site(o, [0.0, 0.0, 0.0])
        .with_site(h, [1.0, 0.0, 0.0])
        .with_site(h, [-0.333313247568237, 0.942816142731718, 0.0])
}

/// Rigid SPC/E waters at random positions in a cubic box, cutoff 10.
pub fn spce_configuration(num_molecules: usize, side: f64) -> Configuration {
    let mut params = ModelParams::new(10.0, PhysicalConstants::default());
    let water = spce_particle_type(&mut params);
    let mut config = Configuration::new(Domain::cubic(side).unwrap(), params);
    config.add_particle_type(water).unwrap();
    let mut rng = StdRng::seed_from_u64(0x5bce);
    for _ in 0..num_molecules {
        let index = config.add_particle_of_type(0).unwrap();
        let shift = random_vector(&mut rng, side);
        config.displace_particle(index, &shift).unwrap();
    }
    config
}

/// `num_pairs` Na⁺/Cl⁻ ions at random positions in a cubic box.
/// Particle type 0 is the cation, type 1 the anion.
pub fn salt_configuration(num_pairs: usize, side: f64, seed: u64) -> Configuration {
    let mut params = ModelParams::new(0.4 * side, PhysicalConstants::default());
    let na = params.add_site_type("Na", 1.0);
    let cl = params.add_site_type("Cl", -1.0);
    let mut config = Configuration::new(Domain::cubic(side).unwrap(), params);
    config
        .add_particle_type(ParticleType::new("Na").with_site(na, [0.0; 3]))
        .unwrap();
    config
        .add_particle_type(ParticleType::new("Cl").with_site(cl, [0.0; 3]))
        .unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..num_pairs {
        for type_index in 0..2 {
            let index = config.add_particle_of_type(type_index).unwrap();
            let shift = random_vector(&mut rng, side);
            config.displace_particle(index, &shift).unwrap();
        }
    }
    config
}

pub fn random_vector(rng: &mut StdRng, scale: f64) -> Vector3<f64> {
    Vector3::new(
        rng.gen_range(0.0..scale),
        rng.gen_range(0.0..scale),
        rng.gen_range(0.0..scale),
    )
}

/// Reciprocal energy by direct evaluation of `exp(i k·r)` over the full
/// `k ≠ 0` sphere, without half-space folding or recursion.
pub fn brute_force_energy(
    config: &Configuration,
    alpha: f64,
    kmax_squared: f64,
    kmax: [i32; 3],
) -> f64 {
    let basis = ReciprocalBasis::from_domain(config.domain());
    let volume = config.domain().volume();
    let params = config.model_params();
    let mut energy = 0.0;
    for kx in -kmax[0]..=kmax[0] {
        for ky in -kmax[1]..=kmax[1] {
            for kz in -kmax[2]..=kmax[2] {
                let k = basis.kvec(kx, ky, kz);
                let k_sq = k.norm_squared();
                if !(k_sq > 1e-15 && k_sq < kmax_squared) {
                    continue;
                }
                let (mut re, mut im) = (0.0, 0.0);
                for site in config.physical_sites() {
                    let phase = k.dot(&site.position.coords);
                    let q = params.charge(site.site_type);
                    re += q * phase.cos();
                    im += q * phase.sin();
                }
                energy += 2.0 * PI / volume * (-k_sq / (4.0 * alpha * alpha)).exp() / k_sq
                    * (re * re + im * im);
            }
        }
    }
    params.charge_conversion() * energy
}
