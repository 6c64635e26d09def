use bincode::{Decode, Encode};

/// Packing of one site's `exp(i k·r)` row.
///
/// A row stores, in order, the real parts along x, y and z followed by the
/// imaginary parts along x, y and z. The x block covers `k ∈ [0, kxmax]`; the
/// y and z blocks cover `[-kmax, kmax]` and are addressed relative to their
/// `k = 0` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct EikLayout {
    kxmax: i32,
    kymax: i32,
    kzmax: i32,
}

impl EikLayout {
    pub fn new(kxmax: i32, kymax: i32, kzmax: i32) -> Self {
        Self {
            kxmax,
            kymax,
            kzmax,
        }
    }

    pub fn row_len(&self) -> usize {
        let num_kx = self.kxmax as usize + 1;
        let num_ky = 2 * self.kymax as usize + 1;
        let num_kz = 2 * self.kzmax as usize + 1;
        2 * (num_kx + num_ky + num_kz)
    }

    #[inline]
    pub fn rx0(&self) -> usize {
        0
    }
    #[inline]
    pub fn ry0(&self) -> usize {
        self.rx0() + (self.kxmax + self.kymax + 1) as usize
    }
    #[inline]
    pub fn rz0(&self) -> usize {
        self.ry0() + (self.kymax + self.kzmax + 1) as usize
    }
    #[inline]
    pub fn ix0(&self) -> usize {
        self.rz0() + (self.kzmax + 1) as usize
    }
    #[inline]
    pub fn iy0(&self) -> usize {
        self.ix0() + (self.kxmax + self.kymax + 1) as usize
    }
    #[inline]
    pub fn iz0(&self) -> usize {
        self.iy0() + (self.kymax + self.kzmax + 1) as usize
    }

    /// Fills `row` from the projections `(u·r, v·r, w·r)` of a site position.
    ///
    /// `k = ±1` is evaluated directly; larger `|k|` follow from angle addition,
    /// and negative `k` from conjugation.
    pub fn compute_row(&self, dots: [f64; 3], row: &mut [f64]) {
        debug_assert_eq!(row.len(), self.row_len());
        let axes = [
            (self.rx0(), self.ix0(), self.kxmax, false),
            (self.ry0(), self.iy0(), self.kymax, true),
            (self.rz0(), self.iz0(), self.kzmax, true),
        ];
        for ((r0, i0, kmax, mirror), theta) in axes.into_iter().zip(dots) {
            row[r0] = 1.0;
            row[i0] = 0.0;
            if kmax < 1 {
                continue;
            }
            let (c1, s1) = (theta.cos(), theta.sin());
            row[r0 + 1] = c1;
            row[i0 + 1] = s1;
            for k in 2..=kmax as usize {
                let (cp, sp) = (row[r0 + k - 1], row[i0 + k - 1]);
                row[r0 + k] = cp * c1 - sp * s1;
                row[i0 + k] = cp * s1 + sp * c1;
            }
            if mirror {
                for k in 1..=kmax as usize {
                    row[r0 - k] = row[r0 + k];
                    row[i0 - k] = -row[i0 + k];
                }
            }
        }
    }

    /// Real and imaginary parts of `exp(i k·r)` for wave vector `(kx, ky, kz)`,
    /// as the complex product of the three per-axis factors stored in `row`.
    #[inline]
    pub fn factor(&self, row: &[f64], kx: i32, ky: i32, kz: i32) -> (f64, f64) {
        let at = |zero: usize, k: i32| row[(zero as i64 + k as i64) as usize];
        let (rx, ix) = (at(self.rx0(), kx), at(self.ix0(), kx));
        let (ry, iy) = (at(self.ry0(), ky), at(self.iy0(), ky));
        let (rz, iz) = (at(self.rz0(), kz), at(self.iz0(), kz));
        let real = rx * ry * rz - ix * iy * rz - ix * ry * iz - rx * iy * iz;
        let imag = -ix * iy * iz + rx * ry * iz + rx * iy * rz + ix * ry * rz;
        (real, imag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
struct EikSlot {
    start: usize,
    num_sites: usize,
}

/// Committed eik rows for every particle slot, stored in one flat buffer.
///
/// Each particle slot owns a contiguous run of rows. A slot keeps its run when
/// the particle is removed and later reused; a new run is appended only if a
/// reused slot needs more sites than it had.
#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
pub struct EikTable {
    layout: EikLayout,
    data: Vec<f64>,
    slots: Vec<Option<EikSlot>>,
}

impl EikTable {
    pub fn new(layout: EikLayout) -> Self {
        Self {
            layout,
            data: Vec::new(),
            slots: Vec::new(),
        }
    }

    pub fn layout(&self) -> &EikLayout {
        &self.layout
    }

    /// Number of particle slots that have rows.
    pub fn num_particles(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn row(&self, particle: usize, site: usize) -> Option<&[f64]> {
        let slot = self.slots.get(particle).copied().flatten()?;
        if site >= slot.num_sites {
            return None;
        }
        let len = self.layout.row_len();
        let start = slot.start + site * len;
        Some(&self.data[start..start + len])
    }

    /// Makes room for `num_sites` rows in a particle slot.
    pub fn reserve_particle(&mut self, particle: usize, num_sites: usize) {
        if particle >= self.slots.len() {
            self.slots.resize(particle + 1, None);
        }
        if let Some(slot) = self.slots[particle] {
            if slot.num_sites >= num_sites {
                return;
            }
        }
        let len = self.layout.row_len();
        let start = self.data.len();
        self.data.resize(start + num_sites * len, 0.0);
        if let Some(old) = self.slots[particle] {
            self.data
                .copy_within(old.start..old.start + old.num_sites * len, start);
        }
        self.slots[particle] = Some(EikSlot { start, num_sites });
    }

    /// Overwrites one row, reserving space for it first if needed.
    pub fn set_row(&mut self, particle: usize, site: usize, values: &[f64], num_sites: usize) {
        self.reserve_particle(particle, num_sites.max(site + 1));
        let len = self.layout.row_len();
        if let Some(slot) = self.slots[particle] {
            let start = slot.start + site * len;
            self.data[start..start + len].copy_from_slice(values);
        }
    }
}
