use super::configuration::ConfigurationError;
use nalgebra::Vector3;

/// A periodic simulation cell.
///
/// The cell is described by three side lengths and the three tilt factors of
/// an upper-triangular box matrix (`xy`, `xz`, `yz`). With all tilts at zero
/// the cell is orthorhombic.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    side_lengths: Vector3<f64>,
    xy: f64,
    xz: f64,
    yz: f64,
}

impl Domain {
    /// Creates an orthorhombic cell.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidSideLength`] if any length is not
    /// strictly positive and finite.
    pub fn new(lx: f64, ly: f64, lz: f64) -> Result<Self, ConfigurationError> {
        let side_lengths = Vector3::new(lx, ly, lz);
        validate_side_lengths(&side_lengths)?;
        Ok(Self {
            side_lengths,
            xy: 0.0,
            xz: 0.0,
            yz: 0.0,
        })
    }

    /// Creates a cubic cell of the given side length.
    pub fn cubic(side_length: f64) -> Result<Self, ConfigurationError> {
        Self::new(side_length, side_length, side_length)
    }

    /// Returns this cell with the given tilt factors.
    pub fn with_tilts(mut self, xy: f64, xz: f64, yz: f64) -> Self {
        self.xy = xy;
        self.xz = xz;
        self.yz = yz;
        self
    }

    pub fn side_lengths(&self) -> &Vector3<f64> {
        &self.side_lengths
    }

    /// Side length along dimension `dim` (0, 1 or 2).
    pub fn side_length(&self, dim: usize) -> f64 {
        self.side_lengths[dim]
    }

    pub fn set_side_lengths(&mut self, side_lengths: Vector3<f64>) -> Result<(), ConfigurationError> {
        validate_side_lengths(&side_lengths)?;
        self.side_lengths = side_lengths;
        Ok(())
    }

    pub fn xy(&self) -> f64 {
        self.xy
    }

    pub fn xz(&self) -> f64 {
        self.xz
    }

    pub fn yz(&self) -> f64 {
        self.yz
    }

    /// Cell volume. Tilting an upper-triangular box does not change its volume.
    pub fn volume(&self) -> f64 {
        self.side_lengths.x * self.side_lengths.y * self.side_lengths.z
    }

    pub fn min_side_length(&self) -> f64 {
        self.side_lengths
            .x
            .min(self.side_lengths.y)
            .min(self.side_lengths.z)
    }

    pub fn is_orthogonal(&self) -> bool {
        self.xy == 0.0 && self.xz == 0.0 && self.yz == 0.0
    }

    pub fn is_cubic(&self) -> bool {
        self.is_orthogonal()
            && self.side_lengths.x == self.side_lengths.y
            && self.side_lengths.y == self.side_lengths.z
    }
}

fn validate_side_lengths(side_lengths: &Vector3<f64>) -> Result<(), ConfigurationError> {
    for (dim, &length) in side_lengths.iter().enumerate() {
        if !(length.is_finite() && length > 0.0) {
            return Err(ConfigurationError::InvalidSideLength { dim, length });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_domain_reports_cubic_and_volume() {
        let domain = Domain::cubic(20.0).unwrap();
        assert!(domain.is_cubic());
        assert!(domain.is_orthogonal());
        assert_eq!(domain.volume(), 8000.0);
        assert_eq!(domain.min_side_length(), 20.0);
    }

    #[test]
    fn tilted_domain_is_not_cubic_but_keeps_volume() {
        let domain = Domain::cubic(10.0).unwrap().with_tilts(1.0, 0.0, 0.5);
        assert!(!domain.is_cubic());
        assert!(!domain.is_orthogonal());
        assert_eq!(domain.volume(), 1000.0);
    }

    #[test]
    fn rectangular_domain_uses_smallest_side() {
        let domain = Domain::new(10.0, 12.0, 8.0).unwrap();
        assert!(!domain.is_cubic());
        assert_eq!(domain.min_side_length(), 8.0);
        assert_eq!(domain.side_length(1), 12.0);
    }

    #[test]
    fn non_positive_side_length_is_rejected() {
        let err = Domain::new(10.0, 0.0, 8.0).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidSideLength { dim: 1, .. }
        ));
        assert!(Domain::cubic(f64::NAN).is_err());
    }
}
