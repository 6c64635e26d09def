use crate::core::models::configuration::{Configuration, ConfigurationError};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Expected {expected} site lines but the file ended after {found}")]
    Truncated { expected: usize, found: usize },
    #[error("Cannot infer particles: {0}")]
    Inference(String),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// One frame of an XYZ coordinate file.
///
/// Line 1 holds the number of sites. Line 2 holds an identifier followed by the
/// three side lengths and, optionally, the `xy xz yz` tilt factors. Each remaining
/// line holds a site label and its Cartesian coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct XyzFrame {
    pub side_lengths: Vector3<f64>,
    pub tilts: Option<[f64; 3]>,
    pub labels: Vec<String>,
    pub positions: Vec<Point3<f64>>,
}

pub struct XyzFile;

const MAX_PREALLOCATED_SITES: usize = 4096;

fn parse_f64(token: Option<&str>, line: usize, what: &str) -> Result<f64, XyzError> {
    let token = token.ok_or_else(|| XyzError::Parse {
        line,
        message: format!("missing {}", what),
    })?;
    token.parse::<f64>().map_err(|_| XyzError::Parse {
        line,
        message: format!("invalid {} '{}'", what, token),
    })
}

impl XyzFile {
    pub fn read_from(reader: &mut impl BufRead) -> Result<XyzFrame, XyzError> {
        let mut lines = reader.lines();

        let header = lines.next().transpose()?.ok_or(XyzError::Parse {
            line: 1,
            message: "empty file".into(),
        })?;
        let num_sites: usize = header.trim().parse().map_err(|_| XyzError::Parse {
            line: 1,
            message: format!("invalid site count '{}'", header.trim()),
        })?;

        let cell = lines.next().transpose()?.ok_or(XyzError::Parse {
            line: 2,
            message: "missing cell line".into(),
        })?;
        let mut tokens = cell.split_whitespace().skip(1);
        let lx = parse_f64(tokens.next(), 2, "side length x")?;
        let ly = parse_f64(tokens.next(), 2, "side length y")?;
        let lz = parse_f64(tokens.next(), 2, "side length z")?;
        let tilts = match tokens.next() {
            None => None,
            Some(xy) => {
                let xy = parse_f64(Some(xy), 2, "tilt xy")?;
                let xz = parse_f64(tokens.next(), 2, "tilt xz")?;
                let yz = parse_f64(tokens.next(), 2, "tilt yz")?;
                Some([xy, xz, yz])
            }
        };

        // The header count is unchecked until the site lines are read.
        let capacity = num_sites.min(MAX_PREALLOCATED_SITES);
        let mut labels = Vec::with_capacity(capacity);
        let mut positions = Vec::with_capacity(capacity);
        for (offset, line_res) in lines.take(num_sites).enumerate() {
            let line = line_res?;
            let line_num = offset + 3;
            let mut tokens = line.split_whitespace();
            let label = tokens.next().ok_or_else(|| XyzError::Parse {
                line: line_num,
                message: "missing site label".into(),
            })?;
            let x = parse_f64(tokens.next(), line_num, "x coordinate")?;
            let y = parse_f64(tokens.next(), line_num, "y coordinate")?;
            let z = parse_f64(tokens.next(), line_num, "z coordinate")?;
            labels.push(label.to_string());
            positions.push(Point3::new(x, y, z));
        }
        if positions.len() != num_sites {
            return Err(XyzError::Truncated {
                expected: num_sites,
                found: positions.len(),
            });
        }

        Ok(XyzFrame {
            side_lengths: Vector3::new(lx, ly, lz),
            tilts,
            labels,
            positions,
        })
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<XyzFrame, XyzError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes the sites of every non-ghost particle, labelled by site type index.
    pub fn write_to(config: &Configuration, writer: &mut impl Write) -> Result<(), XyzError> {
        let num_sites: usize = config.particles_iter().map(|(_, p)| p.num_sites()).sum();
        let domain = config.domain();
        writeln!(writer, "{}", num_sites)?;
        write!(
            writer,
            "-1 {} {} {}",
            domain.side_length(0),
            domain.side_length(1),
            domain.side_length(2)
        )?;
        if !domain.is_orthogonal() {
            write!(writer, " {} {} {}", domain.xy(), domain.xz(), domain.yz())?;
        }
        writeln!(writer)?;
        for (_, particle) in config.particles_iter() {
            for site in particle.sites() {
                writeln!(
                    writer,
                    "{} {} {} {}",
                    site.site_type, site.position.x, site.position.y, site.position.z
                )?;
            }
        }
        Ok(())
    }

    pub fn write_to_path<P: AsRef<Path>>(config: &Configuration, path: P) -> Result<(), XyzError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(config, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl XyzFrame {
    /// Loads this frame into a configuration.
    ///
    /// The cell is resized to the frame. When the configuration has no particles,
    /// it is filled with copies of particle type 0, which must evenly divide the
    /// number of sites in the frame.
    pub fn apply_to(&self, config: &mut Configuration) -> Result<(), XyzError> {
        config.set_side_lengths(self.side_lengths)?;
        if let Some([xy, xz, yz]) = self.tilts {
            let domain = config.domain().clone().with_tilts(xy, xz, yz);
            config.set_domain(domain);
        }

        if config.num_particles() == 0 {
            let sites_per_particle = config
                .particle_types()
                .first()
                .map(|t| t.num_sites())
                .ok_or_else(|| {
                    XyzError::Inference("add a particle type before loading coordinates".into())
                })?;
            if sites_per_particle == 0 || self.positions.len() % sites_per_particle != 0 {
                return Err(XyzError::Inference(format!(
                    "{} sites cannot be split into particles of {} sites",
                    self.positions.len(),
                    sites_per_particle
                )));
            }
            for _ in 0..self.positions.len() / sites_per_particle {
                config.add_particle_of_type(0)?;
            }
        }

        config.update_positions(&self.positions)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::PhysicalConstants;
    use crate::core::models::domain::Domain;
    use crate::core::models::params::ModelParams;
    use crate::core::models::particle::ParticleType;
    use std::io::Cursor;

    fn dimer_config() -> Configuration {
        let mut params = ModelParams::new(5.0, PhysicalConstants::default());
        let plus = params.add_site_type("P", 1.0);
        let minus = params.add_site_type("M", -1.0);
        let mut config = Configuration::new(Domain::cubic(10.0).unwrap(), params);
        config
            .add_particle_type(
                ParticleType::new("dimer")
                    .with_site(plus, [0.0, 0.0, 0.0])
                    .with_site(minus, [1.0, 0.0, 0.0]),
            )
            .unwrap();
        config
    }

    const TWO_DIMERS: &str = "4\n-1 12 12 12\n0 0.5 0.5 0.5\n1 1.5 0.5 0.5\n0 -3 2 1\n1 -2 2 1\n";

    #[test]
    fn read_from_parses_cell_and_sites() {
        let frame = XyzFile::read_from(&mut Cursor::new(TWO_DIMERS)).unwrap();
        assert_eq!(frame.side_lengths, Vector3::new(12.0, 12.0, 12.0));
        assert!(frame.tilts.is_none());
        assert_eq!(frame.positions.len(), 4);
        assert_eq!(frame.positions[2], Point3::new(-3.0, 2.0, 1.0));
        assert_eq!(frame.labels[1], "1");
    }

    #[test]
    fn read_from_accepts_optional_tilts() {
        let text = "1\n-1 10 11 12 0.5 -0.25 1\nO 0 0 0\n";
        let frame = XyzFile::read_from(&mut Cursor::new(text)).unwrap();
        assert_eq!(frame.tilts, Some([0.5, -0.25, 1.0]));
    }

    #[test]
    fn truncated_file_is_rejected() {
        let text = "3\n-1 10 10 10\nO 0 0 0\n";
        let err = XyzFile::read_from(&mut Cursor::new(text)).unwrap_err();
        assert!(matches!(
            err,
            XyzError::Truncated {
                expected: 3,
                found: 1
            }
        ));
    }

    #[test]
    fn huge_site_count_is_reported_as_truncated() {
        let text = "100000000000000000\n-1 10 10 10\nO 0 0 0\n";
        let err = XyzFile::read_from(&mut Cursor::new(text)).unwrap_err();
        assert!(matches!(
            err,
            XyzError::Truncated {
                expected: 100000000000000000,
                found: 1
            }
        ));
    }

    #[test]
    fn malformed_coordinate_reports_line_number() {
        let text = "1\n-1 10 10 10\nO 0 zero 0\n";
        let err = XyzFile::read_from(&mut Cursor::new(text)).unwrap_err();
        assert!(matches!(err, XyzError::Parse { line: 3, .. }));
    }

    #[test]
    fn apply_to_fills_empty_configuration_with_first_particle_type() {
        let mut config = dimer_config();
        let frame = XyzFile::read_from(&mut Cursor::new(TWO_DIMERS)).unwrap();
        frame.apply_to(&mut config).unwrap();
        assert_eq!(config.num_particles(), 2);
        assert_eq!(config.domain().side_length(0), 12.0);
        assert_eq!(config.site(1, 1).unwrap().position, Point3::new(-2.0, 2.0, 1.0));
    }

    #[test]
    fn apply_to_rejects_indivisible_site_count() {
        let mut config = dimer_config();
        let text = "3\n-1 10 10 10\n0 0 0 0\n1 1 0 0\n0 2 0 0\n";
        let frame = XyzFile::read_from(&mut Cursor::new(text)).unwrap();
        assert!(matches!(
            frame.apply_to(&mut config),
            Err(XyzError::Inference(_))
        ));
    }

    #[test]
    fn write_then_read_preserves_positions_exactly() {
        let mut config = dimer_config();
        XyzFile::read_from(&mut Cursor::new(TWO_DIMERS))
            .unwrap()
            .apply_to(&mut config)
            .unwrap();
        config
            .set_site_position(0, 0, Point3::new(0.1 + 0.2, 1.0 / 3.0, -7.25))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.xyz");
        XyzFile::write_to_path(&config, &path).unwrap();
        let frame = XyzFile::read_from_path(&path).unwrap();

        assert_eq!(frame.positions[0], Point3::new(0.1 + 0.2, 1.0 / 3.0, -7.25));
        assert_eq!(frame.side_lengths, Vector3::new(12.0, 12.0, 12.0));
    }
}
