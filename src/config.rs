use std::path::PathBuf;

use crate::error::ConfigError;
use crate::grid::CELL_SIZE;
use crate::wall::WALL_INSET;

/// Parameters of a single run. Parsing these from files or flags is a
/// front-end concern; the engine consumes the plain struct.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub ndim: usize,
    pub num_balls: usize,
    pub ball_radius: f64,
    pub domain_size: Vec<f64>,
    pub simulation_time: f64,
    pub gravity: bool,
    pub ball_restitution: f64,
    pub wall_restitution: f64,
    pub output_rate: f64,
    pub output_dir: PathBuf,
    pub random_seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            ndim: 2,
            num_balls: 0,
            ball_radius: 0.4,
            domain_size: vec![10., 10.],
            simulation_time: 10.,
            gravity: false,
            ball_restitution: 1.,
            wall_restitution: 1.,
            output_rate: 1.,
            output_dir: PathBuf::from("output"),
            random_seed: 100,
        }
    }
}

impl RunConfig {
    /// Cells fully contained in the domain, per axis.
    pub fn cells_per_axis(&self) -> Vec<i64> {
        self.domain_size
            .iter()
            .map(|&size| (size / CELL_SIZE).floor() as i64)
            .collect()
    }

    /// How many balls the one-per-cell placement can hold.
    pub fn interior_cells(&self) -> usize {
        self.cells_per_axis()
            .iter()
            .map(|&n| n.max(0) as usize)
            .product()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ndim != 2 && self.ndim != 3 {
            return Err(ConfigError::BadDimension(self.ndim));
        }
        if self.domain_size.len() != self.ndim {
            return Err(ConfigError::DomainArity {
                ndim: self.ndim,
                got: self.domain_size.len(),
            });
        }
        if !(self.ball_radius > 0. && self.ball_radius <= 0.5) {
            return Err(ConfigError::BadRadius(self.ball_radius));
        }
        if 2. * self.ball_radius >= CELL_SIZE {
            return Err(ConfigError::DiameterExceedsCell {
                diameter: 2. * self.ball_radius,
                cell: CELL_SIZE,
            });
        }
        for (axis, &size) in self.domain_size.iter().enumerate() {
            if !(size > 2. * WALL_INSET) {
                return Err(ConfigError::DomainTooSmall {
                    axis,
                    size,
                    min: 2. * WALL_INSET,
                });
            }
        }
        if !(self.simulation_time > 0.) {
            return Err(ConfigError::BadDuration(self.simulation_time));
        }
        if !(self.output_rate > 0.) {
            return Err(ConfigError::BadOutputRate(self.output_rate));
        }
        for &restitution in &[self.ball_restitution, self.wall_restitution] {
            if !(restitution > 0. && restitution <= 1.) {
                return Err(ConfigError::BadRestitution(restitution));
            }
        }
        if self.num_balls > self.interior_cells() {
            return Err(ConfigError::TooManyBalls {
                requested: self.num_balls,
                capacity: self.interior_cells(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RunConfig {
        RunConfig {
            num_balls: 4,
            domain_size: vec![6., 3.],
            ..RunConfig::default()
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(base().validate().is_ok());
        assert_eq!(base().interior_cells(), 18);
    }

    #[test]
    fn rejects_bad_dimension() {
        let config = RunConfig {
            ndim: 4,
            ..base()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadDimension(4))
        ));
    }

    #[test]
    fn rejects_domain_arity_mismatch() {
        let config = RunConfig {
            ndim: 3,
            ..base()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DomainArity { ndim: 3, got: 2 })
        ));
    }

    #[test]
    fn rejects_oversized_radius() {
        let config = RunConfig {
            ball_radius: 0.6,
            ..base()
        };
        assert!(matches!(config.validate(), Err(ConfigError::BadRadius(_))));
        // r = 0.5 passes the radius bound but violates 2r < s.
        let config = RunConfig {
            ball_radius: 0.5,
            ..base()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DiameterExceedsCell { .. })
        ));
    }

    #[test]
    fn rejects_sliver_domain() {
        let config = RunConfig {
            num_balls: 0,
            domain_size: vec![6., 0.015],
            ..base()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DomainTooSmall { axis: 1, .. })
        ));
    }

    #[test]
    fn rejects_overfull_placement() {
        let config = RunConfig {
            num_balls: 19,
            ..base()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooManyBalls {
                requested: 19,
                capacity: 18
            })
        ));
    }

    #[test]
    fn rejects_nonpositive_rates() {
        let config = RunConfig {
            simulation_time: 0.,
            ..base()
        };
        assert!(matches!(config.validate(), Err(ConfigError::BadDuration(_))));
        let config = RunConfig {
            output_rate: -1.,
            ..base()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadOutputRate(_))
        ));
        let config = RunConfig {
            ball_restitution: 0.,
            ..base()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadRestitution(_))
        ));
    }
}
