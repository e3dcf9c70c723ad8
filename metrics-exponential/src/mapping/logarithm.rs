use std::f64::consts::{LN_2, LOG2_E};

use super::{
    normal_base2, significand, Mapping, MAX_NORMAL_EXPONENT, MAX_SCALE, MIN_NORMAL_EXPONENT,
};
use crate::error::MappingError;

/// Smallest scale supported by [`LogarithmMapping`].
pub const LOGARITHM_MIN_SCALE: i32 = 1;

/// Maps values to buckets with the natural logarithm.
///
/// The index of a value is `floor(log_base(value))`, computed as `ln(value) * scale_factor` where
/// `scale_factor = 2^scale / ln(2)`.  The logarithm is not exact, so values sitting exactly on a
/// bucket boundary may land in the bucket below.  Exact powers of two are special-cased since
/// their index can be computed without any rounding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogarithmMapping {
    scale: i32,
    scale_factor: f64,
    inverse_factor: f64,
}

impl LogarithmMapping {
    /// Creates a new [`LogarithmMapping`] for the given scale.
    ///
    /// # Errors
    ///
    /// If `scale` is smaller than one, or larger than [`MAX_SCALE`], an error is returned.
    pub fn new(scale: i32) -> Result<LogarithmMapping, MappingError> {
        if !(LOGARITHM_MIN_SCALE..=MAX_SCALE).contains(&scale) {
            return Err(MappingError::ScaleOutOfRange {
                scale,
                min: LOGARITHM_MIN_SCALE,
                max: MAX_SCALE,
            });
        }

        let buckets_per_power = 2f64.powi(scale);
        Ok(LogarithmMapping {
            scale,
            scale_factor: LOG2_E * buckets_per_power,
            inverse_factor: LN_2 / buckets_per_power,
        })
    }

    fn min_normal_lower_boundary_index(&self) -> i32 {
        MIN_NORMAL_EXPONENT << self.scale
    }

    fn max_normal_lower_boundary_index(&self) -> i32 {
        ((MAX_NORMAL_EXPONENT + 1) << self.scale) - 1
    }
}

impl Mapping for LogarithmMapping {
    fn map_to_index(&self, value: f64) -> i32 {
        if value <= f64::MIN_POSITIVE {
            return self.min_normal_lower_boundary_index();
        }

        if significand(value) == 0 {
            return normal_base2(value) << self.scale;
        }

        let index = (value.ln() * self.scale_factor).floor() as i32;

        // Rounding can push values near f64::MAX one bucket past the last boundary.
        index.min(self.max_normal_lower_boundary_index())
    }

    fn lower_boundary(&self, index: i32) -> Result<f64, MappingError> {
        let max = self.max_normal_lower_boundary_index();
        if index >= max {
            if index == max {
                // exp(index * inverse_factor) overflows to infinity here, so compute the boundary
                // of the bucket one power of two lower and double it.
                return Ok(2.0 * ((index - (1 << self.scale)) as f64 * self.inverse_factor).exp());
            }
            return Err(MappingError::Overflow);
        }

        let min = self.min_normal_lower_boundary_index();
        if index <= min {
            if index == min {
                return Ok(f64::MIN_POSITIVE);
            } else if index >= min - (1 << self.scale) {
                // Subnormal boundaries lose precision through exp(), so compute the boundary one
                // power of two higher and halve it.
                return Ok(((index + (1 << self.scale)) as f64 * self.inverse_factor).exp() / 2.0);
            }
            return Err(MappingError::Underflow);
        }

        Ok((index as f64 * self.inverse_factor).exp())
    }

    fn scale(&self) -> i32 {
        self.scale
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_invalid_scales() {
        assert!(LogarithmMapping::new(0).is_err());
        assert!(LogarithmMapping::new(MAX_SCALE + 1).is_err());
        assert!(LogarithmMapping::new(LOGARITHM_MIN_SCALE).is_ok());
        assert!(LogarithmMapping::new(MAX_SCALE).is_ok());
    }

    #[test]
    fn test_scale_one() {
        let m = LogarithmMapping::new(1).unwrap();
        assert_eq!(m.scale(), 1);

        let cases = &[
            (1.0, 0),
            (1.4, 0),
            (1.5, 1),
            (2.0, 2),
            (3.0, 3),
            (4.0, 4),
            (0.5, -2),
            (0.7, -2),
            (0.75, -1),
        ];

        for (value, expected) in cases {
            assert_eq!(m.map_to_index(*value), *expected, "value {}", value);
        }
    }

    #[test]
    fn test_powers_of_two_are_exact() {
        for scale in LOGARITHM_MIN_SCALE..=MAX_SCALE {
            let m = LogarithmMapping::new(scale).unwrap();
            for exponent in [-1022, -100, -1, 0, 1, 100, 1023] {
                let value = 2f64.powi(exponent);
                assert_eq!(m.map_to_index(value), exponent << scale);
            }
        }
    }

    #[test]
    fn test_extreme_values() {
        for scale in LOGARITHM_MIN_SCALE..=MAX_SCALE {
            let m = LogarithmMapping::new(scale).unwrap();
            let max = m.max_normal_lower_boundary_index();
            let min = m.min_normal_lower_boundary_index();

            assert_eq!(m.map_to_index(f64::MAX), max);
            assert_eq!(m.map_to_index(f64::MIN_POSITIVE), min);
            assert_eq!(m.map_to_index(f64::from_bits(1)), min);

            let top = m.lower_boundary(max).unwrap();
            assert!(top.is_finite());
            assert!(top < f64::MAX);
            assert_eq!(m.lower_boundary(max + 1), Err(MappingError::Overflow));

            assert_eq!(m.lower_boundary(min), Ok(f64::MIN_POSITIVE));
            let below = m.lower_boundary(min - 1).unwrap();
            assert!(below > 0.0 && below < f64::MIN_POSITIVE);
            assert!(m.lower_boundary(min - (1 << scale)).unwrap() > 0.0);
            assert_eq!(m.lower_boundary(min - (1 << scale) - 1), Err(MappingError::Underflow));
        }
    }

    #[test]
    fn test_lower_boundary_values() {
        let m = LogarithmMapping::new(1).unwrap();
        assert_relative_eq!(m.lower_boundary(0).unwrap(), 1.0);
        assert_relative_eq!(m.lower_boundary(1).unwrap(), std::f64::consts::SQRT_2);
        assert_relative_eq!(m.lower_boundary(2).unwrap(), 2.0);
        assert_relative_eq!(m.lower_boundary(-1).unwrap(), std::f64::consts::FRAC_1_SQRT_2);
    }

    #[test]
    fn test_round_trip_tolerance() {
        for scale in LOGARITHM_MIN_SCALE..=MAX_SCALE {
            let m = LogarithmMapping::new(scale).unwrap();
            let min = m.min_normal_lower_boundary_index();
            let max = m.max_normal_lower_boundary_index();

            // Walk the whole index range in roughly 100k steps, plus the edges.
            let step = ((max as i64 - min as i64) / 100_000).max(1) as usize;
            let indices = (min..=max).step_by(step).chain([min, min + 1, max - 1, max]);

            for index in indices {
                let boundary = m.lower_boundary(index).unwrap();
                let mapped = m.map_to_index(boundary);
                assert!(
                    mapped == index || mapped == index - 1,
                    "scale {} index {} boundary {} mapped to {}",
                    scale,
                    index,
                    boundary,
                    mapped
                );
            }
        }
    }

    #[test]
    fn test_monotonic() {
        let m = LogarithmMapping::new(8).unwrap();

        let mut value = 1e-300;
        let mut last = m.map_to_index(value);
        while value < 1e300 {
            value *= 1.001;
            let index = m.map_to_index(value);
            assert!(index >= last, "index went from {} to {} at {}", last, index, value);
            last = index;
        }
    }
}
