use super::{
    normal_base2, power_of_two, Mapping, MAX_NORMAL_EXPONENT, MIN_NORMAL_EXPONENT, MIN_SCALE,
};
use crate::error::MappingError;

/// Largest scale supported by [`ExponentMapping`].
pub const EXPONENT_MAX_SCALE: i32 = 0;

/// Maps values to buckets by reading their base-2 exponent.
///
/// At scale zero, every power of two starts a new bucket, so the bucket index is the unbiased
/// exponent of the value.  At negative scales, `2^-scale` consecutive exponents share a bucket,
/// which is an arithmetic right shift of the exponent.  Right-shifting a two's complement
/// integer rounds towards negative infinity, exactly like the ideal mapping does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExponentMapping {
    shift: u32,
}

impl ExponentMapping {
    /// Creates a new [`ExponentMapping`] for the given scale.
    ///
    /// # Errors
    ///
    /// If `scale` is positive, or smaller than [`MIN_SCALE`], an error is returned.
    pub fn new(scale: i32) -> Result<ExponentMapping, MappingError> {
        if !(MIN_SCALE..=EXPONENT_MAX_SCALE).contains(&scale) {
            return Err(MappingError::ScaleOutOfRange {
                scale,
                min: MIN_SCALE,
                max: EXPONENT_MAX_SCALE,
            });
        }

        Ok(ExponentMapping { shift: scale.unsigned_abs() })
    }

    fn min_normal_lower_boundary_index(&self) -> i32 {
        MIN_NORMAL_EXPONENT >> self.shift
    }

    fn max_normal_lower_boundary_index(&self) -> i32 {
        MAX_NORMAL_EXPONENT >> self.shift
    }
}

impl Mapping for ExponentMapping {
    #[inline]
    fn map_to_index(&self, value: f64) -> i32 {
        normal_base2(value) >> self.shift
    }

    fn lower_boundary(&self, index: i32) -> Result<f64, MappingError> {
        if index < self.min_normal_lower_boundary_index() {
            return Err(MappingError::Underflow);
        }
        if index > self.max_normal_lower_boundary_index() {
            return Err(MappingError::Overflow);
        }

        // The lowest bucket of a coarse scale can start below the smallest normal value, in
        // which case the boundary is a subnormal power of two.
        Ok(power_of_two(index << self.shift))
    }

    fn scale(&self) -> i32 {
        -(self.shift as i32)
    }
}
