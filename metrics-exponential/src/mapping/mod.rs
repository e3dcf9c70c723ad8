//! Mapping of values to exponential bucket indices.
//!
//! Every mapping approximates the same ideal function: at a given `scale`, the boundaries between
//! buckets are the powers of `base = 2^(2^-scale)`, and bucket `index` covers the half-open range
//! `[base^index, base^(index + 1))`.  Two implementations exist because no single technique is
//! both exact and cheap across the whole scale range:
//!
//! - [`ExponentMapping`] covers scales `-10..=0`, where every boundary is a power of two and the
//!   index can be read directly out of the IEEE-754 exponent field.
//! - [`LogarithmMapping`] covers scales `1..=20`, where boundaries fall between powers of two and
//!   the index has to be computed with a natural logarithm.
//!
//! [`new_mapping`] picks the right one for a scale.
mod exponent;
pub use self::exponent::ExponentMapping;

mod logarithm;
pub use self::logarithm::LogarithmMapping;

use crate::error::MappingError;

/// Smallest supported scale.
///
/// At this scale, two buckets cover the entire range of positive `f64` values.
pub const MIN_SCALE: i32 = -10;

/// Largest supported scale.
pub const MAX_SCALE: i32 = 20;

/// Number of explicit significand bits in an `f64`.
pub(crate) const SIGNIFICAND_WIDTH: u32 = 52;

/// Mask of the significand bits of an `f64`.
pub(crate) const SIGNIFICAND_MASK: u64 = (1 << SIGNIFICAND_WIDTH) - 1;

/// Mask of the exponent bits of an `f64`.
pub(crate) const EXPONENT_MASK: u64 = ((1 << 11) - 1) << SIGNIFICAND_WIDTH;

/// Exponent bias of an `f64`.
pub(crate) const EXPONENT_BIAS: i32 = 1023;

/// Unbiased exponent of the smallest normal `f64`.
pub(crate) const MIN_NORMAL_EXPONENT: i32 = -EXPONENT_BIAS + 1;

/// Unbiased exponent of the largest finite `f64`.
pub(crate) const MAX_NORMAL_EXPONENT: i32 = EXPONENT_BIAS;

/// Unbiased exponent of the smallest subnormal `f64`.
pub(crate) const MIN_SUBNORMAL_EXPONENT: i32 = MIN_NORMAL_EXPONENT - SIGNIFICAND_WIDTH as i32;

/// Maps positive values to bucket indices at a fixed scale.
///
/// Implementations are immutable once constructed and can be shared freely between threads.
pub trait Mapping {
    /// Maps a positive, finite value to the index of the bucket containing it.
    ///
    /// The result is non-decreasing in `value`.  Callers must not pass zero, negative values,
    /// infinities or NaN.
    fn map_to_index(&self, value: f64) -> i32;

    /// Gets the smallest value contained in the bucket at `index`.
    ///
    /// Because the forward mapping rounds, `map_to_index(lower_boundary(index))` is either `index`
    /// or `index - 1`.
    ///
    /// # Errors
    ///
    /// If the boundary is smaller than the smallest representable boundary, or larger than
    /// `f64::MAX`, [`MappingError::Underflow`] or [`MappingError::Overflow`] is returned.
    fn lower_boundary(&self, index: i32) -> Result<f64, MappingError>;

    /// Gets the scale of this mapping.
    fn scale(&self) -> i32;
}

/// A mapping for any supported scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScaleMapping {
    /// Mapping for scales less than or equal to zero.
    Exponent(ExponentMapping),
    /// Mapping for scales greater than zero.
    Logarithm(LogarithmMapping),
}

/// Creates the mapping for `scale`.
///
/// # Errors
///
/// If `scale` is outside of [`MIN_SCALE`]`..=`[`MAX_SCALE`], an error is returned.
pub fn new_mapping(scale: i32) -> Result<ScaleMapping, MappingError> {
    if scale <= 0 {
        ExponentMapping::new(scale).map(ScaleMapping::Exponent)
    } else {
        LogarithmMapping::new(scale).map(ScaleMapping::Logarithm)
    }
}

impl Mapping for ScaleMapping {
    #[inline]
    fn map_to_index(&self, value: f64) -> i32 {
        match self {
            ScaleMapping::Exponent(m) => m.map_to_index(value),
            ScaleMapping::Logarithm(m) => m.map_to_index(value),
        }
    }

    fn lower_boundary(&self, index: i32) -> Result<f64, MappingError> {
        match self {
            ScaleMapping::Exponent(m) => m.lower_boundary(index),
            ScaleMapping::Logarithm(m) => m.lower_boundary(index),
        }
    }

    #[inline]
    fn scale(&self) -> i32 {
        match self {
            ScaleMapping::Exponent(m) => m.scale(),
            ScaleMapping::Logarithm(m) => m.scale(),
        }
    }
}

/// Gets the unbiased base-2 exponent of a positive value.
///
/// Subnormal values are rounded up to [`MIN_NORMAL_EXPONENT`].
#[inline]
pub(crate) fn normal_base2(value: f64) -> i32 {
    let raw_exponent = ((value.to_bits() & EXPONENT_MASK) >> SIGNIFICAND_WIDTH) as i32;
    if raw_exponent == 0 {
        return MIN_NORMAL_EXPONENT;
    }
    raw_exponent - EXPONENT_BIAS
}

/// Gets the significand bits of a value, without the implicit leading one.
#[inline]
pub(crate) fn significand(value: f64) -> u64 {
    value.to_bits() & SIGNIFICAND_MASK
}

/// Builds `2^exponent` directly from its bit pattern.
///
/// `exponent` must lie within [`MIN_SUBNORMAL_EXPONENT`]`..=`[`MAX_NORMAL_EXPONENT`].
pub(crate) fn power_of_two(exponent: i32) -> f64 {
    if exponent < MIN_NORMAL_EXPONENT {
        return f64::from_bits(1u64 << (exponent - MIN_SUBNORMAL_EXPONENT));
    }
    f64::from_bits(((exponent + EXPONENT_BIAS) as u64) << SIGNIFICAND_WIDTH)
}
