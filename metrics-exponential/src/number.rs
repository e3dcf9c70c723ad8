use std::fmt;

/// A measurement type that can be recorded into a histogram.
///
/// Implemented for `i64` and `f64`.  Sums are accumulated in the measurement type itself, so an
/// integer histogram keeps an exact integer sum.  Bucket indices are always computed from the
/// `f64` representation of the value.
pub trait Number:
    Copy + Default + PartialOrd + fmt::Debug + Send + Sync + 'static
{
    /// Converts this value to its `f64` representation.
    fn into_f64(self) -> f64;

    /// Whether or not this value is exactly zero.
    fn is_zero(self) -> bool {
        self == Self::default()
    }

    /// Whether or not this value is strictly negative.
    fn is_negative(self) -> bool {
        self < Self::default()
    }

    /// Adds `other` to this value for a running sum.
    ///
    /// Integer sums wrap around on overflow instead of panicking.
    fn accumulate(self, other: Self) -> Self;
}

impl Number for i64 {
    fn into_f64(self) -> f64 {
        self as f64
    }

    fn accumulate(self, other: i64) -> i64 {
        self.wrapping_add(other)
    }
}

impl Number for f64 {
    fn into_f64(self) -> f64 {
        self
    }

    fn accumulate(self, other: f64) -> f64 {
        self + other
    }
}
