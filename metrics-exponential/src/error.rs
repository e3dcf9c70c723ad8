use thiserror::Error as ThisError;

/// Errors produced by a [`Mapping`](crate::mapping::Mapping).
#[derive(Clone, Copy, Debug, Eq, PartialEq, ThisError)]
pub enum MappingError {
    /// The lower boundary of the requested bucket is smaller than the smallest representable
    /// `f64` boundary at the current scale.
    #[error("bucket lower boundary underflows f64")]
    Underflow,

    /// The lower boundary of the requested bucket is larger than `f64::MAX`.
    #[error("bucket lower boundary overflows f64")]
    Overflow,

    /// A mapping was requested for a scale outside of the supported range.
    #[error("scale {scale} is outside of the supported range {min}..={max}")]
    ScaleOutOfRange {
        /// The requested scale.
        scale: i32,
        /// Smallest supported scale.
        min: i32,
        /// Largest supported scale.
        max: i32,
    },
}

/// Errors that could occur while validating a histogram [`Config`](crate::Config).
#[derive(Clone, Copy, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    /// The configured maximum bucket count is not within the supported range.
    #[error("invalid histogram max size {max_size}: must be between {min} and {max}")]
    InvalidMaxSize {
        /// The rejected maximum size.
        max_size: i32,
        /// Smallest accepted maximum size.
        min: i32,
        /// Largest accepted maximum size.
        max: i32,
    },
}
