//! Histogram configuration.
use crate::error::ConfigError;

/// Default maximum number of buckets per sign.
pub const DEFAULT_MAX_SIZE: i32 = 320;

/// Smallest accepted maximum number of buckets.
///
/// With fewer than two buckets a histogram could not hold a value on each side of a scale
/// boundary, and downscaling would never converge.
pub const MIN_MAX_SIZE: i32 = 2;

/// Largest accepted maximum number of buckets.
pub const MAX_MAX_SIZE: i32 = 16384;

/// Configuration for an exponential histogram.
///
/// The only tunable is the maximum number of buckets kept for each sign.  A larger size lets a
/// histogram keep a finer scale across a wider range of values at the cost of memory: each
/// bucket costs between one and eight bytes depending on the largest count it holds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    max_size: i32,
}

impl Default for Config {
    fn default() -> Self {
        Config { max_size: DEFAULT_MAX_SIZE }
    }
}

impl Config {
    /// Creates a new [`Config`] with the default maximum size.
    pub fn new() -> Config {
        Config::default()
    }

    /// Sets the maximum number of buckets per sign.
    ///
    /// A value of zero selects [`DEFAULT_MAX_SIZE`].  Other values must fall within
    /// [`MIN_MAX_SIZE`] and [`MAX_MAX_SIZE`] to pass [`validate`](Config::validate).
    ///
    /// Defaults to 320.
    #[must_use]
    pub fn with_max_size(mut self, max_size: i32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Gets the configured maximum size.
    pub fn max_size(&self) -> i32 {
        self.max_size
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// If the maximum size is neither zero nor within the accepted range, an error is returned
    /// describing the accepted range.
    pub fn validate(self) -> Result<Config, ConfigError> {
        match self.max_size {
            0 => Ok(Config::default()),
            MIN_MAX_SIZE..=MAX_MAX_SIZE => Ok(self),
            max_size => {
                Err(ConfigError::InvalidMaxSize { max_size, min: MIN_MAX_SIZE, max: MAX_MAX_SIZE })
            }
        }
    }

    /// Validates this configuration, forcing an invalid maximum size into range.
    ///
    /// Negative sizes fall back to the default; positive sizes are clamped to the nearest
    /// bound.  The validation error, if any, is returned alongside the usable configuration.
    pub(crate) fn clamped(self) -> (Config, Option<ConfigError>) {
        match self.validate() {
            Ok(config) => (config, None),
            Err(e) => {
                let max_size = if self.max_size < 0 {
                    DEFAULT_MAX_SIZE
                } else {
                    self.max_size.clamp(MIN_MAX_SIZE, MAX_MAX_SIZE)
                };
                (Config { max_size }, Some(e))
            }
        }
    }
}
