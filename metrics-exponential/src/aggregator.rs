//! Thread-safe exponential histogram aggregation.
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::ConfigError;
use crate::histogram::Histogram;
use crate::number::Number;

/// A thread-safe exponential histogram.
///
/// `Aggregator` wraps a [`Histogram`] behind a mutex so that it can be updated concurrently
/// through a shared reference.  Operations that involve a second aggregator take that one by
/// exclusive reference, so only a single lock is ever held at a time and two aggregators can
/// never deadlock against each other.
///
/// The intended pattern is for many threads to call [`update`](Aggregator::update) on a shared
/// aggregator while a collector periodically moves the accumulated state into a private
/// aggregator with [`synchronized_move`](Aggregator::synchronized_move).
#[derive(Debug)]
pub struct Aggregator<N> {
    inner: Mutex<Histogram<N>>,
}

impl<N: Number> Default for Aggregator<N> {
    fn default() -> Self {
        Aggregator::from(Histogram::default())
    }
}

impl<N: Number> Aggregator<N> {
    /// Creates a new `Aggregator`.
    ///
    /// Invalid configurations are clamped, as in [`Histogram::new`].
    pub fn new(config: Config) -> Aggregator<N> {
        Aggregator { inner: Mutex::new(Histogram::new(config)) }
    }

    /// Creates a new `Aggregator`, validating the configuration.
    ///
    /// # Errors
    ///
    /// If the configuration is invalid, an error is returned.
    pub fn try_new(config: Config) -> Result<Aggregator<N>, ConfigError> {
        Histogram::try_new(config).map(|histogram| Aggregator { inner: Mutex::new(histogram) })
    }

    /// Records a single value.
    pub fn update(&self, value: N) {
        self.inner.lock().update(value);
    }

    /// Moves the accumulated state into `dest` and resets this aggregator.
    ///
    /// If `dest` is `None`, the accumulated state is discarded.  Values recorded concurrently land
    /// either entirely in `dest` or entirely in the reset aggregator.
    pub fn synchronized_move(&self, dest: Option<&mut Aggregator<N>>) {
        let mut inner = self.inner.lock();
        if let Some(dest) = dest {
            inner.swap(dest.inner.get_mut());
        }
        inner.clear();
    }

    /// Replaces the contents of `dest` with a copy of this aggregator.
    pub fn copy_into(&self, dest: &mut Aggregator<N>) {
        self.inner.lock().copy_into(dest.inner.get_mut());
    }

    /// Merges the state of `other` into this aggregator.
    pub fn merge(&mut self, other: &Aggregator<N>) {
        let other = other.inner.lock();
        self.inner.get_mut().merge_from(&other);
    }

    /// Gets a point-in-time copy of the accumulated state.
    pub fn snapshot(&self) -> Histogram<N> {
        self.inner.lock().clone()
    }

    /// Gets the accumulated state.
    ///
    /// Exclusive access means no lock is needed.
    pub fn histogram(&mut self) -> &Histogram<N> {
        self.inner.get_mut()
    }
}

impl<N: Number> From<Histogram<N>> for Aggregator<N> {
    fn from(histogram: Histogram<N>) -> Self {
        Aggregator { inner: Mutex::new(histogram) }
    }
}
