//! Exponential histogram state.
use tracing::{debug, warn};

use crate::buckets::{Buckets, IndexRange};
use crate::config::Config;
use crate::error::ConfigError;
use crate::mapping::{new_mapping, Mapping, ScaleMapping, MAX_SCALE};
use crate::number::Number;

/// An exponentially bucketed histogram.
///
/// Values are counted in buckets whose boundaries are powers of `2^(2^-scale)`, with one set of
/// buckets for positive values, one for negative values (by magnitude), and a separate count for
/// exact zeroes.  The histogram starts at the finest supported scale and halves its resolution
/// whenever the values seen so far no longer fit within the configured maximum number of buckets,
/// so the relative error adapts to the range of the data without any up-front bucket bounds.
///
/// Two histograms of the same value type can be merged, regardless of their scales, and the
/// result is the same as if every value had been recorded into a single histogram.
///
/// `Histogram` does not synchronize access.  See [`Aggregator`](crate::Aggregator) for a
/// version that can be shared between threads.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram<N> {
    max_size: i32,
    sum: N,
    count: u64,
    zero_count: u64,
    min: N,
    max: N,
    positive: Buckets,
    negative: Buckets,
    mapping: ScaleMapping,
}

fn finest_mapping() -> ScaleMapping {
    new_mapping(MAX_SCALE).expect("maximum scale is always valid")
}

impl<N: Number> Default for Histogram<N> {
    fn default() -> Self {
        Histogram::with_max_size(Config::default().max_size())
    }
}

impl<N: Number> Histogram<N> {
    /// Creates a new `Histogram`.
    ///
    /// If the configured maximum size is invalid, it is forced into the accepted range and a
    /// warning is logged.  Use [`try_new`](Histogram::try_new) to reject invalid configurations
    /// instead.
    pub fn new(config: Config) -> Histogram<N> {
        let (config, err) = config.clamped();
        if let Some(e) = err {
            warn!(error = %e, max_size = config.max_size(), "using clamped histogram size");
        }
        Histogram::with_max_size(config.max_size())
    }

    /// Creates a new `Histogram`, validating the configuration.
    ///
    /// # Errors
    ///
    /// If the configured maximum size is not within the accepted range, an error is returned.
    pub fn try_new(config: Config) -> Result<Histogram<N>, ConfigError> {
        config.validate().map(|config| Histogram::with_max_size(config.max_size()))
    }

    fn with_max_size(max_size: i32) -> Histogram<N> {
        Histogram {
            max_size,
            sum: N::default(),
            count: 0,
            zero_count: 0,
            min: N::default(),
            max: N::default(),
            positive: Buckets::default(),
            negative: Buckets::default(),
            mapping: finest_mapping(),
        }
    }

    /// Gets the maximum number of buckets kept per sign.
    pub fn max_size(&self) -> i32 {
        self.max_size
    }

    /// Gets the sum of all values, or `None` if nothing has been recorded.
    pub fn sum(&self) -> Option<N> {
        (self.count > 0).then_some(self.sum)
    }

    /// Gets the number of recorded values, including zeroes.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Gets the number of recorded values that were exactly zero.
    pub fn zero_count(&self) -> u64 {
        self.zero_count
    }

    /// Gets the smallest recorded value, or `None` if nothing has been recorded.
    pub fn min(&self) -> Option<N> {
        (self.count > 0).then_some(self.min)
    }

    /// Gets the largest recorded value, or `None` if nothing has been recorded.
    pub fn max(&self) -> Option<N> {
        (self.count > 0).then_some(self.max)
    }

    /// Gets the current scale.
    ///
    /// Until a non-zero value has been recorded, no scale has been chosen and zero is returned.
    pub fn scale(&self) -> i32 {
        if self.count == self.zero_count {
            return 0;
        }
        self.mapping.scale()
    }

    /// Gets the mapping currently used to assign values to buckets.
    pub fn mapping(&self) -> &ScaleMapping {
        &self.mapping
    }

    /// Gets the buckets of positive values.
    pub fn positive(&self) -> &Buckets {
        &self.positive
    }

    /// Gets the buckets of negative values, indexed by magnitude.
    pub fn negative(&self) -> &Buckets {
        &self.negative
    }

    /// Records a single value.
    ///
    /// The value must not be NaN or infinite.
    pub fn update(&mut self, value: N) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            if value < self.min {
                self.min = value;
            }
            if value > self.max {
                self.max = value;
            }
        }

        self.count += 1;

        if value.is_zero() {
            self.zero_count += 1;
            return;
        }

        self.sum = self.sum.accumulate(value);
        self.record_magnitude(value.is_negative(), value.into_f64().abs(), 1);
    }

    /// Records multiple values.
    pub fn update_many<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = N>,
    {
        for value in values {
            self.update(value);
        }
    }

    /// Merges `other` into this histogram.
    ///
    /// This histogram is downscaled as far as needed so that both sets of buckets fit within its
    /// maximum size, and then every bucket of `other` is added to the matching bucket here.
    pub fn merge_from(&mut self, other: &Histogram<N>) {
        if self.count == 0 {
            self.min = other.min;
            self.max = other.max;
        } else if other.count != 0 {
            if other.min < self.min {
                self.min = other.min;
            }
            if other.max > self.max {
                self.max = other.max;
            }
        }

        let mut min_scale = self.mapping.scale().min(other.mapping.scale());

        let positive = self
            .range_at_scale(&self.positive, min_scale)
            .union(other.range_at_scale(&other.positive, min_scale));
        let negative = self
            .range_at_scale(&self.negative, min_scale)
            .union(other.range_at_scale(&other.negative, min_scale));

        min_scale -= self.change_scale(positive).max(self.change_scale(negative)) as i32;

        self.downscale((self.mapping.scale() - min_scale) as u32);
        self.merge_buckets(false, other, min_scale);
        self.merge_buckets(true, other, min_scale);

        self.sum = self.sum.accumulate(other.sum);
        self.count += other.count;
        self.zero_count += other.zero_count;
    }

    /// Resets this histogram to its empty state.
    ///
    /// Bucket storage is kept for reuse.
    pub fn clear(&mut self) {
        self.positive.clear();
        self.negative.clear();
        self.sum = N::default();
        self.count = 0;
        self.zero_count = 0;
        self.min = N::default();
        self.max = N::default();
        self.mapping = finest_mapping();
    }

    /// Swaps the entire state of this histogram with `other`.
    pub fn swap(&mut self, other: &mut Histogram<N>) {
        std::mem::swap(self, other);
    }

    /// Replaces the contents of `dest` with a copy of this histogram.
    ///
    /// `dest` keeps its own maximum size, downscaling the copy if needed.
    pub fn copy_into(&self, dest: &mut Histogram<N>) {
        dest.clear();
        dest.merge_from(self);
    }

    fn buckets_mut(&mut self, negative: bool) -> &mut Buckets {
        if negative {
            &mut self.negative
        } else {
            &mut self.positive
        }
    }

    /// Adds `incr` to the bucket holding `magnitude`, downscaling first if it does not fit.
    fn record_magnitude(&mut self, negative: bool, magnitude: f64, incr: u64) {
        let max_size = self.max_size;

        let index = self.mapping.map_to_index(magnitude);
        if let Err(range) = self.buckets_mut(negative).increment_index_by(index, incr, max_size) {
            self.downscale(self.change_scale(range));

            let index = self.mapping.map_to_index(magnitude);
            if self.buckets_mut(negative).increment_index_by(index, incr, max_size).is_err() {
                panic!("index {} does not fit after downscaling to {}", index, self.mapping.scale());
            }
        }
    }

    /// Gets the number of halvings needed for `range` to fit within the maximum size.
    fn change_scale(&self, range: IndexRange) -> u32 {
        let IndexRange { mut low, mut high } = range;
        let mut change = 0;
        while high - low >= self.max_size {
            low >>= 1;
            high >>= 1;
            change += 1;
        }
        change
    }

    /// Lowers the scale by `change`, merging buckets on both sides.
    fn downscale(&mut self, change: u32) {
        if change == 0 {
            return;
        }

        let old_scale = self.mapping.scale();
        let new_scale = old_scale - change as i32;

        self.positive.downscale(change);
        self.negative.downscale(change);
        self.mapping = new_mapping(new_scale).unwrap_or_else(|e| {
            panic!("cannot downscale from {} by {}: {}", old_scale, change, e)
        });

        debug!(old_scale, new_scale, change, "downscaled exponential histogram");
    }

    /// Gets the index range `buckets` would cover at the coarser `scale`.
    fn range_at_scale(&self, buckets: &Buckets, scale: i32) -> IndexRange {
        if buckets.is_empty() {
            return IndexRange::EMPTY;
        }

        let shift = self.mapping.scale() - scale;
        IndexRange { low: buckets.index_start() >> shift, high: buckets.index_end() >> shift }
    }

    fn merge_buckets(&mut self, negative: bool, other: &Histogram<N>, scale: i32) {
        let theirs = if negative { &other.negative } else { &other.positive };
        let their_change = other.mapping.scale() - scale;
        let their_offset = theirs.offset();
        let max_size = self.max_size;

        let mine = self.buckets_mut(negative);
        for (pos, count) in theirs.iter().enumerate() {
            let index = (their_offset + pos as i32) >> their_change;
            if mine.increment_index_by(index, count, max_size).is_err() {
                panic!("merged index {} does not fit at scale {}", index, scale);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn capacities(&self) -> (i32, i32) {
        (self.positive.capacity(), self.negative.capacity())
    }
}
