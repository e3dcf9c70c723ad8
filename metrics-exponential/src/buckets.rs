//! Variable-width, circularly indexed bucket counts.
//!
//! [`Buckets`] holds the counts for one sign of a histogram as a dense range of bucket indices,
//! `[index_start, index_end]`.  The counts live in a backing array that is used as a ring: the
//! count for `index_base` is stored at physical slot zero, and indices below `index_base` wrap
//! around to the end of the array.  This lets the range grow in either direction without shifting
//! every count on each growth.  The ring is only straightened out (rotated so that
//! `index_base == index_start`) when the buckets are downscaled.
//!
//! Counts start out as `u8` and the whole array is widened to `u16`, `u32` and finally `u64` as
//! soon as any single count would overflow the current width.
use std::fmt;

/// Backing storage for bucket counts, at the narrowest width that holds every count.
#[derive(Clone, PartialEq, Eq)]
enum Backing {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
}

macro_rules! with_counts {
    ($backing:expr, $counts:ident => $body:expr) => {
        match $backing {
            Backing::U8($counts) => $body,
            Backing::U16($counts) => $body,
            Backing::U32($counts) => $body,
            Backing::U64($counts) => $body,
        }
    };
}

fn try_increment<C>(counts: &mut [C], slot: usize, incr: u64) -> bool
where
    C: Copy + Into<u64> + TryFrom<u64>,
{
    let current: u64 = counts[slot].into();
    match current.checked_add(incr).and_then(|sum| C::try_from(sum).ok()) {
        Some(count) => {
            counts[slot] = count;
            true
        }
        None => false,
    }
}

fn widen<C, W>(counts: &[C]) -> Vec<W>
where
    C: Copy + Into<W>,
{
    counts.iter().map(|c| (*c).into()).collect()
}

impl Backing {
    fn size(&self) -> i32 {
        with_counts!(self, counts => counts.len() as i32)
    }

    /// Width of a single count, in bytes.
    #[cfg(test)]
    fn width(&self) -> usize {
        match self {
            Backing::U8(_) => 1,
            Backing::U16(_) => 2,
            Backing::U32(_) => 4,
            Backing::U64(_) => 8,
        }
    }

    fn count_at(&self, slot: usize) -> u64 {
        with_counts!(self, counts => counts[slot].into())
    }

    fn try_increment(&mut self, slot: usize, incr: u64) -> bool {
        with_counts!(self, counts => try_increment(counts, slot, incr))
    }

    /// Takes the count out of `slot`, leaving zero behind.
    fn empty_bucket(&mut self, slot: usize) -> u64 {
        with_counts!(self, counts => std::mem::take(&mut counts[slot]).into())
    }

    fn reverse(&mut self, from: usize, limit: usize) {
        with_counts!(self, counts => counts[from..limit].reverse())
    }

    /// Resizes the ring to `new_size` slots.
    ///
    /// Slots below `old_positive_limit` keep their position, slots at or above it are moved to
    /// start at `new_positive_limit`, leaving the new zeroed slots in between.
    fn grow_to(&mut self, new_size: usize, old_positive_limit: usize, new_positive_limit: usize) {
        with_counts!(self, counts => {
            let mut grown = vec![Default::default(); new_size];
            grown[new_positive_limit..].copy_from_slice(&counts[old_positive_limit..]);
            grown[..old_positive_limit].copy_from_slice(&counts[..old_positive_limit]);
            *counts = grown;
        })
    }

    /// Replaces this backing with the next wider one, returning `false` at `u64`.
    fn widen(&mut self) -> bool {
        let widened = match self {
            Backing::U8(counts) => Backing::U16(widen(counts.as_slice())),
            Backing::U16(counts) => Backing::U32(widen(counts.as_slice())),
            Backing::U32(counts) => Backing::U64(widen(counts.as_slice())),
            Backing::U64(_) => return false,
        };
        *self = widened;
        true
    }

    fn reset(&mut self) {
        with_counts!(self, counts => counts.iter_mut().for_each(|c| *c = Default::default()))
    }
}

/// A contiguous range of bucket indices that did not fit within the maximum size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct IndexRange {
    pub low: i32,
    pub high: i32,
}

impl IndexRange {
    /// Range used to represent "no buckets".
    pub const EMPTY: IndexRange = IndexRange { low: 0, high: -1 };

    pub fn is_empty(&self) -> bool {
        self.low > self.high
    }

    /// Gets the smallest range covering both `self` and `other`.
    pub fn union(self, other: IndexRange) -> IndexRange {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        IndexRange { low: self.low.min(other.low), high: self.high.max(other.high) }
    }
}

/// The bucket counts for one sign of an exponential histogram.
///
/// Buckets are read by logical position: position `0` is the bucket at [`offset`], position
/// [`len`]` - 1` the last bucket holding a count.  Interior buckets may be zero.
///
/// [`offset`]: Buckets::offset
/// [`len`]: Buckets::len
#[derive(Clone, Default)]
pub struct Buckets {
    backing: Option<Backing>,
    index_base: i32,
    index_start: i32,
    index_end: i32,
}

impl Buckets {
    /// Gets the bucket index of logical position zero.
    pub fn offset(&self) -> i32 {
        self.index_start
    }

    /// Gets the number of buckets, from the first to the last one holding a count.
    pub fn len(&self) -> u32 {
        match &self.backing {
            None => 0,
            Some(_) if self.index_end == self.index_start && self.at(0) == 0 => 0,
            Some(_) => (self.index_end - self.index_start + 1) as u32,
        }
    }

    /// Whether or not any count has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets the count of the bucket at logical position `pos`.
    ///
    /// # Panics
    ///
    /// May panic if `pos` is not less than [`len`](Buckets::len).
    pub fn at(&self, pos: u32) -> u64 {
        let backing = match &self.backing {
            Some(backing) => backing,
            None => panic!("bucket position {} out of range for empty buckets", pos),
        };

        let bias = (self.index_base - self.index_start) as u32;
        let mut slot = pos;
        if slot < bias {
            slot += backing.size() as u32;
        }
        backing.count_at((slot - bias) as usize)
    }

    /// Iterates over the counts in logical order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.len()).map(move |pos| self.at(pos))
    }

    /// Gets the sum of every bucket count.
    pub fn total(&self) -> u64 {
        self.iter().sum()
    }

    /// Number of physical slots allocated.
    pub(crate) fn capacity(&self) -> i32 {
        self.backing.as_ref().map_or(0, Backing::size)
    }

    /// Width of each count, in bytes.
    #[cfg(test)]
    pub(crate) fn count_width(&self) -> usize {
        self.backing.as_ref().map_or(0, Backing::width)
    }

    pub(crate) fn index_start(&self) -> i32 {
        self.index_start
    }

    pub(crate) fn index_end(&self) -> i32 {
        self.index_end
    }

    /// Adds `incr` to the bucket at `index`, growing the ring if needed.
    ///
    /// If covering `index` would require more than `max_size` buckets, nothing is changed and the
    /// range that would have been needed is returned instead.
    pub(crate) fn increment_index_by(
        &mut self,
        index: i32,
        incr: u64,
        max_size: i32,
    ) -> Result<(), IndexRange> {
        if incr == 0 {
            return Ok(());
        }

        if self.is_empty() {
            if self.backing.is_none() {
                self.backing = Some(Backing::U8(vec![0]));
            }
            self.index_start = index;
            self.index_end = index;
            self.index_base = index;
        } else if index < self.index_start {
            let span = self.index_end - index;
            if span >= max_size {
                return Err(IndexRange { low: index, high: self.index_end });
            } else if span >= self.capacity() {
                self.grow(span + 1, max_size);
            }
            self.index_start = index;
        } else if index > self.index_end {
            let span = index - self.index_start;
            if span >= max_size {
                return Err(IndexRange { low: self.index_start, high: index });
            } else if span >= self.capacity() {
                self.grow(span + 1, max_size);
            }
            self.index_end = index;
        }

        let mut slot = index - self.index_base;
        if slot < 0 {
            slot += self.capacity();
        }
        self.increment_bucket(slot as usize, incr);
        Ok(())
    }

    /// Grows the ring to hold at least `needed` buckets, without exceeding `max_size`.
    ///
    /// The new size is rounded up to a power of two.  Counts below the bias stay at the front of
    /// the ring while wrapped counts move to its end, so every index keeps its distance from
    /// `index_base`.
    fn grow(&mut self, needed: i32, max_size: i32) {
        let Some(backing) = self.backing.as_mut() else {
            return;
        };

        let size = backing.size();
        let bias = self.index_base - self.index_start;
        let old_positive_limit = size - bias;
        let new_size = (needed as u32).next_power_of_two().min(max_size as u32) as i32;
        let new_positive_limit = new_size - bias;

        backing.grow_to(
            new_size as usize,
            old_positive_limit as usize,
            new_positive_limit as usize,
        );
    }

    /// Adds `incr` to a physical slot, widening the counts until the result fits.
    fn increment_bucket(&mut self, slot: usize, incr: u64) {
        let Some(backing) = self.backing.as_mut() else {
            return;
        };

        while !backing.try_increment(slot, incr) {
            if !backing.widen() {
                panic!("bucket count overflowed u64");
            }
        }
    }

    /// Straightens out the ring so that `index_base == index_start`.
    pub(crate) fn rotate(&mut self) {
        let bias = self.index_base - self.index_start;
        if bias == 0 {
            return;
        }
        self.index_base = self.index_start;

        let Some(backing) = self.backing.as_mut() else {
            return;
        };

        // [A | B] -> [B' | A'] -> [B | A]
        let size = backing.size() as usize;
        let bias = bias as usize;
        backing.reverse(0, size);
        backing.reverse(0, bias);
        backing.reverse(bias, size);
    }

    /// Merges every `2^by` neighbouring buckets into one.
    ///
    /// Buckets are grouped by their index at the coarser scale, i.e. `index >> by`, so the groups
    /// at either end of the range can be partial.
    pub(crate) fn downscale(&mut self, by: u32) {
        if by == 0 {
            return;
        }

        if !self.is_empty() {
            self.rotate();

            let size = i64::from(1 + self.index_end - self.index_start);
            let each = 1i64 << by;
            let mut in_pos = 0i64;
            let mut out_pos = 0i64;
            let mut pos = i64::from(self.index_start);

            while pos <= i64::from(self.index_end) {
                let mut i = pos.rem_euclid(each);
                while i < each && in_pos < size {
                    self.relocate_bucket(out_pos as usize, in_pos as usize);
                    in_pos += 1;
                    pos += 1;
                    i += 1;
                }
                out_pos += 1;
            }
        }

        self.index_start >>= by;
        self.index_end >>= by;
        self.index_base = self.index_start;
    }

    fn relocate_bucket(&mut self, dest: usize, src: usize) {
        if dest == src {
            return;
        }

        let incr = match self.backing.as_mut() {
            Some(backing) => backing.empty_bucket(src),
            None => return,
        };
        self.increment_bucket(dest, incr);
    }

    /// Resets every count to zero, keeping the allocation and its width.
    pub(crate) fn clear(&mut self) {
        if let Some(backing) = self.backing.as_mut() {
            backing.reset();
        }
        self.index_base = 0;
        self.index_start = 0;
        self.index_end = 0;
    }
}

impl fmt::Debug for Buckets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buckets")
            .field("offset", &self.offset())
            .field("counts", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

/// Buckets are equal when they hold the same counts at the same indices, regardless of how the
/// counts are laid out in memory or how wide they are.
impl PartialEq for Buckets {
    fn eq(&self, other: &Buckets) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.is_empty() && other.is_empty();
        }
        self.offset() == other.offset() && self.iter().eq(other.iter())
    }
}
