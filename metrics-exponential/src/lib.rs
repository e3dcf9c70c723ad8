//! Mergeable exponential histograms.
//!
//! An exponential histogram counts values in buckets whose boundaries grow geometrically, so the
//! relative error of every bucket is the same no matter how large or small the values are.  The
//! growth factor is controlled by a `scale`: at scale `s`, consecutive boundaries differ by a
//! factor of `2^(2^-s)`.  Histograms in this crate begin at the finest scale and automatically
//! halve their resolution whenever the observed range of values would need more buckets than
//! the configured maximum, which means no bucket layout ever has to be chosen ahead of time.
//!
//! Histograms with different scales can be merged losslessly, down to the coarser of the two
//! resolutions, which makes them suitable for aggregating distributions across threads, processes
//! or collection intervals.
//!
//! # Overview
//! - [`Histogram`] holds the state: per-sign [`Buckets`], a zero count, the sum, count, minimum
//!   and maximum.
//! - [`Aggregator`] wraps a histogram in a mutex for concurrent updates, and adds the
//!   move-and-reset operation needed to collect it periodically.
//! - [`mapping`] converts between values and bucket indices at a given scale.
//! - [`Config`] sets the maximum number of buckets per sign.
//!
//! # Example
//! ```
//! use metrics_exponential::{Config, Histogram};
//!
//! let mut histogram = Histogram::new(Config::new().with_max_size(4));
//! histogram.update_many([1.0, 2.0, 0.5]);
//!
//! assert_eq!(histogram.count(), 3);
//! assert_eq!(histogram.scale(), 0);
//! assert_eq!(histogram.positive().offset(), -1);
//! assert_eq!(histogram.positive().iter().collect::<Vec<_>>(), vec![1, 1, 1]);
//! ```
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

mod aggregator;
pub use aggregator::Aggregator;

mod buckets;
pub use buckets::Buckets;

mod config;
pub use config::{Config, DEFAULT_MAX_SIZE, MAX_MAX_SIZE, MIN_MAX_SIZE};

mod error;
pub use error::{ConfigError, MappingError};

mod histogram;
pub use histogram::Histogram;

pub mod mapping;

mod number;
pub use number::Number;

mod quantile;
pub use quantile::{parse_quantiles, Quantile};
