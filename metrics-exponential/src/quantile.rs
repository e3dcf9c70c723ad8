use crate::histogram::Histogram;
use crate::mapping::{Mapping, ScaleMapping};
use crate::number::Number;

/// A quantile that has both the raw value and a human-friendly display label.
///
/// Quantiles are held as fractions, but are usually displayed as abbreviated percentiles, so a
/// quantile of `0.99` is labeled `p99` and a quantile of `0.999` is labeled `p999`.  `0.0` and
/// `1.0` are labeled `min` and `max`, respectively.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantile(f64, String);

impl Quantile {
    /// Creates a new [`Quantile`] from a floating-point value.
    ///
    /// All values are clamped between 0.0 and 1.0, and NaN is treated as 0.0.
    pub fn new(quantile: f64) -> Quantile {
        let clamped = quantile.max(0.0).min(1.0);

        let label = if clamped == 0.0 {
            "min".to_string()
        } else if clamped == 1.0 {
            "max".to_string()
        } else {
            // Round away float noise such as 0.07 * 100.0 == 7.000000000000001.
            let percentile = (clamped * 100.0 * 1e6).round() / 1e6;
            format!("p{}", percentile).replace('.', "")
        };

        Quantile(clamped, label)
    }

    /// Gets the human-friendly display label.
    pub fn label(&self) -> &str {
        self.1.as_str()
    }

    /// Gets the raw quantile value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Parses a slice of floating-point values into a vector of [`Quantile`]s.
pub fn parse_quantiles(quantiles: &[f64]) -> Vec<Quantile> {
    quantiles.iter().map(|f| Quantile::new(*f)).collect()
}

/// Gets the geometric midpoint of the bucket at `index`.
fn bucket_midpoint(mapping: &ScaleMapping, index: i32) -> f64 {
    let lower = mapping.lower_boundary(index).unwrap_or(f64::MIN_POSITIVE);
    let upper = mapping.lower_boundary(index + 1).unwrap_or(f64::MAX);
    lower.sqrt() * upper.sqrt()
}

impl<N: Number> Histogram<N> {
    /// Estimates the value at quantile `q`.
    ///
    /// The estimate is the geometric midpoint of the bucket holding the value of rank
    /// `ceil(q * count)`, limited to the observed minimum and maximum, so its relative error is
    /// bounded by the width of a bucket at the current scale.  `q` is clamped between 0.0 and 1.0; the extremes return
    /// the exact minimum and maximum.
    ///
    /// Returns `None` if nothing has been recorded.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        let min = self.min()?.into_f64();
        let max = self.max()?.into_f64();

        let q = q.max(0.0).min(1.0);
        if q == 0.0 {
            return Some(min);
        }
        if q == 1.0 {
            return Some(max);
        }

        let limit = |estimate: f64| estimate.max(min).min(max);
        let rank = ((q * self.count() as f64).ceil() as u64).max(1);
        let mut seen = 0;

        // Negative values, from the largest magnitude down.
        let negative = self.negative();
        for pos in (0..negative.len()).rev() {
            seen += negative.at(pos);
            if seen >= rank {
                let index = negative.offset() + pos as i32;
                return Some(limit(-bucket_midpoint(self.mapping(), index)));
            }
        }

        seen += self.zero_count();
        if seen >= rank {
            return Some(limit(0.0));
        }

        let positive = self.positive();
        for (pos, count) in positive.iter().enumerate() {
            seen += count;
            if seen >= rank {
                let index = positive.offset() + pos as i32;
                return Some(limit(bucket_midpoint(self.mapping(), index)));
            }
        }

        Some(max)
    }

    /// Estimates the values at each of the given quantiles.
    ///
    /// Returns an empty vector if nothing has been recorded.
    pub fn quantiles<'a>(&self, quantiles: &'a [Quantile]) -> Vec<(&'a Quantile, f64)> {
        quantiles
            .iter()
            .filter_map(|quantile| self.quantile(quantile.value()).map(|value| (quantile, value)))
            .collect()
    }
}
