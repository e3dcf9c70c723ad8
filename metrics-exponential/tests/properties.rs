use approx::assert_relative_eq;
use metrics_exponential::mapping::{new_mapping, Mapping, MAX_SCALE, MIN_SCALE};
use metrics_exponential::{Config, Histogram, MAX_MAX_SIZE, MIN_MAX_SIZE};
use proptest::{collection::vec as arb_vec, prelude::*, prop_oneof, proptest};

/// Values spread over a wide range of magnitudes, with both signs and the occasional zero.
fn arb_value() -> impl Strategy<Value = f64> {
    let nonzero = (1.0..2.0f64, -60..60i32, any::<bool>()).prop_map(|(m, e, negative)| {
        let magnitude = m * 2f64.powi(e);
        if negative {
            -magnitude
        } else {
            magnitude
        }
    });

    prop_oneof![9 => nonzero, 1 => Just(0.0)]
}

/// Any positive, finite `f64`, including subnormals.
fn arb_positive() -> impl Strategy<Value = f64> {
    (1u64..f64::MAX.to_bits()).prop_map(f64::from_bits)
}

fn arb_max_size() -> impl Strategy<Value = i32> {
    prop_oneof![MIN_MAX_SIZE..16, 16..=MAX_MAX_SIZE]
}

fn histogram(max_size: i32, values: &[f64]) -> Histogram<f64> {
    let mut h = Histogram::new(Config::new().with_max_size(max_size));
    h.update_many(values.iter().copied());
    h
}

proptest! {
    #[test]
    fn counts_are_conserved(max_size in arb_max_size(), values in arb_vec(arb_value(), 0..256)) {
        let h = histogram(max_size, &values);

        let zeroes = values.iter().filter(|v| **v == 0.0).count() as u64;
        let negatives = values.iter().filter(|v| **v < 0.0).count() as u64;

        prop_assert_eq!(h.count(), values.len() as u64);
        prop_assert_eq!(h.zero_count(), zeroes);
        prop_assert_eq!(h.negative().total(), negatives);
        prop_assert_eq!(h.count(), h.zero_count() + h.positive().total() + h.negative().total());
        prop_assert!(h.positive().len() as i32 <= max_size);
        prop_assert!(h.negative().len() as i32 <= max_size);
        prop_assert!(h.scale() >= MIN_SCALE && h.scale() <= MAX_SCALE);

        if !values.is_empty() {
            let sum = values.iter().sum::<f64>();
            assert_relative_eq!(h.sum().unwrap(), sum, epsilon = 1e-6, max_relative = 1e-9);

            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(h.min(), Some(min));
            prop_assert_eq!(h.max(), Some(max));
        }
    }

    #[test]
    fn merge_matches_direct_updates(
        max_size in arb_max_size(),
        values in arb_vec(arb_value(), 1..256),
        split in any::<prop::sample::Index>(),
    ) {
        let (left, right) = values.split_at(split.index(values.len()));

        let mut merged = histogram(max_size, left);
        merged.merge_from(&histogram(max_size, right));
        let direct = histogram(max_size, &values);

        prop_assert_eq!(merged.scale(), direct.scale());
        prop_assert_eq!(merged.positive(), direct.positive());
        prop_assert_eq!(merged.negative(), direct.negative());
        prop_assert_eq!(merged.count(), direct.count());
        prop_assert_eq!(merged.zero_count(), direct.zero_count());
        prop_assert_eq!(merged.min(), direct.min());
        prop_assert_eq!(merged.max(), direct.max());
    }

    #[test]
    fn merge_is_commutative(
        max_size in arb_max_size(),
        a in arb_vec(arb_value(), 0..128),
        b in arb_vec(arb_value(), 0..128),
    ) {
        let (a, b) = (histogram(max_size, &a), histogram(max_size, &b));

        let mut ab = a.clone();
        ab.merge_from(&b);
        let mut ba = b.clone();
        ba.merge_from(&a);

        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn merge_is_associative(
        max_size in arb_max_size(),
        a in arb_vec(arb_value(), 0..64),
        b in arb_vec(arb_value(), 0..64),
        c in arb_vec(arb_value(), 0..64),
    ) {
        let (a, b, c) = (histogram(max_size, &a), histogram(max_size, &b), histogram(max_size, &c));

        let mut left = a.clone();
        left.merge_from(&b);
        left.merge_from(&c);

        let mut bc = b.clone();
        bc.merge_from(&c);
        let mut right = a.clone();
        right.merge_from(&bc);

        prop_assert_eq!(left.scale(), right.scale());
        prop_assert_eq!(left.positive(), right.positive());
        prop_assert_eq!(left.negative(), right.negative());
        prop_assert_eq!(left.count(), right.count());
    }

    #[test]
    fn mapping_is_monotonic(scale in MIN_SCALE..=MAX_SCALE, a in arb_positive(), b in arb_positive()) {
        let mapping = new_mapping(scale).unwrap();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        prop_assert!(mapping.map_to_index(low) <= mapping.map_to_index(high));
    }

    #[test]
    fn value_lies_within_its_bucket(scale in MIN_SCALE..=MAX_SCALE, value in arb_positive()) {
        let mapping = new_mapping(scale).unwrap();
        let index = mapping.map_to_index(value);

        // Subnormals are counted in the lowest normal bucket.
        let value = value.max(f64::MIN_POSITIVE);

        let lower = mapping.lower_boundary(index).unwrap();
        prop_assert!(lower <= value * (1.0 + 1e-12), "{} below bucket {} at {}", value, index, lower);

        if let Ok(upper) = mapping.lower_boundary(index + 1) {
            prop_assert!(upper >= value * (1.0 - 1e-12), "{} above bucket {} at {}", value, index, upper);
        }
    }
}
