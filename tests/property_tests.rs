//! Property-based tests for invariants that should hold for all valid inputs.

use mursis_analytics::analysis::quintiles;
use mursis_analytics::clustering::{kmeans, KMeansConfig};
use mursis_analytics::data::{create_customer_data, create_sample_sales_data};
use mursis_analytics::detection::flag_lowest;
use mursis_analytics::recommend::tokenize;
use mursis_analytics::store::{MemoryStore, Table, TableStore};
use mursis_analytics::transform::{rolling_mean, StandardScaler};
use mursis_analytics::utils::train_test_split;
use proptest::prelude::*;

/// Rows of 2-D points in a bounded box.
fn points_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(-100.0..100.0_f64, 2), min_len..max_len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn generated_sales_are_non_negative(seed in any::<u64>(), days in 1usize..120) {
        let records = create_sample_sales_data(days, seed).unwrap();
        prop_assert_eq!(records.len(), days);
        prop_assert!(records.iter().all(|r| r.sales >= 0.0));
    }

    #[test]
    fn customer_generation_is_reproducible(seed in any::<u64>(), n in 5usize..80) {
        let a = create_customer_data(n, seed).unwrap();
        let b = create_customer_data(n, seed).unwrap();
        prop_assert_eq!(a.customers.len(), n);
        prop_assert_eq!(a.customers, b.customers);
    }

    #[test]
    fn rolling_mean_keeps_length(values in prop::collection::vec(-1e3..1e3_f64, 1..200), window in 1usize..40) {
        let rm = rolling_mean(&values, window);
        prop_assert_eq!(rm.len(), values.len());
        for (i, v) in rm.iter().enumerate() {
            prop_assert_eq!(v.is_nan(), i + 1 < window);
        }
    }

    #[test]
    fn quintiles_are_balanced(values in prop::collection::vec(-1e6..1e6_f64, 1..300)) {
        let q = quintiles(&values);
        prop_assert!(q.iter().all(|&v| (1..=5).contains(&v)));
        let counts: Vec<usize> = (1..=5u8).map(|b| q.iter().filter(|&&v| v == b).count()).collect();
        let (lo, hi) = (counts.iter().min().unwrap(), counts.iter().max().unwrap());
        prop_assert!(values.len() < 5 || hi - lo <= 1);
    }

    #[test]
    fn flag_count_matches_fraction(scores in prop::collection::vec(-10.0..10.0_f64, 0..300), fraction in 0.0..=1.0_f64) {
        let flags = flag_lowest(&scores, fraction);
        let expected = (fraction * scores.len() as f64).round() as usize;
        prop_assert_eq!(flags.iter().filter(|&&f| f).count(), expected);

        let worst_unflagged = scores.iter().zip(&flags).filter(|(_, &f)| !f).map(|(&s, _)| s).fold(f64::INFINITY, f64::min);
        prop_assert!(scores.iter().zip(&flags).filter(|(_, &f)| f).all(|(&s, _)| s <= worst_unflagged));
    }

    #[test]
    fn kmeans_labels_cover_every_row(rows in points_strategy(3, 60), k in 1usize..4, seed in any::<u64>()) {
        let config = KMeansConfig::default().k(k).n_init(2).seed(seed);
        let result = kmeans(&rows, &config).unwrap();
        prop_assert_eq!(result.labels.len(), rows.len());
        prop_assert!(result.labels.iter().all(|&l| l < k));
        prop_assert_eq!(result.cluster_sizes().iter().sum::<usize>(), rows.len());
        prop_assert!(result.inertia >= 0.0);
        prop_assert_eq!(kmeans(&rows, &config).unwrap(), result);
    }

    #[test]
    fn scaler_inverse_recovers_rows(rows in points_strategy(2, 40)) {
        let (scaler, scaled) = StandardScaler::fit_transform(&rows).unwrap();
        for (raw, z) in rows.iter().zip(&scaled) {
            let back = scaler.inverse_row(z).unwrap();
            for (a, b) in raw.iter().zip(&back) {
                prop_assert!((a - b).abs() < 1e-9 * (1.0 + a.abs()));
            }
        }
    }

    #[test]
    fn split_partitions_indices(n in 2usize..500, fraction in 0.01..0.5_f64, seed in any::<u64>()) {
        let (train, test) = train_test_split(n, fraction, seed).unwrap();
        prop_assert_eq!(train.len() + test.len(), n);
        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        prop_assert_eq!(all, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn tokens_are_lowercase_words(text in "[A-Za-zÇĞİÖŞÜçğıöşü0-9 ,.!?_-]{0,80}") {
        for token in tokenize(&text) {
            prop_assert!(token.chars().count() >= 2);
            prop_assert_eq!(token.to_lowercase(), token.clone());
        }
    }

    #[test]
    fn appends_accumulate_rows(batches in prop::collection::vec(0usize..10, 1..8)) {
        let store = MemoryStore::new();
        for (b, &size) in batches.iter().enumerate() {
            let rows = (0..size).map(|i| vec![format!("{b}-{i}")]).collect();
            store.append("t", Table::with_rows(["id"], rows).unwrap()).unwrap();
        }
        prop_assert_eq!(store.read("t").unwrap().len(), batches.iter().sum::<usize>());
    }
}
