//! Deterministic synthetic datasets.
//!
//! Every generator takes an explicit seed and draws from its own
//! [`StdRng`], so equal arguments always give equal data.

use crate::core::{CustomerRecord, Product, SalesRecord};
use crate::error::{AnalyticsError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;
use std::f64::consts::PI;
use tracing::debug;

/// Default seed used by the application shell.
pub const DEFAULT_SEED: u64 = 42;

/// Holiday bumps as `(year, month, day, extra sales)`.
const HOLIDAYS: [(i32, u32, u32, f64); 24] = [
    (2022, 1, 1, 100.0),
    (2022, 5, 2, 120.0),
    (2022, 5, 3, 150.0),
    (2022, 5, 4, 120.0),
    (2022, 7, 9, 120.0),
    (2022, 7, 10, 150.0),
    (2022, 7, 11, 140.0),
    (2022, 7, 12, 110.0),
    (2023, 1, 1, 110.0),
    (2023, 4, 21, 130.0),
    (2023, 4, 22, 160.0),
    (2023, 4, 23, 130.0),
    (2023, 6, 28, 130.0),
    (2023, 6, 29, 160.0),
    (2023, 6, 30, 150.0),
    (2023, 7, 1, 120.0),
    (2024, 1, 1, 120.0),
    (2024, 4, 10, 140.0),
    (2024, 4, 11, 170.0),
    (2024, 4, 12, 140.0),
    (2024, 6, 16, 140.0),
    (2024, 6, 17, 170.0),
    (2024, 6, 18, 160.0),
    (2024, 6, 19, 130.0),
];

const PROMOTION_MONTHS: [u32; 4] = [3, 6, 9, 12];
const PROMOTION_DAYS: u32 = 7;
const PROMOTION_BUMP: f64 = 80.0;
const SALES_NOISE_STD: f64 = 20.0;

/// Blob centers in (avg_purchase_value, purchase_frequency, return_rate).
const SEGMENT_CENTERS: [[f64; 3]; 5] = [
    [5000.0, 15.0, 0.3],
    [1000.0, 30.0, 0.1],
    [8000.0, 5.0, 0.05],
    [500.0, 2.0, 0.5],
    [3000.0, 12.0, 0.2],
];
/// Per-coordinate std as a fraction of the center.
const SEGMENT_SPREAD: [f64; 3] = [0.2, 0.3, 0.1];
/// Segment sizes for 1000 customers; other totals scale proportionally.
const SEGMENT_SIZES: [usize; 5] = [300, 250, 50, 100, 300];

/// First generated sales day.
pub fn sales_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Extra sales for a holiday, if `date` is one.
pub fn holiday_bump(date: NaiveDate) -> Option<f64> {
    HOLIDAYS
        .iter()
        .find(|(y, m, d, _)| date.year() == *y && date.month() == *m && date.day() == *d)
        .map(|(_, _, _, bump)| *bump)
}

/// Whether `date` falls in the first week of a promotion month.
pub fn is_promotion_day(date: NaiveDate) -> bool {
    PROMOTION_MONTHS.contains(&date.month()) && date.day() <= PROMOTION_DAYS
}

/// Generate `num_days` consecutive days of sales starting 2022-01-01.
///
/// sales = linear trend 100→300 + weekly and yearly sine waves + holiday and
/// promotion bumps + N(0, 20) noise, clamped at 0.
pub fn create_sample_sales_data(num_days: usize, seed: u64) -> Result<Vec<SalesRecord>> {
    if num_days == 0 {
        return Err(AnalyticsError::InvalidArgument(
            "num_days must be at least 1".into(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let noise = normal(0.0, SALES_NOISE_STD)?;
    let start = sales_start_date();
    let step = if num_days > 1 {
        200.0 / (num_days - 1) as f64
    } else {
        0.0
    };

    let records: Vec<SalesRecord> = (0..num_days)
        .map(|i| {
            let date = start + Duration::days(i as i64);
            let t = i as f64;
            let holiday = holiday_bump(date);
            let promotion = is_promotion_day(date);

            let sales = 100.0
                + step * t
                + 20.0 * (2.0 * PI * t / 7.0).sin()
                + 100.0 * (2.0 * PI * t / 365.0).sin()
                + holiday.unwrap_or(0.0)
                + if promotion { PROMOTION_BUMP } else { 0.0 }
                + noise.sample(&mut rng);

            SalesRecord::new(date, sales.max(0.0), holiday.is_some(), promotion)
        })
        .collect();

    debug!(days = num_days, seed, "generated sales data");
    Ok(records)
}

/// Synthetic customers together with the blob each was drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticCustomers {
    pub customers: Vec<CustomerRecord>,
    /// Generating segment index per customer.
    pub true_segments: Vec<usize>,
}

/// Split `total` across the reference segment sizes, largest remainder first.
pub fn segment_sizes(total: usize) -> [usize; 5] {
    let reference: usize = SEGMENT_SIZES.iter().sum();
    let mut sizes = [0usize; 5];
    let mut remainders = [(0usize, 0usize); 5];
    for (i, &size) in SEGMENT_SIZES.iter().enumerate() {
        let scaled = total * size;
        sizes[i] = scaled / reference;
        remainders[i] = (scaled % reference, i);
    }

    let assigned: usize = sizes.iter().sum();
    // Larger remainder first, earlier segment on ties
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, i) in remainders.iter().take(total - assigned) {
        sizes[i] += 1;
    }
    sizes
}

/// Generate `num_customers` customers from five Gaussian segments.
///
/// Per segment and customer three normal draws give apv, frequency and
/// return rate (negatives clipped to 0, return rate capped at 1). Loyalty,
/// basket size and discount share are then drawn uniformly for all
/// customers in order.
pub fn create_customer_data(num_customers: usize, seed: u64) -> Result<SyntheticCustomers> {
    if num_customers == 0 {
        return Err(AnalyticsError::InvalidArgument(
            "num_customers must be at least 1".into(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut blobs: Vec<[f64; 3]> = Vec::with_capacity(num_customers);
    let mut true_segments = Vec::with_capacity(num_customers);

    for (segment, &size) in segment_sizes(num_customers).iter().enumerate() {
        let center = SEGMENT_CENTERS[segment];
        let dists = [
            normal(center[0], center[0] * SEGMENT_SPREAD[0])?,
            normal(center[1], center[1] * SEGMENT_SPREAD[1])?,
            normal(center[2], center[2] * SEGMENT_SPREAD[2])?,
        ];
        for _ in 0..size {
            let apv = dists[0].sample(&mut rng).max(0.0);
            let freq = dists[1].sample(&mut rng).max(0.0);
            let rr = dists[2].sample(&mut rng).clamp(0.0, 1.0);
            blobs.push([apv, freq, rr]);
            true_segments.push(segment);
        }
    }

    let loyalty: Vec<f64> = Uniform::new(0.0, 10.0)
        .sample_iter(&mut rng)
        .take(num_customers)
        .collect();
    let basket: Vec<f64> = Uniform::new(1.0, 15.0)
        .sample_iter(&mut rng)
        .take(num_customers)
        .collect();
    let discount: Vec<f64> = Uniform::new(0.0, 0.7)
        .sample_iter(&mut rng)
        .take(num_customers)
        .collect();

    let customers = blobs
        .iter()
        .enumerate()
        .map(|(i, [apv, freq, rr])| {
            CustomerRecord::new(
                customer_id(i + 1),
                *apv,
                *freq,
                *rr,
                loyalty[i],
                basket[i],
                discount[i],
            )
        })
        .collect();

    debug!(customers = num_customers, seed, "generated customer data");
    Ok(SyntheticCustomers {
        customers,
        true_segments,
    })
}

/// Customer identifier for a 1-based position, e.g. `CUST_00001`.
pub fn customer_id(position: usize) -> String {
    format!("CUST_{:05}", position)
}

/// The built-in technology product catalog.
pub fn create_tech_product_data() -> Vec<Product> {
    vec![
        Product::new(
            101,
            "Gaming Laptop",
            "Intel i7 işlemci, 16GB RAM, NVIDIA RTX 3060 ekran kartı, 1TB SSD ile yüksek performanslı oyun deneyimi.",
        ),
        Product::new(
            102,
            "Ultrabook",
            "Intel i5 işlemci, 8GB RAM, hafif tasarım, 512GB SSD, uzun pil ömrü ile taşınabilirlik odaklı.",
        ),
        Product::new(
            103,
            "Akıllı Telefon",
            "Snapdragon işlemci, 128GB hafıza, 6.5 inç ekran, Android 13, 5000mAh batarya ile güçlü akıllı telefon.",
        ),
        Product::new(
            104,
            "Tablet",
            "10.1 inç ekran, 4GB RAM, 64GB depolama, hafif ve taşınabilir, Android tabanlı tablet.",
        ),
        Product::new(
            105,
            "Masaüstü Bilgisayar",
            "Ryzen 5 işlemci, 32GB RAM, 2TB SSD, 4K destekli ekran kartı ile ofis ve oyun için masaüstü bilgisayar.",
        ),
        Product::new(
            106,
            "Kulaklık",
            "Kablosuz bluetooth kulaklık, aktif gürültü engelleme, 40 saat pil ömrü.",
        ),
        Product::new(
            107,
            "Akıllı Saat",
            "1.43 inç AMOLED ekran, kalp ritmi takibi, adım sayar, 7 gün pil ömrü ile akıllı saat.",
        ),
    ]
}

fn normal(mean: f64, std: f64) -> Result<Normal> {
    Normal::new(mean, std).map_err(|e| {
        AnalyticsError::InvalidArgument(format!("normal({}, {}): {}", mean, std, e))
    })
}
