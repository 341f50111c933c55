//! Weighted recency / frequency / monetary scoring.
//!
//! Loyalty tenure stands in for recency (inverted), purchase frequency for
//! frequency and customer value for monetary value. Each becomes a 1–5
//! quintile score and the weighted mean of the three picks a segment.

use crate::core::CustomerRecord;
use crate::data::CustomerDataset;
use crate::error::{AnalyticsError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Relative weight of each score in the combined RFM score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RfmWeights {
    pub recency: f64,
    pub frequency: f64,
    pub monetary: f64,
}

impl Default for RfmWeights {
    fn default() -> Self {
        Self {
            recency: 0.5,
            frequency: 0.3,
            monetary: 0.2,
        }
    }
}

impl RfmWeights {
    pub fn new(recency: f64, frequency: f64, monetary: f64) -> Self {
        Self {
            recency,
            frequency,
            monetary,
        }
    }

    fn validate(&self) -> Result<f64> {
        let parts = [self.recency, self.frequency, self.monetary];
        let total: f64 = parts.iter().sum();
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) || total <= 0.0 {
            return Err(AnalyticsError::InvalidArgument(format!(
                "RFM weights must be non-negative with a positive sum, got {:?}",
                parts
            )));
        }
        Ok(total)
    }
}

/// RFM scoring settings.
#[derive(Debug, Clone)]
pub struct RfmConfig {
    pub weights: RfmWeights,
    /// Seed for the recency fallback draw.
    pub seed: u64,
}

impl Default for RfmConfig {
    fn default() -> Self {
        Self {
            weights: RfmWeights::default(),
            seed: 42,
        }
    }
}

impl RfmConfig {
    pub fn weights(mut self, weights: RfmWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Customer segment derived from the combined score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RfmSegment {
    Champions,
    LoyalCustomers,
    PotentialLoyalists,
    AtRisk,
    Hibernating,
}

impl RfmSegment {
    pub const ALL: [RfmSegment; 5] = [
        RfmSegment::Champions,
        RfmSegment::LoyalCustomers,
        RfmSegment::PotentialLoyalists,
        RfmSegment::AtRisk,
        RfmSegment::Hibernating,
    ];

    pub fn from_score(score: f64) -> Self {
        if score >= 4.5 {
            RfmSegment::Champions
        } else if score >= 4.0 {
            RfmSegment::LoyalCustomers
        } else if score >= 3.0 {
            RfmSegment::PotentialLoyalists
        } else if score >= 2.0 {
            RfmSegment::AtRisk
        } else {
            RfmSegment::Hibernating
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RfmSegment::Champions => "Champions",
            RfmSegment::LoyalCustomers => "Loyal Customers",
            RfmSegment::PotentialLoyalists => "Potential Loyalists",
            RfmSegment::AtRisk => "At Risk",
            RfmSegment::Hibernating => "Hibernating",
        }
    }
}

impl fmt::Display for RfmSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores of one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfmScore {
    pub customer_id: String,
    pub recency: u8,
    pub frequency: u8,
    pub monetary: u8,
    pub score: f64,
    pub segment: RfmSegment,
}

/// Quintile (1–5) of every value by ordinal rank; equal values keep input
/// order.
pub fn quintiles(values: &[f64]) -> Vec<u8> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut bins = vec![0u8; n];
    for (rank, &i) in order.iter().enumerate() {
        bins[i] = (rank * 5 / n) as u8 + 1;
    }
    bins
}

/// Score customers whose columns were all present in the source data.
pub fn rfm_scores(customers: &[CustomerRecord], config: &RfmConfig) -> Result<Vec<RfmScore>> {
    score_with_fallbacks(customers, &[], config)
}

/// Score a loaded dataset, substituting for columns the loader filled.
pub fn rfm_scores_for_dataset(dataset: &CustomerDataset, config: &RfmConfig) -> Result<Vec<RfmScore>> {
    score_with_fallbacks(&dataset.customers, &dataset.filled_columns, config)
}

fn score_with_fallbacks(
    customers: &[CustomerRecord],
    filled_columns: &[String],
    config: &RfmConfig,
) -> Result<Vec<RfmScore>> {
    let weight_total = config.weights.validate()?;
    if customers.is_empty() {
        return Err(AnalyticsError::InsufficientData { needed: 1, got: 0 });
    }
    let filled = |column: &str| filled_columns.iter().any(|c| c == column);
    let column = |f: fn(&CustomerRecord) -> f64| customers.iter().map(f).collect::<Vec<f64>>();

    let recency: Vec<u8> = if filled("loyalty_years") {
        warn!("loyalty_years was not supplied; recency scores are drawn at random");
        let mut rng = StdRng::seed_from_u64(config.seed);
        (0..customers.len()).map(|_| rng.gen_range(1..=5)).collect()
    } else {
        quintiles(&column(|c| c.loyalty_years))
            .into_iter()
            .map(|q| 6 - q)
            .collect()
    };
    let frequency = quintiles(&column(|c| c.purchase_frequency));
    let monetary = if filled("customer_value") {
        quintiles(&column(|c| c.avg_purchase_value))
    } else {
        quintiles(&column(|c| c.customer_value))
    };

    let w = config.weights;
    let scores: Vec<RfmScore> = customers
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let score = (recency[i] as f64 * w.recency
                + frequency[i] as f64 * w.frequency
                + monetary[i] as f64 * w.monetary)
                / weight_total;
            RfmScore {
                customer_id: c.customer_id.clone(),
                recency: recency[i],
                frequency: frequency[i],
                monetary: monetary[i],
                score,
                segment: RfmSegment::from_score(score),
            }
        })
        .collect();

    info!(customers = scores.len(), "RFM scores computed");
    Ok(scores)
}

/// Customers per segment, in [`RfmSegment::ALL`] order.
pub fn segment_counts(scores: &[RfmScore]) -> Vec<(RfmSegment, usize)> {
    RfmSegment::ALL
        .iter()
        .map(|&s| (s, scores.iter().filter(|r| r.segment == s).count()))
        .collect()
}
