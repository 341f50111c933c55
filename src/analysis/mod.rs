//! Descriptive analytics: calendar sales profiles, cluster profiles and RFM
//! scoring.

pub mod profile;
pub mod rfm;

pub use profile::{cluster_profiles, ClusterProfile, SalesProfile, DEFAULT_ROLLING_WINDOW, WEEKDAY_NAMES};
pub use rfm::{
    quintiles, rfm_scores, rfm_scores_for_dataset, segment_counts, RfmConfig, RfmScore, RfmSegment,
    RfmWeights,
};
