//! Customer clustering.
//!
//! Provides k-means with k-means++ seeding, silhouette-based selection of k
//! and a customer segmenter that keeps its scaler for scoring new records.
//!
//! # Example
//!
//! ```
//! use mursis_analytics::clustering::{kmeans, silhouette_score, KMeansConfig};
//!
//! let rows = vec![
//!     vec![1.0, 2.0],
//!     vec![1.1, 2.1],
//!     vec![10.0, 11.0],
//!     vec![10.1, 11.1],
//! ];
//! let result = kmeans(&rows, &KMeansConfig::default().k(2).seed(42)).unwrap();
//! assert_eq!(result.centroids.len(), 2);
//!
//! let score = silhouette_score(&rows, &result.labels).unwrap();
//! assert!(score > 0.9);
//! ```

pub mod distance;
pub mod kmeans;
pub mod segmenter;
pub mod silhouette;

pub use distance::{euclidean_distance, pairwise_distances, squared_euclidean};
pub use kmeans::{inertia, kmeans, KMeansConfig, KMeansResult};
pub use segmenter::{
    ClusterAssignment, CustomerSegmenter, SegmentationModel, Segmentation, SegmenterConfig,
};
pub use silhouette::{silhouette_scan, silhouette_score, SilhouetteScan};
