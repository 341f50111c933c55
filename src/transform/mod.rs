//! Data transformations.
//!
//! Provides feature standardization and window functions.
//!
//! # Example
//!
//! ```
//! use mursis_analytics::transform::{rolling_mean, StandardScaler};
//!
//! let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
//!
//! // Rolling mean with window 3
//! let rm = rolling_mean(&series, 3);
//! assert!(rm[0].is_nan());
//!
//! // Column-wise scaling of a feature matrix
//! let rows = vec![vec![1.0, 10.0], vec![3.0, 30.0]];
//! let (scaler, scaled_rows) = StandardScaler::fit_transform(&rows).unwrap();
//! assert_eq!(scaler.dims(), 2);
//! assert_eq!(scaled_rows.len(), 2);
//! ```

pub mod scale;
pub mod window;

pub use scale::StandardScaler;
pub use window::{centered_moving_average, rolling_mean};
