pub mod aggregation;
pub mod error;
pub mod filter;
pub mod model;
pub mod pipeline;
pub mod series;
pub mod summary;
pub mod types;

#[cfg(feature = "presets")]
pub mod presets;

pub use error::AnalyticsError;
pub use types::*;

/// Standard result type for all payment-analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
