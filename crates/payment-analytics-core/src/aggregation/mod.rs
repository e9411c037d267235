pub mod bucket;
pub mod grouping;
pub mod metrics;
pub mod ranking;

pub use bucket::{AggregationBucket, BucketSums, Tally, OTHERS_KEY, UNKNOWN_KEY};
pub use grouping::{group_transactions, Dimension, GrandTotals, GroupSpec};
pub use metrics::{derive_metrics, DerivedBucket, DerivedMetrics};
pub use ranking::{rank_and_collapse, RankConfig, RankMetric};
