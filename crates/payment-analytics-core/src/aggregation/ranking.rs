//! Top-N ranking with an "Others" tail.
//!
//! Buckets are sorted descending by the ranking metric (ties by key), the
//! first `limit` are kept and everything else is folded into one `"Others"`
//! bucket whose metrics are re-derived from the merged raw sums.
//!
//! An `"Others"` bucket that is already present never competes for a top
//! slot: it absorbs the overflow and stays last. Running the collapse again on
//! its own output is therefore a no-op.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use super::bucket::{AggregationBucket, OTHERS_KEY};
use super::grouping::GrandTotals;
use super::metrics::{derive_bucket, DerivedBucket};
use crate::error::AnalyticsError;
use crate::model::PaymentStatus;
use crate::AnalyticsResult;

pub const DEFAULT_LIMIT: i64 = 5;

/// Metric buckets are ranked by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    #[default]
    Volume,
    Count,
    #[serde(alias = "failureCount")]
    FailureCount,
    #[serde(alias = "successCount")]
    SuccessCount,
    #[serde(alias = "volumePercent")]
    VolumePercent,
    #[serde(alias = "successRate")]
    SuccessRate,
    #[serde(alias = "failureRate")]
    FailureRate,
}

impl RankMetric {
    pub fn value(&self, bucket: &DerivedBucket) -> Decimal {
        let m = &bucket.metrics;
        match self {
            RankMetric::Volume => m.volume,
            RankMetric::Count => Decimal::from(m.count),
            RankMetric::FailureCount => Decimal::from(bucket.bucket.status(PaymentStatus::Failure).count),
            RankMetric::SuccessCount => Decimal::from(bucket.bucket.status(PaymentStatus::Success).count),
            RankMetric::VolumePercent => m.volume_percent,
            RankMetric::SuccessRate => m.success_rate,
            RankMetric::FailureRate => m.failure_rate,
        }
    }
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// How many buckets survive and what decides the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankConfig {
    #[serde(default)]
    pub metric: RankMetric,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            metric: RankMetric::Volume,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl RankConfig {
    pub fn top(metric: RankMetric, limit: i64) -> Self {
        Self { metric, limit }
    }
}

pub fn validate_rank_config(config: &RankConfig) -> AnalyticsResult<()> {
    if config.limit < 0 {
        return Err(AnalyticsError::InvalidInput {
            field: "limit".into(),
            reason: format!("Top-N limit cannot be negative, got {}", config.limit),
        });
    }
    Ok(())
}

/// Descending by metric, then ascending by key.
pub fn compare_ranked(metric: RankMetric, a: &DerivedBucket, b: &DerivedBucket) -> Ordering {
    metric
        .value(b)
        .cmp(&metric.value(a))
        .then_with(|| a.key().cmp(b.key()))
}

/// Rank `buckets` and fold everything past `limit` into `"Others"`.
///
/// Returns at most `limit + 1` buckets. No `"Others"` bucket is produced when
/// nothing overflows and none was passed in.
pub fn rank_and_collapse(
    buckets: Vec<DerivedBucket>,
    config: &RankConfig,
    totals: &GrandTotals,
) -> AnalyticsResult<Vec<DerivedBucket>> {
    validate_rank_config(config)?;
    let limit = usize::try_from(config.limit).map_err(|_| AnalyticsError::InvalidInput {
        field: "limit".into(),
        reason: format!("Top-N limit out of range: {}", config.limit),
    })?;

    let (mut ranked, existing_others): (Vec<DerivedBucket>, Vec<DerivedBucket>) =
        buckets.into_iter().partition(|b| !b.bucket.is_others());
    ranked.sort_by(|a, b| compare_ranked(config.metric, a, b));

    let overflow = if ranked.len() > limit {
        ranked.split_off(limit)
    } else {
        Vec::new()
    };

    if overflow.is_empty() && existing_others.is_empty() {
        return Ok(ranked);
    }

    let folded = overflow.len();
    let tail: Vec<&AggregationBucket> = existing_others
        .iter()
        .chain(overflow.iter())
        .map(|b| &b.bucket)
        .collect();
    let others = derive_bucket(AggregationBucket::merge(OTHERS_KEY, tail), totals);

    debug!(
        kept = ranked.len(),
        folded,
        others_count = others.metrics.count,
        "collapsed buckets into Others"
    );

    ranked.push(others);
    Ok(ranked)
}
