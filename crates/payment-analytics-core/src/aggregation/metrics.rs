//! Metric derivation.
//!
//! - **Volume percent** -- bucket amount / grand total amount * 100
//! - **Status rates** -- status count / bucket count * 100
//! - **Refund rate** -- status `refund` count / bucket count * 100
//! - **Refunded overlay rate** -- `is_refunded` count / bucket count * 100,
//!   independent of status
//!
//! Zero denominators yield zero. Merged buckets always get their rates from
//! merged raw sums, never from averaging already-derived rates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::bucket::{AggregationBucket, BucketSums};
use super::grouping::GrandTotals;
use crate::model::PaymentStatus;
use crate::types::{count_percent, percent_of, Money, Percent};

/// Derived metrics of one set of sums.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub count: u64,
    pub volume: Money,
    pub volume_percent: Percent,
    pub success_rate: Percent,
    pub failure_rate: Percent,
    pub pending_rate: Percent,
    pub refund_rate: Percent,
    pub refunded_overlay_rate: Percent,
    pub policy_count: u64,
}

/// One status within a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMetrics {
    pub status: PaymentStatus,
    pub count: u64,
    pub amount: Money,
    /// Status amount as a share of the grand total amount.
    pub volume_percent: Percent,
    /// Status count as a share of the bucket count.
    pub share: Percent,
}

/// One sub-breakdown entry with its own metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedBreakdown {
    pub key: String,
    pub metrics: DerivedMetrics,
    /// Entry count as a share of the parent bucket count.
    pub share: Percent,
}

/// A frozen bucket together with its derived metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedBucket {
    pub bucket: AggregationBucket,
    pub metrics: DerivedMetrics,
    pub statuses: Vec<StatusMetrics>,
    pub sub_breakdown: Vec<DerivedBreakdown>,
}

impl DerivedBucket {
    pub fn key(&self) -> &str {
        self.bucket.key()
    }

    pub fn status(&self, status: PaymentStatus) -> Option<&StatusMetrics> {
        self.statuses.iter().find(|s| s.status == status)
    }

    pub fn breakdown(&self, key: &str) -> Option<&DerivedBreakdown> {
        self.sub_breakdown.iter().find(|b| b.key == key)
    }
}

/// Derive metrics for every bucket against the same grand totals.
pub fn derive_metrics(buckets: Vec<AggregationBucket>, totals: &GrandTotals) -> Vec<DerivedBucket> {
    buckets
        .into_iter()
        .map(|b| derive_bucket(b, totals))
        .collect()
}

/// Derive metrics for one bucket.
pub fn derive_bucket(bucket: AggregationBucket, totals: &GrandTotals) -> DerivedBucket {
    let metrics = metrics_for(bucket.sums(), totals);

    let statuses = PaymentStatus::ALL
        .iter()
        .map(|&status| {
            let tally = bucket.status(status);
            StatusMetrics {
                status,
                count: tally.count,
                amount: tally.amount,
                volume_percent: percent_of(tally.amount, totals.total_amount),
                share: count_percent(tally.count, bucket.count()),
            }
        })
        .collect();

    let sub_breakdown = bucket
        .sub_breakdown()
        .iter()
        .map(|(key, sums)| DerivedBreakdown {
            key: key.clone(),
            metrics: metrics_for(sums, totals),
            share: count_percent(sums.count(), bucket.count()),
        })
        .collect();

    DerivedBucket {
        bucket,
        metrics,
        statuses,
        sub_breakdown,
    }
}

/// Metrics of a set of raw sums.
pub fn metrics_for(sums: &BucketSums, totals: &GrandTotals) -> DerivedMetrics {
    let count = sums.count();
    DerivedMetrics {
        count,
        volume: sums.total_amount(),
        volume_percent: percent_of(sums.total_amount(), totals.total_amount),
        success_rate: count_percent(sums.status(PaymentStatus::Success).count, count),
        failure_rate: count_percent(sums.status(PaymentStatus::Failure).count, count),
        pending_rate: count_percent(sums.status(PaymentStatus::Pending).count, count),
        refund_rate: count_percent(sums.status(PaymentStatus::Refund).count, count),
        refunded_overlay_rate: count_percent(sums.refunded_overlay().count, count),
        policy_count: sums.policy_count(),
    }
}

/// Count-weighted combination of two rates. Equal to the rate recomputed
/// from the two buckets' combined counts.
pub fn weighted_rate(rate_a: Percent, count_a: u64, rate_b: Percent, count_b: u64) -> Percent {
    let total = count_a + count_b;
    if total == 0 {
        return Decimal::ZERO;
    }
    (rate_a * Decimal::from(count_a) + rate_b * Decimal::from(count_b)) / Decimal::from(total)
}
