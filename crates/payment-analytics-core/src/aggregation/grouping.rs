use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::bucket::{AggregationBucket, BucketAccumulator, BucketSums, OTHERS_KEY, UNKNOWN_KEY};
use crate::model::Transaction;
use crate::types::Money;

/// Separator between the parts of a composite bucket key.
pub const KEY_SEPARATOR: char = '/';

/// Field (or pair of fields) used to partition transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Gateway,
    Method,
    #[serde(alias = "emiType")]
    EmiType,
    #[serde(alias = "cardType")]
    CardType,
    #[serde(alias = "failureReason")]
    FailureReason,
    #[serde(alias = "date")]
    Day,
    /// `method/emiType`
    #[serde(alias = "methodEmiType")]
    MethodEmiType,
    /// `gateway/method`
    #[serde(alias = "gatewayMethod")]
    GatewayMethod,
}

impl Dimension {
    /// Bucket key of `tx`. Missing values map to `"Unknown"` so that every
    /// transaction lands in exactly one bucket.
    pub fn key_for(&self, tx: &Transaction) -> String {
        match self {
            Dimension::Gateway => or_unknown(tx.gateway.as_deref()),
            Dimension::Method => or_unknown(tx.method.as_deref()),
            Dimension::EmiType => or_unknown(tx.effective_emi_type()),
            Dimension::CardType => or_unknown(tx.effective_card_type()),
            Dimension::FailureReason => or_unknown(tx.effective_failure_reason()),
            Dimension::Day => day_key(tx),
            Dimension::MethodEmiType => composite(tx.method.as_deref(), tx.effective_emi_type()),
            Dimension::GatewayMethod => composite(tx.gateway.as_deref(), tx.method.as_deref()),
        }
    }

    /// Calendar dimensions plot in date order; everything else in rank order.
    pub fn is_chronological(&self) -> bool {
        matches!(self, Dimension::Day)
    }

    /// Whether a value `tx` actually carries for this dimension is one of the
    /// reserved keys, and so would share a bucket it does not belong to.
    pub fn has_reserved_value(&self, tx: &Transaction) -> bool {
        let reserved = |v: Option<&str>| matches!(v.map(str::trim), Some(OTHERS_KEY | UNKNOWN_KEY));
        match self {
            Dimension::Gateway => reserved(tx.gateway.as_deref()),
            Dimension::Method => reserved(tx.method.as_deref()),
            Dimension::EmiType => reserved(tx.effective_emi_type()),
            Dimension::CardType => reserved(tx.effective_card_type()),
            Dimension::FailureReason => reserved(tx.effective_failure_reason()),
            Dimension::Day => false,
            Dimension::MethodEmiType => reserved(tx.method.as_deref()) || reserved(tx.effective_emi_type()),
            Dimension::GatewayMethod => reserved(tx.gateway.as_deref()) || reserved(tx.method.as_deref()),
        }
    }

    /// Keys of this dimension are two values joined by [`KEY_SEPARATOR`].
    pub fn is_composite(&self) -> bool {
        matches!(self, Dimension::MethodEmiType | Dimension::GatewayMethod)
    }
}

/// `YYYY-MM-DD` of the transaction, ignoring time of day.
pub fn day_key(tx: &Transaction) -> String {
    tx.day().format("%Y-%m-%d").to_string()
}

fn or_unknown(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => UNKNOWN_KEY.to_string(),
    }
}

fn composite(first: Option<&str>, second: Option<&str>) -> String {
    format!("{}{}{}", or_unknown(first), KEY_SEPARATOR, or_unknown(second))
}

/// Primary dimension plus an optional secondary dimension recorded inside
/// each bucket for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub dimension: Dimension,
    #[serde(default, alias = "subBreakdown")]
    pub sub_breakdown: Option<Dimension>,
}

impl GroupSpec {
    pub fn by(dimension: Dimension) -> Self {
        Self {
            dimension,
            sub_breakdown: None,
        }
    }

    pub fn with_breakdown(mut self, sub: Dimension) -> Self {
        self.sub_breakdown = Some(sub);
        self
    }
}

/// Partition `transactions` in a single pass. Buckets come back in key order.
pub fn group_transactions(transactions: &[Transaction], spec: &GroupSpec) -> Vec<AggregationBucket> {
    let mut accumulators: BTreeMap<String, BucketAccumulator> = BTreeMap::new();

    for tx in transactions {
        let key = spec.dimension.key_for(tx);
        let sub_key = spec.sub_breakdown.map(|d| d.key_for(tx));
        accumulators
            .entry(key)
            .or_insert_with_key(|k| BucketAccumulator::new(k.clone()))
            .record(tx, sub_key);
    }

    let buckets: Vec<AggregationBucket> = accumulators
        .into_values()
        .map(BucketAccumulator::freeze)
        .collect();

    debug!(
        dimension = ?spec.dimension,
        sub_breakdown = ?spec.sub_breakdown,
        transactions = transactions.len(),
        buckets = buckets.len(),
        "grouped transactions"
    );
    buckets
}

/// Totals over the whole filtered collection; the denominator for
/// percentage-of-volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrandTotals {
    pub count: u64,
    pub total_amount: Money,
}

impl GrandTotals {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut sums = BucketSums::default();
        for tx in transactions {
            sums.record(tx);
        }
        Self::from(&sums)
    }

    pub fn from_buckets<'a>(buckets: impl IntoIterator<Item = &'a AggregationBucket>) -> Self {
        buckets.into_iter().fold(Self::default(), |acc, b| Self {
            count: acc.count.saturating_add(b.count()),
            total_amount: acc.total_amount.saturating_add(b.total_amount()),
        })
    }
}

impl From<&BucketSums> for GrandTotals {
    fn from(sums: &BucketSums) -> Self {
        Self {
            count: sums.count(),
            total_amount: sums.total_amount(),
        }
    }
}
