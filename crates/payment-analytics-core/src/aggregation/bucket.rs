use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{PaymentStatus, Transaction};
use crate::types::Money;

/// Key of the synthetic bucket produced by top-N collapse.
///
/// Reserved: a real category whose value is literally `"Others"` is treated as
/// the tail bucket by ranking and merged with the overflow. The pipeline
/// reports such values as a warning.
pub const OTHERS_KEY: &str = "Others";

/// Key used when a transaction has no value for the grouping dimension.
///
/// Reserved like [`OTHERS_KEY`]: a real value `"Unknown"` shares the bucket of
/// missing values.
pub const UNKNOWN_KEY: &str = "Unknown";

/// Count and amount of a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub count: u64,
    pub amount: Money,
}

// Sums saturate instead of panicking. The pipeline rejects collections whose
// total would not fit (`filter::checked_total`), so saturation is only ever
// reached by direct callers grouping unchecked data.
impl Tally {
    fn add(&mut self, amount: Money) {
        self.count = self.count.saturating_add(1);
        self.amount = self.amount.saturating_add(amount);
    }

    fn merge(&mut self, other: &Tally) {
        self.count = self.count.saturating_add(other.count);
        self.amount = self.amount.saturating_add(other.amount);
    }
}

// ---------------------------------------------------------------------------
// Sums
// ---------------------------------------------------------------------------

/// Raw running sums for a bucket or a sub-breakdown entry.
///
/// Fields are read-only outside the crate; the only way to change them is
/// through accumulation or merging, which always produces a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSums {
    count: u64,
    total_amount: Money,
    status_counts: BTreeMap<PaymentStatus, Tally>,
    refunded_overlay: Tally,
    policy_count: u64,
}

impl BucketSums {
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status_counts(&self) -> &BTreeMap<PaymentStatus, Tally> {
        &self.status_counts
    }

    /// Tally for one status; zero when no transaction had it.
    pub fn status(&self, status: PaymentStatus) -> Tally {
        self.status_counts.get(&status).copied().unwrap_or_default()
    }

    /// Transactions flagged `is_refunded`, whatever their status.
    pub fn refunded_overlay(&self) -> Tally {
        self.refunded_overlay
    }

    pub fn policy_count(&self) -> u64 {
        self.policy_count
    }

    pub(crate) fn record(&mut self, tx: &Transaction) {
        self.count = self.count.saturating_add(1);
        self.total_amount = self.total_amount.saturating_add(tx.amount);
        self.status_counts.entry(tx.status).or_default().add(tx.amount);
        if tx.is_refunded {
            self.refunded_overlay.add(tx.amount);
        }
        if tx.has_policy {
            self.policy_count = self.policy_count.saturating_add(1);
        }
    }

    pub(crate) fn merge(&mut self, other: &BucketSums) {
        self.count = self.count.saturating_add(other.count);
        self.total_amount = self.total_amount.saturating_add(other.total_amount);
        for (status, tally) in &other.status_counts {
            self.status_counts.entry(*status).or_default().merge(tally);
        }
        self.refunded_overlay.merge(&other.refunded_overlay);
        self.policy_count = self.policy_count.saturating_add(other.policy_count);
    }
}

// ---------------------------------------------------------------------------
// Frozen bucket
// ---------------------------------------------------------------------------

/// A finalized group of transactions sharing a grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationBucket {
    key: String,
    #[serde(flatten)]
    sums: BucketSums,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    sub_breakdown: BTreeMap<String, BucketSums>,
}

impl AggregationBucket {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_others(&self) -> bool {
        self.key == OTHERS_KEY
    }

    pub fn sums(&self) -> &BucketSums {
        &self.sums
    }

    pub fn count(&self) -> u64 {
        self.sums.count
    }

    pub fn total_amount(&self) -> Money {
        self.sums.total_amount
    }

    pub fn status(&self, status: PaymentStatus) -> Tally {
        self.sums.status(status)
    }

    pub fn sub_breakdown(&self) -> &BTreeMap<String, BucketSums> {
        &self.sub_breakdown
    }

    /// Element-wise sum of `buckets` under a new key. Rates are never merged
    /// directly; they are re-derived from these sums.
    pub fn merge<'a>(key: impl Into<String>, buckets: impl IntoIterator<Item = &'a AggregationBucket>) -> Self {
        let mut acc = BucketAccumulator::new(key);
        for bucket in buckets {
            acc.absorb(bucket);
        }
        acc.freeze()
    }
}

// ---------------------------------------------------------------------------
// Accumulation phase
// ---------------------------------------------------------------------------

/// Mutable builder for one bucket. Lives only inside a grouping or merge pass.
#[derive(Debug)]
pub(crate) struct BucketAccumulator {
    key: String,
    sums: BucketSums,
    sub_breakdown: BTreeMap<String, BucketSums>,
}

impl BucketAccumulator {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            sums: BucketSums::default(),
            sub_breakdown: BTreeMap::new(),
        }
    }

    pub(crate) fn record(&mut self, tx: &Transaction, sub_key: Option<String>) {
        self.sums.record(tx);
        if let Some(sub) = sub_key {
            self.sub_breakdown.entry(sub).or_default().record(tx);
        }
    }

    pub(crate) fn absorb(&mut self, bucket: &AggregationBucket) {
        self.sums.merge(&bucket.sums);
        for (sub, sums) in &bucket.sub_breakdown {
            self.sub_breakdown.entry(sub.clone()).or_default().merge(sums);
        }
    }

    pub(crate) fn freeze(self) -> AggregationBucket {
        AggregationBucket {
            key: self.key,
            sums: self.sums,
            sub_breakdown: self.sub_breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_timestamp;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn tx(amount: Money, status: PaymentStatus, gateway: &str) -> Transaction {
        let mut t = Transaction::new("t", parse_timestamp("2024-05-01").unwrap(), amount, status);
        t.gateway = Some(gateway.into());
        t
    }

    fn bucket(key: &str, txs: &[Transaction]) -> AggregationBucket {
        let mut acc = BucketAccumulator::new(key);
        for t in txs {
            acc.record(t, t.gateway.clone());
        }
        acc.freeze()
    }

    #[test]
    fn test_accumulator_sums() {
        let mut refunded = tx(dec!(50), PaymentStatus::Success, "A");
        refunded.is_refunded = true;
        refunded.has_policy = true;
        let b = bucket(
            "creditCard",
            &[
                tx(dec!(100), PaymentStatus::Success, "A"),
                tx(dec!(300), PaymentStatus::Failure, "B"),
                refunded,
            ],
        );
        assert_eq!(b.count(), 3);
        assert_eq!(b.total_amount(), dec!(450));
        assert_eq!(b.status(PaymentStatus::Success), Tally { count: 2, amount: dec!(150) });
        assert_eq!(b.status(PaymentStatus::Pending), Tally::default());
        assert_eq!(b.sums().refunded_overlay().count, 1);
        assert_eq!(b.status(PaymentStatus::Refund).count, 0);
        assert_eq!(b.sums().policy_count(), 1);
        assert_eq!(b.sub_breakdown()["A"].count(), 2);
        assert_eq!(b.sub_breakdown()["B"].total_amount(), dec!(300));
    }

    #[test]
    fn test_merge_is_elementwise() {
        let a = bucket("A", &[tx(dec!(100), PaymentStatus::Success, "x")]);
        let b = bucket(
            "B",
            &[
                tx(dec!(10), PaymentStatus::Failure, "x"),
                tx(dec!(20), PaymentStatus::Success, "y"),
            ],
        );
        let merged = AggregationBucket::merge(OTHERS_KEY, [&a, &b]);
        assert!(merged.is_others());
        assert_eq!(merged.count(), 3);
        assert_eq!(merged.total_amount(), dec!(130));
        assert_eq!(merged.status(PaymentStatus::Success).count, 2);
        assert_eq!(merged.sub_breakdown()["x"].count(), 2);
        assert_eq!(merged.sub_breakdown()["y"].count(), 1);
    }

    #[test]
    fn test_merge_of_nothing_is_empty() {
        let merged = AggregationBucket::merge(OTHERS_KEY, []);
        assert_eq!(merged.count(), 0);
        assert_eq!(merged.total_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_sums_saturate_instead_of_panicking() {
        let b = bucket(
            "A",
            &[
                tx(Decimal::MAX, PaymentStatus::Success, "x"),
                tx(Decimal::MAX, PaymentStatus::Success, "x"),
            ],
        );
        assert_eq!(b.count(), 2);
        assert_eq!(b.total_amount(), Decimal::MAX);
        let merged = AggregationBucket::merge(OTHERS_KEY, [&b, &b]);
        assert_eq!(merged.status(PaymentStatus::Success).amount, Decimal::MAX);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let b = bucket("A", &[tx(dec!(100), PaymentStatus::Success, "x")]);
        let json = serde_json::to_string(&b).unwrap();
        let back: AggregationBucket = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }
}
