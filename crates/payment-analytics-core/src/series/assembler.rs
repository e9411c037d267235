//! Series assembly.
//!
//! Turns the final bucket list into named series of `(bucket key, value)`
//! points. The selection decides how many series are produced:
//! - `Overall` -- one series read from each bucket's own metrics
//! - `Statuses` -- one series per selected payment status
//! - `SubCategories` -- one series per selected sub-breakdown key
//!
//! Unselected categories never produce a series. A selected sub-category that
//! is absent from a bucket contributes zero at that bucket.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::labels::{bucket_label, color_for, display_name, PRIMARY_COLOR};
use crate::aggregation::grouping::Dimension;
use crate::aggregation::metrics::{DerivedBucket, DerivedMetrics, StatusMetrics};
use crate::model::PaymentStatus;
use crate::types::count_percent;

// ---------------------------------------------------------------------------
// Series request
// ---------------------------------------------------------------------------

/// Value plotted for each point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMetric {
    #[default]
    Count,
    Volume,
    #[serde(alias = "volumePercent", alias = "percentVolume")]
    VolumePercent,
    #[serde(alias = "successRate")]
    SuccessRate,
    #[serde(alias = "failureRate")]
    FailureRate,
    #[serde(alias = "pendingRate")]
    PendingRate,
    #[serde(alias = "refundRate")]
    RefundRate,
    #[serde(alias = "policyCount")]
    PolicyCount,
    /// Count share: of all buckets for `Overall`, of the parent bucket
    /// otherwise.
    Share,
}

impl SeriesMetric {
    pub fn label(&self) -> &'static str {
        match self {
            SeriesMetric::Count => "Transactions",
            SeriesMetric::Volume => "Volume",
            SeriesMetric::VolumePercent => "Volume %",
            SeriesMetric::SuccessRate => "Success Rate",
            SeriesMetric::FailureRate => "Failure Rate",
            SeriesMetric::PendingRate => "Pending Rate",
            SeriesMetric::RefundRate => "Refund Rate",
            SeriesMetric::PolicyCount => "Policies",
            SeriesMetric::Share => "Share",
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            SeriesMetric::Count => "count",
            SeriesMetric::Volume => "volume",
            SeriesMetric::VolumePercent => "volume_percent",
            SeriesMetric::SuccessRate => "success_rate",
            SeriesMetric::FailureRate => "failure_rate",
            SeriesMetric::PendingRate => "pending_rate",
            SeriesMetric::RefundRate => "refund_rate",
            SeriesMetric::PolicyCount => "policy_count",
            SeriesMetric::Share => "share",
        }
    }

    /// Read from a bucket's or breakdown entry's metrics. `share` is supplied
    /// by the caller since its denominator depends on the selection.
    fn read(&self, m: &DerivedMetrics, share: Decimal) -> Decimal {
        match self {
            SeriesMetric::Count => Decimal::from(m.count),
            SeriesMetric::Volume => m.volume,
            SeriesMetric::VolumePercent => m.volume_percent,
            SeriesMetric::SuccessRate => m.success_rate,
            SeriesMetric::FailureRate => m.failure_rate,
            SeriesMetric::PendingRate => m.pending_rate,
            SeriesMetric::RefundRate => m.refund_rate,
            SeriesMetric::PolicyCount => Decimal::from(m.policy_count),
            SeriesMetric::Share => share,
        }
    }

    /// Read for a single status. Rates collapse to the status's share of the
    /// bucket, which is that status's own rate.
    fn read_status(&self, s: Option<&StatusMetrics>) -> Decimal {
        let Some(s) = s else {
            return Decimal::ZERO;
        };
        match self {
            SeriesMetric::Count => Decimal::from(s.count),
            SeriesMetric::Volume => s.amount,
            SeriesMetric::VolumePercent => s.volume_percent,
            SeriesMetric::PolicyCount => Decimal::ZERO,
            SeriesMetric::SuccessRate
            | SeriesMetric::FailureRate
            | SeriesMetric::PendingRate
            | SeriesMetric::RefundRate
            | SeriesMetric::Share => s.share,
        }
    }
}

/// Which series to emit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "values")]
pub enum SeriesSelection {
    #[default]
    Overall,
    Statuses(Vec<PaymentStatus>),
    #[serde(alias = "subCategories")]
    SubCategories(Vec<String>),
}

/// Point order within every series. Ignored for calendar dimensions, which
/// always plot chronologically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesOrder {
    /// Ascending by bucket key (calendar dimensions).
    Chronological,
    /// Order of the incoming buckets, i.e. ranking order.
    #[default]
    Rank,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesSpec {
    #[serde(default)]
    pub selection: SeriesSelection,
    #[serde(default)]
    pub metric: SeriesMetric,
    #[serde(default)]
    pub order: SeriesOrder,
}

impl SeriesSpec {
    pub fn overall(metric: SeriesMetric, order: SeriesOrder) -> Self {
        Self {
            selection: SeriesSelection::Overall,
            metric,
            order,
        }
    }

    pub fn statuses(statuses: Vec<PaymentStatus>, metric: SeriesMetric, order: SeriesOrder) -> Self {
        Self {
            selection: SeriesSelection::Statuses(statuses),
            metric,
            order,
        }
    }

    pub fn sub_categories(keys: Vec<String>, metric: SeriesMetric, order: SeriesOrder) -> Self {
        Self {
            selection: SeriesSelection::SubCategories(keys),
            metric,
            order,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub key: String,
    pub label: String,
    pub value: Decimal,
}

/// One line, bar group or pie of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    pub display_name: String,
    pub color: String,
    pub metric: SeriesMetric,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn value_at(&self, key: &str) -> Option<Decimal> {
        self.points.iter().find(|p| p.key == key).map(|p| p.value)
    }

    pub fn total(&self) -> Decimal {
        self.points.iter().map(|p| p.value).sum()
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Map `buckets`, grouped by `dimension`, to the series described by `spec`.
pub fn assemble_series(buckets: &[DerivedBucket], dimension: Dimension, spec: &SeriesSpec) -> Vec<Series> {
    let ordered = order_buckets(buckets, effective_order(dimension, spec.order));
    let metric = spec.metric;

    match &spec.selection {
        SeriesSelection::Overall => {
            let total_count: u64 = ordered.iter().map(|b| b.metrics.count).sum();
            vec![Series {
                id: metric.id().to_string(),
                display_name: metric.label().to_string(),
                color: PRIMARY_COLOR.to_string(),
                metric,
                points: points(&ordered, dimension, |b| metric.read(&b.metrics, count_percent(b.metrics.count, total_count))),
            }]
        }
        SeriesSelection::Statuses(statuses) => dedup(statuses)
            .into_iter()
            .enumerate()
            .map(|(i, status)| {
                let key = status.as_str();
                Series {
                    id: key.to_string(),
                    display_name: display_name(key),
                    color: color_for(key, i).to_string(),
                    metric,
                    points: points(&ordered, dimension, |b| metric.read_status(b.status(status))),
                }
            })
            .collect(),
        SeriesSelection::SubCategories(keys) => dedup(keys)
            .into_iter()
            .enumerate()
            .map(|(i, key)| Series {
                id: key.clone(),
                display_name: display_name(&key),
                color: color_for(&key, i).to_string(),
                metric,
                points: points(&ordered, dimension, |b| {
                    b.breakdown(&key)
                        .map_or(Decimal::ZERO, |e| metric.read(&e.metrics, e.share))
                }),
            })
            .collect(),
    }
}

fn points(
    buckets: &[&DerivedBucket],
    dimension: Dimension,
    value: impl Fn(&DerivedBucket) -> Decimal,
) -> Vec<SeriesPoint> {
    buckets
        .iter()
        .map(|b| SeriesPoint {
            key: b.key().to_string(),
            label: bucket_label(b.key(), dimension),
            value: value(b),
        })
        .collect()
}

/// Calendar dimensions are always chronological, whatever was requested.
pub fn effective_order(dimension: Dimension, requested: SeriesOrder) -> SeriesOrder {
    if dimension.is_chronological() {
        SeriesOrder::Chronological
    } else {
        requested
    }
}

fn order_buckets(buckets: &[DerivedBucket], order: SeriesOrder) -> Vec<&DerivedBucket> {
    let mut ordered: Vec<&DerivedBucket> = buckets.iter().collect();
    if order == SeriesOrder::Chronological {
        // Others stays last even in date order.
        ordered.sort_by(|a, b| {
            (a.bucket.is_others(), a.key()).cmp(&(b.bucket.is_others(), b.key()))
        });
    }
    ordered
}

fn dedup<T: Clone + PartialEq>(values: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(v) {
            out.push(v.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::grouping::{group_transactions, Dimension, GrandTotals, GroupSpec};
    use crate::aggregation::metrics::derive_metrics;
    use crate::model::{parse_timestamp, Transaction};
    use crate::types::Money;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn tx(date: &str, method: &str, emi: Option<&str>, amount: Money, status: PaymentStatus) -> Transaction {
        let mut t = Transaction::new("t", parse_timestamp(date).unwrap(), amount, status);
        t.gateway = Some("PayU".into());
        t.method = Some(method.into());
        t.emi_type = emi.map(String::from);
        t
    }

    fn daily(txs: &[Transaction], sub: Option<Dimension>) -> Vec<DerivedBucket> {
        let totals = GrandTotals::from_transactions(txs);
        let spec = GroupSpec {
            dimension: Dimension::Day,
            sub_breakdown: sub,
        };
        derive_metrics(group_transactions(txs, &spec), &totals)
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx("2024-05-02", "creditCard", Some("noCost"), dec!(100), PaymentStatus::Success),
            tx("2024-05-01", "creditCard", Some("standard"), dec!(200), PaymentStatus::Failure),
            tx("2024-05-01", "debitCard", Some("standard"), dec!(300), PaymentStatus::Success),
            tx("2024-05-02", "upi", None, dec!(400), PaymentStatus::Success),
        ]
    }

    #[test]
    fn test_overall_chronological() {
        let mut buckets = daily(&sample(), None);
        buckets.reverse();
        let series = assemble_series(
            &buckets,
            Dimension::Day,
            &SeriesSpec::overall(SeriesMetric::VolumePercent, SeriesOrder::Chronological),
        );
        assert_eq!(series.len(), 1);
        let keys: Vec<&str> = series[0].points.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-05-01", "2024-05-02"]);
        assert_eq!(series[0].value_at("2024-05-01"), Some(dec!(50)));
        assert_eq!(series[0].display_name, "Volume %");
    }

    fn by_method(txs: &[Transaction]) -> Vec<DerivedBucket> {
        let totals = GrandTotals::from_transactions(txs);
        derive_metrics(group_transactions(txs, &GroupSpec::by(Dimension::Method)), &totals)
    }

    #[test]
    fn test_rank_order_preserved() {
        let mut buckets = by_method(&sample());
        buckets.reverse();
        let series = assemble_series(
            &buckets,
            Dimension::Method,
            &SeriesSpec::overall(SeriesMetric::Count, SeriesOrder::Rank),
        );
        let keys: Vec<&str> = series[0].points.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["upi", "debitCard", "creditCard"]);
        assert_eq!(series[0].points[0].label, "UPI");
    }

    #[test]
    fn test_day_points_chronological_even_when_rank_requested() {
        let mut buckets = daily(&sample(), None);
        buckets.reverse();
        let series = assemble_series(
            &buckets,
            Dimension::Day,
            &SeriesSpec::overall(SeriesMetric::Count, SeriesOrder::Rank),
        );
        assert_eq!(series[0].points[0].key, "2024-05-01");
        assert_eq!(effective_order(Dimension::Day, SeriesOrder::Rank), SeriesOrder::Chronological);
        assert_eq!(effective_order(Dimension::Gateway, SeriesOrder::Rank), SeriesOrder::Rank);
    }

    #[test]
    fn test_composite_point_labels() {
        let txs = sample();
        let totals = GrandTotals::from_transactions(&txs);
        let buckets = derive_metrics(
            group_transactions(&txs, &GroupSpec::by(Dimension::MethodEmiType)),
            &totals,
        );
        let series = assemble_series(&buckets, Dimension::MethodEmiType, &SeriesSpec::default());
        let label = series[0]
            .points
            .iter()
            .find(|p| p.key == "creditCard/noCost")
            .map(|p| p.label.as_str());
        assert_eq!(label, Some("Credit Card · No Cost EMI"));
    }

    #[test]
    fn test_one_series_per_status() {
        let buckets = daily(&sample(), None);
        let spec = SeriesSpec::statuses(
            vec![PaymentStatus::Success, PaymentStatus::Failure],
            SeriesMetric::Count,
            SeriesOrder::Chronological,
        );
        let series = assemble_series(&buckets, Dimension::Day, &spec);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].id, "success");
        assert_eq!(series[0].value_at("2024-05-02"), Some(dec!(2)));
        assert_eq!(series[1].value_at("2024-05-01"), Some(dec!(1)));
        assert_eq!(series[1].value_at("2024-05-02"), Some(dec!(0)));
    }

    #[test]
    fn test_status_rate_is_share() {
        let buckets = daily(&sample(), None);
        let spec = SeriesSpec::statuses(
            vec![PaymentStatus::Failure],
            SeriesMetric::FailureRate,
            SeriesOrder::Chronological,
        );
        let series = assemble_series(&buckets, Dimension::Day, &spec);
        assert_eq!(series[0].value_at("2024-05-01"), Some(dec!(50)));
    }

    #[test]
    fn test_sub_categories_only_selected_and_zero_when_absent() {
        let buckets = daily(&sample(), Some(Dimension::EmiType));
        let spec = SeriesSpec::sub_categories(
            vec!["noCost".into(), "shopse".into()],
            SeriesMetric::Count,
            SeriesOrder::Chronological,
        );
        let series = assemble_series(&buckets, Dimension::Day, &spec);
        let ids: Vec<&str> = series.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["noCost", "shopse"]);
        assert_eq!(series[0].display_name, "No Cost EMI");
        assert_eq!(series[0].value_at("2024-05-01"), Some(dec!(0)));
        assert_eq!(series[0].value_at("2024-05-02"), Some(dec!(1)));
        assert_eq!(series[1].total(), dec!(0));
        assert_eq!(series[1].color, "#F59E0B");
    }

    #[test]
    fn test_overall_share_sums_to_hundred() {
        let buckets = daily(&sample(), None);
        let series = assemble_series(&buckets, Dimension::Day, &SeriesSpec::overall(SeriesMetric::Share, SeriesOrder::Rank));
        assert_eq!(series[0].total(), dec!(100));
    }

    #[test]
    fn test_duplicate_selection_emitted_once() {
        let buckets = daily(&sample(), None);
        let spec = SeriesSpec::statuses(
            vec![PaymentStatus::Success, PaymentStatus::Success],
            SeriesMetric::Count,
            SeriesOrder::Rank,
        );
        assert_eq!(assemble_series(&buckets, Dimension::Day, &spec).len(), 1);
    }

    #[test]
    fn test_empty_buckets() {
        let series = assemble_series(&[], Dimension::Gateway, &SeriesSpec::default());
        assert_eq!(series.len(), 1);
        assert!(series[0].points.is_empty());
        let spec = SeriesSpec::sub_categories(vec!["upi".into()], SeriesMetric::Volume, SeriesOrder::Rank);
        assert!(assemble_series(&[], Dimension::Gateway, &spec)[0].points.is_empty());
    }

    #[test]
    fn test_selection_json_shape() {
        let s: SeriesSelection =
            serde_json::from_str(r#"{"kind": "statuses", "values": ["success", "failed"]}"#).unwrap();
        assert_eq!(s, SeriesSelection::Statuses(vec![PaymentStatus::Success, PaymentStatus::Failure]));
        let s: SeriesSelection = serde_json::from_str(r#"{"kind": "overall"}"#).unwrap();
        assert_eq!(s, SeriesSelection::Overall);
    }
}
