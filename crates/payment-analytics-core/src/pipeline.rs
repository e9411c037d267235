//! End-to-end chart computation.
//!
//! filter -> group -> derive -> rank/collapse (optional) -> assemble
//!
//! Configuration is validated before any transaction is touched. Each call
//! recomputes everything from the full collection it is given.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::aggregation::bucket::{OTHERS_KEY, UNKNOWN_KEY};
use crate::aggregation::grouping::{group_transactions, GrandTotals, GroupSpec};
use crate::aggregation::metrics::{derive_metrics, DerivedBucket};
use crate::aggregation::ranking::{rank_and_collapse, validate_rank_config, RankConfig};
use crate::filter::{filter_transactions, validate_criteria, FilterCriteria};
use crate::model::Transaction;
use crate::series::{assemble_series, Series, SeriesSpec};
use crate::summary::{summarize, DashboardSummary};
use crate::types::{with_metadata, ComputationOutput};
use crate::AnalyticsResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartRequest {
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub criteria: FilterCriteria,
    pub group: GroupSpec,
    /// Top-N collapse; `None` keeps every bucket.
    #[serde(default)]
    pub rank: Option<RankConfig>,
    #[serde(default)]
    pub series: SeriesSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartOutput {
    pub totals: GrandTotals,
    pub summary: DashboardSummary,
    pub buckets: Vec<DerivedBucket>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRequest {
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub criteria: FilterCriteria,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOutput {
    pub summary: DashboardSummary,
    pub transactions: Vec<Transaction>,
}

/// Echoed back as the envelope's assumptions; the transactions themselves
/// are reduced to their count.
#[derive(Serialize)]
struct ChartAssumptions<'a> {
    transaction_count: usize,
    criteria: &'a FilterCriteria,
    group: &'a GroupSpec,
    rank: &'a Option<RankConfig>,
    series: &'a SeriesSpec,
}

#[derive(Serialize)]
struct FilterAssumptions<'a> {
    transaction_count: usize,
    criteria: &'a FilterCriteria,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the whole pipeline for one chart.
pub fn build_chart(request: &ChartRequest) -> AnalyticsResult<ComputationOutput<ChartOutput>> {
    let start = Instant::now();

    validate_criteria(&request.criteria)?;
    if let Some(rank) = &request.rank {
        validate_rank_config(rank)?;
    }

    let filtered = filter_transactions(&request.transactions, &request.criteria)?;
    let mut warnings = data_warnings(&filtered);
    warnings.extend(reserved_key_warnings(&filtered, &request.group));

    let totals = GrandTotals::from_transactions(&filtered);
    let buckets = derive_metrics(group_transactions(&filtered, &request.group), &totals);
    let buckets = match &request.rank {
        Some(rank) => rank_and_collapse(buckets, rank, &totals)?,
        None => buckets,
    };
    let series = assemble_series(&buckets, request.group.dimension, &request.series);

    debug!(
        filtered = filtered.len(),
        buckets = buckets.len(),
        series = series.len(),
        "chart built"
    );

    let output = ChartOutput {
        totals,
        summary: summarize(&filtered),
        buckets,
        series,
    };

    let assumptions = ChartAssumptions {
        transaction_count: request.transactions.len(),
        criteria: &request.criteria,
        group: &request.group,
        rank: &request.rank,
        series: &request.series,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Filter, group, derive, top-N collapse and series assembly",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Filter only, with the summary cards. Feeds raw-transaction export.
pub fn filter_report(request: &FilterRequest) -> AnalyticsResult<ComputationOutput<FilterOutput>> {
    let start = Instant::now();

    let filtered = filter_transactions(&request.transactions, &request.criteria)?;
    let warnings = data_warnings(&filtered);

    let output = FilterOutput {
        summary: summarize(&filtered),
        transactions: filtered,
    };

    let assumptions = FilterAssumptions {
        transaction_count: request.transactions.len(),
        criteria: &request.criteria,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Transaction filter with summary cards",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Recoverable data oddities in the filtered set.
fn data_warnings(transactions: &[Transaction]) -> Vec<String> {
    let mut warnings = Vec::new();

    let ignored_emi = transactions.iter().filter(|t| t.has_ignored_emi_type()).count();
    if ignored_emi > 0 {
        warn!(count = ignored_emi, "EMI type on non-EMI method ignored");
        warnings.push(format!(
            "{ignored_emi} transaction(s) carry an EMI type on a method that is not EMI-eligible; the EMI type was ignored"
        ));
    }

    let ignored_reason = transactions
        .iter()
        .filter(|t| t.has_ignored_failure_reason())
        .count();
    if ignored_reason > 0 {
        warn!(count = ignored_reason, "failure reason on non-failed transaction ignored");
        warnings.push(format!(
            "{ignored_reason} non-failed transaction(s) carry a failure reason; the reason was ignored"
        ));
    }

    if transactions.is_empty() {
        warnings.push("No transactions match the filter criteria".into());
    }

    warnings
}

/// Real values that collide with the synthetic `"Others"` / `"Unknown"` keys.
fn reserved_key_warnings(transactions: &[Transaction], group: &GroupSpec) -> Vec<String> {
    let mut warnings = Vec::new();
    for dimension in std::iter::once(group.dimension).chain(group.sub_breakdown) {
        let count = transactions
            .iter()
            .filter(|t| dimension.has_reserved_value(t))
            .count();
        if count > 0 {
            warn!(count, ?dimension, "reserved key used as a category value");
            warnings.push(format!(
                "{count} transaction(s) carry the reserved value \"{OTHERS_KEY}\" or \"{UNKNOWN_KEY}\" for {dimension:?}; they share the synthetic bucket of that name"
            ));
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::grouping::Dimension;
    use crate::aggregation::ranking::RankMetric;
    use crate::error::AnalyticsError;
    use crate::filter::Selection;
    use crate::model::{parse_timestamp, PaymentStatus};
    use crate::series::{SeriesMetric, SeriesOrder};
    use crate::types::Money;
    use rust_decimal_macros::dec;

    fn tx(id: &str, gateway: &str, amount: Money, status: PaymentStatus) -> Transaction {
        let mut t = Transaction::new(id, parse_timestamp("2024-05-01T10:00:00").unwrap(), amount, status);
        t.gateway = Some(gateway.into());
        t.method = Some("upi".into());
        t
    }

    fn request(transactions: Vec<Transaction>) -> ChartRequest {
        ChartRequest {
            transactions,
            criteria: FilterCriteria::default(),
            group: GroupSpec::by(Dimension::Gateway),
            rank: Some(RankConfig::default()),
            series: SeriesSpec::overall(SeriesMetric::VolumePercent, SeriesOrder::Rank),
        }
    }

    #[test]
    fn test_build_chart_basic() {
        let req = request(vec![
            tx("1", "A", dec!(100), PaymentStatus::Success),
            tx("2", "A", dec!(300), PaymentStatus::Failure),
            tx("3", "B", dec!(100), PaymentStatus::Success),
        ]);
        let out = build_chart(&req).unwrap();
        assert_eq!(out.result.totals.total_amount, dec!(500));
        assert_eq!(out.result.series[0].value_at("A"), Some(dec!(80)));
        assert_eq!(out.result.series[0].value_at("B"), Some(dec!(20)));
        assert!(out.warnings.is_empty());
        assert_eq!(out.assumptions["transaction_count"], 3);
    }

    #[test]
    fn test_negative_limit_rejected_before_filtering() {
        // The bad transaction would otherwise be reported first.
        let mut req = request(vec![tx("1", "A", dec!(-1), PaymentStatus::Success)]);
        req.rank = Some(RankConfig::top(RankMetric::Volume, -3));
        match build_chart(&req) {
            Err(AnalyticsError::InvalidInput { field, .. }) => assert_eq!(field, "limit"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_transaction_surfaces() {
        let req = request(vec![tx("bad", "A", dec!(-1), PaymentStatus::Success)]);
        assert!(matches!(
            build_chart(&req),
            Err(AnalyticsError::InvalidTransaction { .. })
        ));
    }

    #[test]
    fn test_empty_result_is_well_typed() {
        let mut req = request(vec![tx("1", "A", dec!(100), PaymentStatus::Success)]);
        req.criteria.gateways = Selection::of(["Nope".to_string()]);
        let out = build_chart(&req).unwrap();
        assert!(out.result.buckets.is_empty());
        assert_eq!(out.result.series.len(), 1);
        assert!(out.result.series[0].points.is_empty());
        assert!(out.warnings.iter().any(|w| w.contains("No transactions")));
    }

    #[test]
    fn test_ignored_fields_warned() {
        let mut odd = tx("1", "A", dec!(100), PaymentStatus::Success);
        odd.emi_type = Some("noCost".into());
        odd.failure_reason = Some("Timeout".into());
        let out = build_chart(&request(vec![odd])).unwrap();
        assert_eq!(out.warnings.len(), 2);
    }

    #[test]
    fn test_reserved_gateway_name_warned() {
        let req = request(vec![
            tx("1", "Others", dec!(100), PaymentStatus::Success),
            tx("2", "A", dec!(100), PaymentStatus::Success),
        ]);
        let out = build_chart(&req).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("reserved value"));
        // Pinned as the tail bucket, still counted
        assert_eq!(out.result.buckets.last().map(|b| b.key()), Some("Others"));
        assert_eq!(out.result.totals.count, 2);
    }

    #[test]
    fn test_filter_report() {
        let req = FilterRequest {
            transactions: vec![
                tx("1", "A", dec!(100), PaymentStatus::Success),
                tx("2", "B", dec!(100), PaymentStatus::Failure),
            ],
            criteria: FilterCriteria {
                statuses: Selection::of([PaymentStatus::Failure]),
                ..Default::default()
            },
        };
        let out = filter_report(&req).unwrap();
        assert_eq!(out.result.transactions.len(), 1);
        assert_eq!(out.result.summary.transaction_count, 1);
    }
}
