//! Ready-made chart recipes used by the dashboard.
//!
//! Each preset only fixes the grouping, ranking and series configuration and
//! then runs the regular pipeline:
//! - **Volume trend** -- one daily line for a chosen metric
//! - **Gateway breakdown** -- bars by gateway or method, top-N, the other
//!   axis kept as sub-breakdown
//! - **Failure reasons** -- failed transactions by reason, top 5 + Others,
//!   gateway sub-breakdown
//! - **Bifurcation** -- daily counts per selected EMI type and card type
//! - **Status trend** -- one daily line per selected status

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::aggregation::grouping::{group_transactions, Dimension, GrandTotals, GroupSpec};
use crate::aggregation::metrics::derive_metrics;
use crate::aggregation::ranking::{RankConfig, RankMetric, DEFAULT_LIMIT};
use crate::error::AnalyticsError;
use crate::filter::{filter_transactions, validate_criteria, DateRange, FilterCriteria, Selection};
use crate::model::{PaymentStatus, Transaction};
use crate::pipeline::{build_chart, ChartOutput, ChartRequest};
use crate::series::{assemble_series, Series, SeriesMetric, SeriesOrder, SeriesSpec};
use crate::summary::{summarize, DashboardSummary};
use crate::types::{with_metadata, ComputationOutput};
use crate::AnalyticsResult;

// ---------------------------------------------------------------------------
// Shared input
// ---------------------------------------------------------------------------

/// Trailing window of `days` days ending on `anchor`, or on the latest
/// transaction day when no anchor is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub days: u32,
    #[serde(default)]
    pub anchor: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInput {
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub criteria: FilterCriteria,
    /// Overrides `criteria.date_range` when present.
    #[serde(default)]
    pub window: Option<DateWindow>,
}

impl PresetInput {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions,
            criteria: FilterCriteria::default(),
            window: None,
        }
    }

    /// Criteria with the date window resolved.
    fn resolved_criteria(&self) -> AnalyticsResult<FilterCriteria> {
        let mut criteria = self.criteria.clone();
        if let Some(window) = &self.window {
            criteria.date_range = resolve_window(window, &self.transactions)?;
        }
        Ok(criteria)
    }

    fn request(
        &self,
        criteria: FilterCriteria,
        group: GroupSpec,
        rank: Option<RankConfig>,
        series: SeriesSpec,
    ) -> ChartRequest {
        ChartRequest {
            transactions: self.transactions.clone(),
            criteria,
            group,
            rank,
            series,
        }
    }
}

pub fn resolve_window(window: &DateWindow, transactions: &[Transaction]) -> AnalyticsResult<DateRange> {
    if window.days == 0 {
        return Err(AnalyticsError::InvalidInput {
            field: "window.days".into(),
            reason: "Date window must span at least one day".into(),
        });
    }
    let anchor = match window.anchor {
        Some(a) => a,
        None => transactions
            .iter()
            .map(Transaction::day)
            .max()
            .ok_or_else(|| {
                AnalyticsError::DateError(
                    "Cannot anchor a date window without an explicit anchor or any transactions".into(),
                )
            })?,
    };
    Ok(DateRange::last_n_days(anchor, window.days))
}

// ---------------------------------------------------------------------------
// Volume trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeTrendInput {
    #[serde(flatten)]
    pub base: PresetInput,
    #[serde(default = "default_trend_metric")]
    pub metric: SeriesMetric,
}

fn default_trend_metric() -> SeriesMetric {
    SeriesMetric::VolumePercent
}

/// Daily line of one metric (volume %, a status rate, policies or orders).
pub fn volume_trend(input: &VolumeTrendInput) -> AnalyticsResult<ComputationOutput<ChartOutput>> {
    let criteria = input.base.resolved_criteria()?;
    let request = input.base.request(
        criteria,
        GroupSpec::by(Dimension::Day),
        None,
        SeriesSpec::overall(input.metric, SeriesOrder::Chronological),
    );
    build_chart(&request)
}

// ---------------------------------------------------------------------------
// Gateway / method breakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownAxis {
    #[default]
    Gateway,
    Method,
}

impl BreakdownAxis {
    fn group(&self) -> GroupSpec {
        match self {
            BreakdownAxis::Gateway => GroupSpec::by(Dimension::Gateway).with_breakdown(Dimension::Method),
            BreakdownAxis::Method => GroupSpec::by(Dimension::Method).with_breakdown(Dimension::Gateway),
        }
    }
}

/// What the bars measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarMetric {
    #[default]
    Volume,
    Count,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownInput {
    #[serde(flatten)]
    pub base: PresetInput,
    #[serde(default)]
    pub by: BreakdownAxis,
    #[serde(default)]
    pub metric: BarMetric,
    #[serde(default)]
    pub limit: Option<i64>,
}

pub fn gateway_breakdown(input: &BreakdownInput) -> AnalyticsResult<ComputationOutput<ChartOutput>> {
    let criteria = input.base.resolved_criteria()?;
    let (rank_metric, series_metric) = match input.metric {
        BarMetric::Volume => (RankMetric::Volume, SeriesMetric::Volume),
        BarMetric::Count => (RankMetric::Count, SeriesMetric::Count),
    };
    let request = input.base.request(
        criteria,
        input.by.group(),
        Some(RankConfig::top(rank_metric, input.limit.unwrap_or(DEFAULT_LIMIT))),
        SeriesSpec::overall(series_metric, SeriesOrder::Rank),
    );
    build_chart(&request)
}

// ---------------------------------------------------------------------------
// Failure reasons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReasonsInput {
    #[serde(flatten)]
    pub base: PresetInput,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Failed transactions by reason. The status filter is forced to failures.
pub fn failure_reasons(input: &FailureReasonsInput) -> AnalyticsResult<ComputationOutput<ChartOutput>> {
    let mut criteria = input.base.resolved_criteria()?;
    criteria.statuses = Selection::of([PaymentStatus::Failure]);
    let request = input.base.request(
        criteria,
        GroupSpec::by(Dimension::FailureReason).with_breakdown(Dimension::Gateway),
        Some(RankConfig::top(
            RankMetric::FailureCount,
            input.limit.unwrap_or(DEFAULT_LIMIT),
        )),
        SeriesSpec::overall(SeriesMetric::Count, SeriesOrder::Rank),
    );
    build_chart(&request)
}

// ---------------------------------------------------------------------------
// Bifurcation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BifurcationInput {
    #[serde(flatten)]
    pub base: PresetInput,
    #[serde(default)]
    pub emi_types: Vec<String>,
    #[serde(default)]
    pub card_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BifurcationOutput {
    pub totals: GrandTotals,
    pub summary: DashboardSummary,
    /// EMI type series first, then card type series.
    pub series: Vec<Series>,
}

#[derive(Serialize)]
struct BifurcationAssumptions<'a> {
    transaction_count: usize,
    criteria: &'a FilterCriteria,
    emi_types: &'a [String],
    card_types: &'a [String],
}

/// Daily transaction counts per selected EMI type and card type.
pub fn bifurcation(input: &BifurcationInput) -> AnalyticsResult<ComputationOutput<BifurcationOutput>> {
    let start = Instant::now();

    if input.emi_types.is_empty() && input.card_types.is_empty() {
        return Err(AnalyticsError::InvalidInput {
            field: "emi_types, card_types".into(),
            reason: "Select at least one EMI type or card type".into(),
        });
    }
    let criteria = input.base.resolved_criteria()?;
    validate_criteria(&criteria)?;

    let filtered = filter_transactions(&input.base.transactions, &criteria)?;
    let totals = GrandTotals::from_transactions(&filtered);

    let mut series = Vec::new();
    for (sub, keys) in [
        (Dimension::EmiType, &input.emi_types),
        (Dimension::CardType, &input.card_types),
    ] {
        if keys.is_empty() {
            continue;
        }
        let group = GroupSpec::by(Dimension::Day).with_breakdown(sub);
        let buckets = derive_metrics(group_transactions(&filtered, &group), &totals);
        series.extend(assemble_series(
            &buckets,
            group.dimension,
            &SeriesSpec::sub_categories(keys.clone(), SeriesMetric::Count, SeriesOrder::Chronological),
        ));
    }

    let output = BifurcationOutput {
        totals,
        summary: summarize(&filtered),
        series,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Daily counts per EMI type and card type",
        &BifurcationAssumptions {
            transaction_count: input.base.transactions.len(),
            criteria: &criteria,
            emi_types: &input.emi_types,
            card_types: &input.card_types,
        },
        Vec::new(),
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Status trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTrendInput {
    #[serde(flatten)]
    pub base: PresetInput,
    pub statuses: Vec<PaymentStatus>,
    #[serde(default)]
    pub metric: SeriesMetric,
}

/// One daily line per selected status.
pub fn status_trend(input: &StatusTrendInput) -> AnalyticsResult<ComputationOutput<ChartOutput>> {
    if input.statuses.is_empty() {
        return Err(AnalyticsError::InvalidInput {
            field: "statuses".into(),
            reason: "Select at least one payment status".into(),
        });
    }
    let criteria = input.base.resolved_criteria()?;
    let request = input.base.request(
        criteria,
        GroupSpec::by(Dimension::Day),
        None,
        SeriesSpec::statuses(input.statuses.clone(), input.metric, SeriesOrder::Chronological),
    );
    build_chart(&request)
}
