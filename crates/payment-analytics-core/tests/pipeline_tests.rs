use payment_analytics_core::aggregation::{Dimension, GroupSpec, RankConfig, RankMetric, OTHERS_KEY};
use payment_analytics_core::filter::{FilterCriteria, Selection};
use rust_decimal::Decimal;
use payment_analytics_core::model::{PaymentStatus, Transaction};
use payment_analytics_core::pipeline::{build_chart, filter_report, ChartRequest, FilterRequest};
use payment_analytics_core::series::{SeriesMetric, SeriesOrder, SeriesSpec};
use payment_analytics_core::AnalyticsError;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

// ===========================================================================
// JSON requests as the CLI and bindings send them
// ===========================================================================

const DASHBOARD_REQUEST: &str = r#"{
  "transactions": [
    {"id": "TX001", "date": "2024-05-01T09:15:00", "amount": 12000, "paymentGateway": "Razorpay",
     "paymentMethod": "creditCard", "emiType": "noCost", "cardType": "credit", "status": "success",
     "isRefunded": false, "businessType": "Insurance", "lob": "Health", "insurer": "HDFC Ergo", "hasPolicy": true},
    {"id": "TX002", "date": "2024-05-01T11:40:00", "amount": 8000, "paymentGateway": "PayU",
     "paymentMethod": "debitCard", "emiType": "standard", "status": "failure", "failureReason": "Bank Declined",
     "businessType": "Insurance", "lob": "Motor", "insurer": "ICICI Lombard"},
    {"id": "TX003", "date": "2024-05-02", "amount": 5000, "paymentGateway": "Razorpay",
     "paymentMethod": "upi", "status": "success", "isRefunded": true,
     "businessType": "Insurance", "lob": "Health", "insurer": "HDFC Ergo", "hasPolicy": true},
    {"id": "TX004", "date": "2024-05-02T18:05:00Z", "amount": 15000, "paymentGateway": "Cashfree",
     "paymentMethod": "emi", "emiType": "shopse", "status": "pending",
     "businessType": "Insurance", "lob": "Life", "insurer": "Max Life"},
    {"id": "TX005", "date": "2024-05-03T08:00:00", "amount": 10000, "paymentGateway": "PayU",
     "paymentMethod": "netBanking", "status": "failure", "failureReason": "Timeout",
     "businessType": "Lending", "lob": "Personal", "insurer": "None"}
  ],
  "criteria": {"businessTypes": "Insurance"},
  "group": {"dimension": "gateway", "sub_breakdown": "method"},
  "rank": {"metric": "volume", "limit": 2},
  "series": {"selection": {"kind": "overall"}, "metric": "percentVolume", "order": "rank"}
}"#;

#[test]
fn test_dashboard_request_end_to_end() {
    let request: ChartRequest = serde_json::from_str(DASHBOARD_REQUEST).unwrap();
    let out = build_chart(&request).unwrap();
    let chart = &out.result;

    // Lending transaction filtered out: 12000 + 8000 + 5000 + 15000
    assert_eq!(chart.totals.count, 4);
    assert_eq!(chart.totals.total_amount, dec!(40000));

    // Razorpay 17000, Cashfree 15000, PayU 8000 -> Others
    let keys: Vec<&str> = chart.buckets.iter().map(|b| b.key()).collect();
    assert_eq!(keys, vec!["Razorpay", "Cashfree", OTHERS_KEY]);
    assert_eq!(chart.buckets[0].metrics.volume_percent, dec!(42.5));
    assert_eq!(chart.buckets[2].metrics.volume, dec!(8000));
    assert!(chart.buckets[2].breakdown("debitCard").is_some());

    let series = &chart.series[0];
    assert_eq!(series.value_at("Cashfree"), Some(dec!(37.5)));
    assert_eq!(series.total(), dec!(100));

    assert_eq!(chart.summary.policy_count, 2);
    assert_eq!(chart.summary.refunded_overlay.count, 1);
    assert_eq!(chart.summary.refund_percent, dec!(0));
    assert!(out.warnings.is_empty());
}

#[test]
fn test_output_serializes_for_the_front_end() {
    let request: ChartRequest = serde_json::from_str(DASHBOARD_REQUEST).unwrap();
    let out = build_chart(&request).unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["result"]["series"][0]["display_name"], "Volume %");
    assert_eq!(json["result"]["buckets"][0]["bucket"]["key"], "Razorpay");
    assert!(json["metadata"]["version"].is_string());
}

#[test]
fn test_unparseable_date_rejected() {
    let bad = r#"{"transactions": [{"id": "X", "date": "05/01/2024", "amount": 1, "status": "success"}],
                  "group": {"dimension": "gateway"}}"#;
    let err = serde_json::from_str::<ChartRequest>(bad).unwrap_err();
    assert!(err.to_string().contains("invalid transaction date"));
}

// ===========================================================================
// Worked scenarios
// ===========================================================================

fn request_json(transactions: &str, group: &str, rank: &str) -> ChartRequest {
    let raw = format!(
        r#"{{"transactions": {transactions}, "group": {group}, "rank": {rank},
             "series": {{"metric": "success_rate"}}}}"#
    );
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn test_three_transactions_by_gateway() {
    let req = request_json(
        r#"[{"id": "1", "date": "2024-05-01", "amount": 100, "gateway": "A", "status": "success"},
            {"id": "2", "date": "2024-05-01", "amount": 300, "gateway": "A", "status": "failure"},
            {"id": "3", "date": "2024-05-01", "amount": 100, "gateway": "B", "status": "success"}]"#,
        r#"{"dimension": "gateway"}"#,
        "null",
    );
    let out = build_chart(&req).unwrap().result;
    let a = &out.buckets[0];
    assert_eq!(a.key(), "A");
    assert_eq!(a.metrics.count, 2);
    assert_eq!(a.metrics.volume, dec!(400));
    assert_eq!(a.metrics.volume_percent, dec!(80));
    assert_eq!(a.metrics.success_rate, dec!(50));
    let b = &out.buckets[1];
    assert_eq!(b.metrics.volume_percent, dec!(20));
    assert_eq!(b.metrics.success_rate, dec!(100));
    assert_eq!(out.series[0].value_at("A"), Some(dec!(50)));
}

#[test]
fn test_seven_gateways_collapse() {
    let volumes = [500, 400, 300, 200, 100, 50, 10];
    let txs: Vec<String> = volumes
        .iter()
        .enumerate()
        .map(|(i, v)| {
            format!(
                r#"{{"id": "t{i}", "date": "2024-05-01", "amount": {v}, "gateway": "G{}", "status": "success"}}"#,
                i + 1
            )
        })
        .collect();
    let req = request_json(
        &format!("[{}]", txs.join(",")),
        r#"{"dimension": "gateway"}"#,
        r#"{"metric": "volume", "limit": 5}"#,
    );
    let out = build_chart(&req).unwrap().result;
    assert_eq!(out.buckets.len(), 6);
    let others = &out.buckets[5];
    assert_eq!(others.key(), OTHERS_KEY);
    assert_eq!(others.metrics.volume, dec!(60));
    // 60 / 1560 of volume, not the mean of 50/1560 and 10/1560
    assert_eq!(others.metrics.volume_percent, dec!(60) / dec!(1560) * dec!(100));
}

// ===========================================================================
// Errors
// ===========================================================================

#[test]
fn test_inverted_date_range_rejected() {
    let mut req = request_json("[]", r#"{"dimension": "day"}"#, "null");
    req.criteria = serde_json::from_str(r#"{"dateRange": {"from": "2024-05-10", "to": "2024-05-01"}}"#).unwrap();
    assert!(matches!(build_chart(&req), Err(AnalyticsError::InvalidInput { .. })));
}

#[test]
fn test_negative_amount_rejected() {
    let req = request_json(
        r#"[{"id": "neg", "date": "2024-05-01", "amount": -5, "status": "success"}]"#,
        r#"{"dimension": "gateway"}"#,
        "null",
    );
    match build_chart(&req) {
        Err(AnalyticsError::InvalidTransaction { id, .. }) => assert_eq!(id, "neg"),
        other => panic!("expected InvalidTransaction, got {other:?}"),
    }
}

#[test]
fn test_empty_collection_yields_empty_chart() {
    let req = ChartRequest {
        transactions: Vec::new(),
        criteria: FilterCriteria::default(),
        group: GroupSpec::by(Dimension::MethodEmiType),
        rank: Some(RankConfig::top(RankMetric::Count, 3)),
        series: SeriesSpec::statuses(
            vec![PaymentStatus::Success, PaymentStatus::Failure],
            SeriesMetric::Count,
            SeriesOrder::Rank,
        ),
    };
    let out = build_chart(&req).unwrap().result;
    assert!(out.buckets.is_empty());
    assert_eq!(out.series.len(), 2);
    assert!(out.series.iter().all(|s| s.points.is_empty()));
    assert_eq!(out.summary.transaction_count, 0);
}

// ===========================================================================
// Calendar ordering
// ===========================================================================

const DAILY_TRANSACTIONS: &str = r#"[
    {"id": "d1", "date": "2024-05-01T10:00:00", "amount": 10, "gateway": "A", "status": "success"},
    {"id": "d2", "date": "2024-05-02T10:00:00", "amount": 500, "gateway": "A", "status": "success"},
    {"id": "d3", "date": "2024-05-03T10:00:00", "amount": 100, "gateway": "A", "status": "failure"}
]"#;

fn point_keys(out: &payment_analytics_core::pipeline::ChartOutput) -> Vec<&str> {
    out.series[0].points.iter().map(|p| p.key.as_str()).collect()
}

#[test]
fn test_ranked_days_plot_chronologically() {
    let raw = format!(r#"{{"transactions": {DAILY_TRANSACTIONS}, "group": {{"dimension": "day"}}, "rank": {{}}}}"#);
    let req: ChartRequest = serde_json::from_str(&raw).unwrap();
    assert_eq!(req.series.order, SeriesOrder::Rank);

    let out = build_chart(&req).unwrap().result;
    // Buckets keep ranking order; the series is in calendar order.
    let ranked: Vec<&str> = out.buckets.iter().map(|b| b.key()).collect();
    assert_eq!(ranked, vec!["2024-05-02", "2024-05-03", "2024-05-01"]);
    assert_eq!(point_keys(&out), vec!["2024-05-01", "2024-05-02", "2024-05-03"]);
}

#[test]
fn test_ranked_days_with_others_last() {
    let raw = format!(
        r#"{{"transactions": {DAILY_TRANSACTIONS}, "group": {{"dimension": "day"}},
             "rank": {{"metric": "volume", "limit": 1}}}}"#
    );
    let req: ChartRequest = serde_json::from_str(&raw).unwrap();
    let out = build_chart(&req).unwrap().result;
    assert_eq!(point_keys(&out), vec!["2024-05-02", OTHERS_KEY]);
    assert_eq!(out.series[0].value_at(OTHERS_KEY), Some(dec!(2)));
}

#[test]
fn test_non_calendar_dimension_keeps_rank_order() {
    let mut req = request_json(DAILY_TRANSACTIONS, r#"{"dimension": "gateway"}"#, "{}");
    req.transactions[1].gateway = Some("Z".into());
    let out = build_chart(&req).unwrap().result;
    // Z carries 500 of 610, so it ranks ahead of A
    assert_eq!(point_keys(&out), vec!["Z", "A"]);
}

// ===========================================================================
// Overflow boundary
// ===========================================================================

fn huge(id: &str, gateway: &str) -> Transaction {
    let mut tx = Transaction::new(
        id,
        chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        Decimal::MAX,
        PaymentStatus::Success,
    );
    tx.gateway = Some(gateway.into());
    tx
}

#[test]
fn test_unsummable_volume_is_an_error_not_a_panic() {
    let mut req = request_json("[]", r#"{"dimension": "gateway"}"#, "null");
    req.transactions = vec![huge("big1", "A"), huge("big2", "B")];
    match build_chart(&req) {
        Err(AnalyticsError::InvalidInput { field, .. }) => assert_eq!(field, "amount"),
        other => panic!("expected InvalidInput, got {other:?}"),
    }

    let filter = FilterRequest {
        transactions: req.transactions.clone(),
        criteria: FilterCriteria::default(),
    };
    assert!(matches!(filter_report(&filter), Err(AnalyticsError::InvalidInput { .. })));
}

#[test]
fn test_single_maximal_amount_is_accepted() {
    let mut req = request_json("[]", r#"{"dimension": "gateway"}"#, "{}");
    req.transactions = vec![huge("big", "A")];
    let out = build_chart(&req).unwrap().result;
    assert_eq!(out.totals.total_amount, Decimal::MAX);
    assert_eq!(out.buckets[0].metrics.volume_percent, dec!(100));
}

// ===========================================================================
// Filter report
// ===========================================================================

#[test]
fn test_refund_filter_is_status_membership() {
    // TX003 is a success flagged is_refunded; it is not a refund by status.
    let mut req: FilterRequest = serde_json::from_str(DASHBOARD_REQUEST).unwrap();
    req.criteria.statuses = Selection::of([PaymentStatus::Refund]);
    let out = filter_report(&req).unwrap().result;
    assert!(out.transactions.is_empty());

    req.criteria.statuses = Selection::of([PaymentStatus::Success]);
    let out = filter_report(&req).unwrap().result;
    let ids: Vec<&str> = out.transactions.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["TX001", "TX003"]);
    assert_eq!(out.summary.refunded_overlay.count, 1);
}
