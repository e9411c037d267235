use clap::Args;
use serde_json::Value;

use payment_analytics_core::aggregation::RankConfig;
use payment_analytics_core::pipeline::{self, ChartRequest, FilterRequest};

use crate::input;

#[derive(Args)]
pub struct ChartArgs {
    /// Path to a chart request (transactions, criteria, group, rank, series)
    #[arg(long)]
    pub input: Option<String>,

    /// Override the top-N limit; collapses with the request's rank metric
    #[arg(long, allow_hyphen_values = true)]
    pub limit: Option<i64>,

    /// Keep every bucket, ignoring any rank configuration in the request
    #[arg(long, conflicts_with = "limit")]
    pub no_collapse: bool,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Path to a filter request (transactions, criteria)
    #[arg(long)]
    pub input: Option<String>,

    /// Print only the summary cards, not the matching transactions
    #[arg(long)]
    pub summary_only: bool,
}

pub fn run_chart(args: ChartArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: ChartRequest = input::read_request(args.input.as_deref())?;
    if args.no_collapse {
        request.rank = None;
    } else if let Some(limit) = args.limit {
        let metric = request.rank.map(|r| r.metric).unwrap_or_default();
        request.rank = Some(RankConfig::top(metric, limit));
    }
    let result = pipeline::build_chart(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_filter(args: FilterArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: FilterRequest = input::read_request(args.input.as_deref())?;
    let result = pipeline::filter_report(&request)?;
    let mut value = serde_json::to_value(result)?;
    if args.summary_only {
        if let Some(result) = value.get_mut("result").and_then(Value::as_object_mut) {
            result.remove("transactions");
        }
    }
    Ok(value)
}
