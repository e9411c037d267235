use clap::Args;
use serde_json::Value;

use payment_analytics_core::presets::{
    self, BifurcationInput, BreakdownInput, DateWindow, FailureReasonsInput, PresetInput,
    StatusTrendInput, VolumeTrendInput,
};
use payment_analytics_core::series::SeriesMetric;

use crate::input;

/// Flags shared by every preset.
#[derive(Args)]
pub struct PresetArgs {
    /// Path to a preset request (transactions, criteria, preset options)
    #[arg(long)]
    pub input: Option<String>,

    /// Restrict to the trailing N days (7, 30, 90 on the dashboard)
    #[arg(long)]
    pub days: Option<u32>,
}

impl PresetArgs {
    fn apply(&self, base: &mut PresetInput) {
        if let Some(days) = self.days {
            let anchor = base.window.as_ref().and_then(|w| w.anchor);
            base.window = Some(DateWindow { days, anchor });
        }
    }
}

#[derive(Args)]
pub struct VolumeTrendArgs {
    #[command(flatten)]
    pub preset: PresetArgs,

    /// Metric to plot: percentVolume, successRate, failureRate, refundRate, policyCount, count
    #[arg(long)]
    pub metric: Option<String>,
}

#[derive(Args)]
pub struct BreakdownArgs {
    #[command(flatten)]
    pub preset: PresetArgs,

    /// Number of bars before the rest collapse into Others
    #[arg(long, allow_hyphen_values = true)]
    pub limit: Option<i64>,
}

#[derive(Args)]
pub struct FailureReasonsArgs {
    #[command(flatten)]
    pub preset: PresetArgs,

    /// Number of reasons before the rest collapse into Others
    #[arg(long, allow_hyphen_values = true)]
    pub limit: Option<i64>,
}

#[derive(Args)]
pub struct BifurcationArgs {
    #[command(flatten)]
    pub preset: PresetArgs,

    /// Comma-separated EMI types (standard, noCost, shopse)
    #[arg(long, value_delimiter = ',')]
    pub emi_types: Option<Vec<String>>,

    /// Comma-separated card types (credit, debit)
    #[arg(long, value_delimiter = ',')]
    pub card_types: Option<Vec<String>>,
}

#[derive(Args)]
pub struct StatusTrendArgs {
    #[command(flatten)]
    pub preset: PresetArgs,
}

fn parse_metric(raw: &str) -> Result<SeriesMetric, Box<dyn std::error::Error>> {
    serde_json::from_value(Value::String(raw.to_string()))
        .map_err(|_| format!("Unknown metric '{raw}'").into())
}

pub fn run_volume_trend(args: VolumeTrendArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut input_data: VolumeTrendInput = input::read_request(args.preset.input.as_deref())?;
    args.preset.apply(&mut input_data.base);
    if let Some(ref metric) = args.metric {
        input_data.metric = parse_metric(metric)?;
    }
    let result = presets::volume_trend(&input_data)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_gateway_breakdown(args: BreakdownArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut input_data: BreakdownInput = input::read_request(args.preset.input.as_deref())?;
    args.preset.apply(&mut input_data.base);
    if args.limit.is_some() {
        input_data.limit = args.limit;
    }
    let result = presets::gateway_breakdown(&input_data)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_failure_reasons(args: FailureReasonsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut input_data: FailureReasonsInput = input::read_request(args.preset.input.as_deref())?;
    args.preset.apply(&mut input_data.base);
    if args.limit.is_some() {
        input_data.limit = args.limit;
    }
    let result = presets::failure_reasons(&input_data)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_bifurcation(args: BifurcationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut input_data: BifurcationInput = input::read_request(args.preset.input.as_deref())?;
    args.preset.apply(&mut input_data.base);
    if let Some(emi_types) = args.emi_types {
        input_data.emi_types = emi_types;
    }
    if let Some(card_types) = args.card_types {
        input_data.card_types = card_types;
    }
    let result = presets::bifurcation(&input_data)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_status_trend(args: StatusTrendArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut input_data: StatusTrendInput = input::read_request(args.preset.input.as_deref())?;
    args.preset.apply(&mut input_data.base);
    let result = presets::status_trend(&input_data)?;
    Ok(serde_json::to_value(result)?)
}
