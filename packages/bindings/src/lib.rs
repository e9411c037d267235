use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use payment_analytics_core::{pipeline, presets, summary};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<T: DeserializeOwned>(input_json: &str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

fn render<T: Serialize>(output: &T) -> NapiResult<String> {
    serde_json::to_string(output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[napi]
pub fn build_chart(input_json: String) -> NapiResult<String> {
    let request: pipeline::ChartRequest = parse(&input_json)?;
    let output = pipeline::build_chart(&request).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn filter_transactions(input_json: String) -> NapiResult<String> {
    let request: pipeline::FilterRequest = parse(&input_json)?;
    let output = pipeline::filter_report(&request).map_err(to_napi_error)?;
    render(&output)
}

/// Summary cards for an already filtered list of transactions.
#[napi]
pub fn summarize(transactions_json: String) -> NapiResult<String> {
    let transactions: Vec<payment_analytics_core::model::Transaction> = parse(&transactions_json)?;
    render(&summary::summarize(&transactions))
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

#[napi]
pub fn volume_trend(input_json: String) -> NapiResult<String> {
    let input: presets::VolumeTrendInput = parse(&input_json)?;
    let output = presets::volume_trend(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn gateway_breakdown(input_json: String) -> NapiResult<String> {
    let input: presets::BreakdownInput = parse(&input_json)?;
    let output = presets::gateway_breakdown(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn failure_reasons(input_json: String) -> NapiResult<String> {
    let input: presets::FailureReasonsInput = parse(&input_json)?;
    let output = presets::failure_reasons(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn bifurcation(input_json: String) -> NapiResult<String> {
    let input: presets::BifurcationInput = parse(&input_json)?;
    let output = presets::bifurcation(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn status_trend(input_json: String) -> NapiResult<String> {
    let input: presets::StatusTrendInput = parse(&input_json)?;
    let output = presets::status_trend(&input).map_err(to_napi_error)?;
    render(&output)
}
