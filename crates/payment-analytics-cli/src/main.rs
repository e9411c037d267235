mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::chart::{ChartArgs, FilterArgs};
use commands::presets::{
    BifurcationArgs, BreakdownArgs, FailureReasonsArgs, StatusTrendArgs, VolumeTrendArgs,
};

/// Payment transaction analytics
#[derive(Parser)]
#[command(
    name = "pax",
    version,
    about = "Payment transaction analytics",
    long_about = "Filter payment transactions and aggregate them into chart-ready series: \
                  daily volume and rate trends, gateway and method breakdowns, failure \
                  reasons and EMI / card type bifurcation, with top-N plus Others collapse."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full filter / group / rank / series pipeline
    Chart(ChartArgs),
    /// Filter transactions and print them with summary cards
    Filter(FilterArgs),
    /// Daily line of one metric
    VolumeTrend(VolumeTrendArgs),
    /// Top-N bars by gateway or payment method
    GatewayBreakdown(BreakdownArgs),
    /// Failure reasons, top 5 plus Others
    FailureReasons(FailureReasonsArgs),
    /// Daily counts per EMI type and card type
    Bifurcation(BifurcationArgs),
    /// One daily line per payment status
    StatusTrend(StatusTrendArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    // stdout carries the result, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Chart(args) => commands::chart::run_chart(args),
        Commands::Filter(args) => commands::chart::run_filter(args),
        Commands::VolumeTrend(args) => commands::presets::run_volume_trend(args),
        Commands::GatewayBreakdown(args) => commands::presets::run_gateway_breakdown(args),
        Commands::FailureReasons(args) => commands::presets::run_failure_reasons(args),
        Commands::Bifurcation(args) => commands::presets::run_bifurcation(args),
        Commands::StatusTrend(args) => commands::presets::run_status_trend(args),
        Commands::Version => {
            println!("pax {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
