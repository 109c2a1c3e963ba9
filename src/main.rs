use analytics::ReturnsEngine;
use anyhow::{Context, Result};
use api_client::YahooClient;
use clap::Parser;
use configuration::{CliArgs, Settings, load_config};
use engine::{ReturnsAnalysis, ReturnsCalculator};
use indicatif::ProgressStyle;
use reporting::{ChartOptions, render_chart, render_json, render_summary, write_chart};
use std::sync::Arc;
use tracing::Instrument;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_indicatif::IndicatifLayer;
use tracing_indicatif::span_ext::IndicatifSpanExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// The entry point: download one ticker's history, report its returns, chart them.
#[tokio::main]
async fn main() -> Result<()> {
    // RETURNS__* overrides may live in a .env file; its absence is fine.
    dotenvy::dotenv().ok();

    let cli = CliArgs::parse();
    let mut settings =
        load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut settings);
    settings
        .validate()
        .context("Invalid command-line arguments")?;

    let _log_guard = init_tracing(&settings)?;
    tracing::debug!(?settings, "Configuration loaded");

    let analysis = analyze(&settings).await?;
    publish(&analysis, &settings, cli.json)
}

// ==============================================================================
// Logging
// ==============================================================================

/// Installs the global subscriber: stderr (routed around the spinner) plus an
/// optional daily log file. The returned guard must outlive the run so the
/// file writer flushes.
fn init_tracing(settings: &Settings) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.level))
        .context("Invalid log filter")?;

    let indicatif_layer = IndicatifLayer::new();
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(indicatif_layer.get_stderr_writer());

    let (file_layer, guard) = match &settings.logging.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "index-returns.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .with(indicatif_layer)
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    Ok(guard)
}

// ==============================================================================
// Pipeline
// ==============================================================================

/// Fetches and computes. Nothing is printed or written here, so a failure
/// leaves no partial output behind.
async fn analyze(settings: &Settings) -> Result<ReturnsAnalysis> {
    let analysis_cfg = &settings.analysis;
    let provider = YahooClient::new(&settings.provider)
        .context("Failed to build the market-data client")?;
    let calculator = ReturnsCalculator::new(
        Arc::new(provider),
        ReturnsEngine::new(analysis_cfg.trading_days_per_year),
    );

    let span = tracing::info_span!("download", ticker = %analysis_cfg.ticker);
    span.pb_set_style(
        &ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    span.pb_set_message(&format!(
        "Downloading {} from {} to {}",
        analysis_cfg.ticker, analysis_cfg.start_date, analysis_cfg.end_date
    ));

    let analysis = calculator
        .run(
            &analysis_cfg.ticker,
            analysis_cfg.start_date,
            analysis_cfg.end_date,
        )
        .instrument(span)
        .await
        .with_context(|| format!("Could not analyze {}", analysis_cfg.ticker))?;

    Ok(analysis)
}

/// Renders everything in memory first, then writes the chart, then prints the
/// summary.
fn publish(analysis: &ReturnsAnalysis, settings: &Settings, json: bool) -> Result<()> {
    let options = ChartOptions {
        width: settings.output.chart_width,
        height: settings.output.chart_height,
    };
    let svg = render_chart(
        &analysis.ticker,
        &analysis.prices,
        &analysis.cumulative_curve(),
        &options,
    )?;
    let summary = if json {
        render_json(&analysis.ticker, &analysis.range, &analysis.report)?
    } else {
        render_summary(&analysis.ticker, &analysis.range, &analysis.report)
    };

    let chart_path = &settings.output.chart_path;
    write_chart(chart_path, &svg)
        .with_context(|| format!("Failed to write chart to {}", chart_path.display()))?;

    println!("{summary}");
    if !json {
        println!("Chart saved to {}", chart_path.display());
    }
    Ok(())
}
