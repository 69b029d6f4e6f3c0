//! Runs the whole prospecting pipeline for one company URL and prints the leads as JSON.
//!
//! Usage: `run_pipeline <url> [b2b|b2c]`

use leadflow_api::cohort::{compile_options, default_view_mode};
use leadflow_api::config::Config;
use leadflow_api::handlers::AppState;
use leadflow_api::models::ViewMode;
use serde_json::json;
use std::env;

fn parse_view_mode(raw: &str) -> anyhow::Result<ViewMode> {
    match raw.to_ascii_lowercase().as_str() {
        "b2b" => Ok(ViewMode::B2B),
        "b2c" => Ok(ViewMode::B2C),
        other => anyhow::bail!("Unknown view mode '{}', expected b2b or b2c", other),
    }
}

/// Main entry point for the pipeline runner.
///
/// Synthesizes the ICP, takes the default cohort of the requested (or natural) view mode,
/// then discovers and enriches prospects. Logs go to stderr; stdout carries only the JSON.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leadflow_api=info".into()),
        )
        .init();

    let mut args = env::args().skip(1);
    let url = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("Usage: run_pipeline <url> [b2b|b2c]"))?;
    let requested_mode = args.next().as_deref().map(parse_view_mode).transpose()?;

    let config = Config::from_env()?;
    let state = AppState::from_config(config)?;

    let icp = state.synthesizer.synthesize(&url).await?;
    let view_mode = requested_mode.unwrap_or_else(|| default_view_mode(&icp));
    let options = compile_options(&icp, view_mode)
        .ok_or_else(|| anyhow::anyhow!("ICP for {} has no {:?} cohort options", url, view_mode))?;
    let cohort = options.default_selection();

    tracing::info!(
        "Running pipeline for {} / {} / {}",
        cohort.industry,
        cohort.geography,
        cohort.persona
    );

    let report = state.coordinator.run_to_completion(&icp, &cohort).await;

    let output = json!({
        "icp": icp,
        "viewMode": view_mode,
        "cohort": cohort,
        "summary": report.summary(),
        "leads": report.leads,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
