mod apply;
mod config;
mod error;
mod models;
mod netconf;
mod snippets;
mod steps;
mod utils;

use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use apply::{RunReport, StepRecord};
use config::{Config, ReportFormat};
use snippets::Snippets;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    // Initialize tracing; stdout is reserved for step records and reports
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netconf_vlan=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = Config::load();
    cfg.validate()?;
    tracing::info!("Target device: {}:{}", cfg.device.host, cfg.device.port);

    let snippets = Snippets::new().context("Failed to load configuration templates")?;
    let plan = steps::provisioning_plan(&cfg.settings);

    if cfg.dry_run {
        return Ok(dry_run(&plan, &snippets));
    }

    let endpoint = cfg.device.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        apply::run(&endpoint, &plan, &snippets, netconf::connect, print_record)
    })
    .await
    .context("Provisioning task panicked")?;

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if let Some(e) = &report.unlock_error {
        eprintln!("Failed to unlock running config: {}", e);
    }
    if cfg.report_format == ReportFormat::Json {
        print_json(&report)?;
    }

    if report.is_success() {
        tracing::info!("All {} steps applied", report.steps.len());
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn print_record(record: &StepRecord) {
    if record.is_success() {
        println!("{}", record.line());
    } else {
        eprintln!("{}", record.line());
    }
}

fn print_json(report: &RunReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    println!("{}", json);
    Ok(())
}

/// Render every step and print the fragments instead of applying them.
fn dry_run(plan: &[steps::Step], snippets: &Snippets) -> ExitCode {
    tracing::info!("Dry run: no connection will be made");
    let mut failed = false;
    for preview in apply::preview(plan, snippets) {
        match preview.fragment {
            Ok(fragment) => {
                println!("Step {}: {}", preview.index, preview.label);
                println!("{}", fragment);
            }
            Err(e) => {
                failed = true;
                eprintln!("Step {}: {}: failed ({})", preview.index, preview.label, e);
            }
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
