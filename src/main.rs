mod analyzer;
mod cli;
mod config;
mod loader;
mod model;
mod normalizer;
mod orchestrator;
mod parser;
mod report;
mod utils;

use clap::Parser;
use cli::Cli;
use config::{AppConfig, ProviderKind, load_or_default};
use futures::future::join_all;
use loader::{SeriesLoader, SyntheticLoader, YahooLoader};
use model::{LoaderError, RequestForm};
use orchestrator::{Orchestrator, RequestState};
use report::export::{save_export, save_panels};
use report::panels::build_panels;
use report::render_report;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What to write next to the text report.
struct OutputOptions {
    export_csv: bool,
    chart_data: bool,
    export_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let cli = Cli::parse();

    let config = match load_or_default(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let loader = match build_loader(&config, cli.offline) {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to initialize loader: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let output = OutputOptions {
        export_csv: cli.export,
        chart_data: cli.chart_data,
        export_dir: PathBuf::from(config.export_dir.as_deref().unwrap_or(".")),
    };

    let forms = cli.forms();
    info!("Requests to process: {}", forms.len());

    // Each request runs its own pipeline; only the loader is shared.
    let tasks: Vec<_> = forms
        .iter()
        .map(|form| process_request(form, loader.clone(), &output))
        .collect();
    let outcomes = join_all(tasks).await;

    if outcomes.iter().all(|ok| *ok) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn build_loader(config: &AppConfig, offline: bool) -> Result<Arc<dyn SeriesLoader>, LoaderError> {
    let kind = if offline {
        ProviderKind::Synthetic
    } else {
        config.provider
    };
    info!("Using {:?} loader", kind);
    Ok(match kind {
        ProviderKind::Yahoo => Arc::new(YahooLoader::new(&config.yahoo)?),
        ProviderKind::Synthetic => Arc::new(SyntheticLoader::new(&config.synthetic)),
    })
}

/// Runs one request to a terminal state and presents the outcome.
/// Returns whether the request succeeded.
async fn process_request(
    form: &RequestForm,
    loader: Arc<dyn SeriesLoader>,
    output: &OutputOptions,
) -> bool {
    let mut orchestrator = Orchestrator::new(loader);
    orchestrator.submit(form).await;
    debug!(
        "Request '{}' went through {:?}",
        form.ticker.trim(),
        orchestrator.trace()
    );

    match orchestrator.state() {
        RequestState::Ready(report) => {
            println!("{}\n", render_report(report));

            let mut ok = true;
            if output.export_csv {
                if let Err(e) = save_export(&output.export_dir, &report.request, &report.series) {
                    warn!("CSV export failed: {}", e);
                    eprintln!("❌ Could not write CSV export for {}: {}", report.request.ticker, e);
                    ok = false;
                }
            }
            if output.chart_data {
                let panels = build_panels(
                    &report.request.ticker,
                    &report.series,
                    report.request.display,
                );
                if let Err(e) = save_panels(&output.export_dir, &report.request, &panels) {
                    warn!("Chart data export failed: {}", e);
                    eprintln!("❌ Could not write chart data for {}: {}", report.request.ticker, e);
                    ok = false;
                }
            }
            ok
        }
        RequestState::Failed(reason) => {
            eprintln!("❌ {}", reason);
            if reason.is_retryable() {
                eprintln!("💡 This looks temporary; submit the request again to retry.");
            }
            false
        }
        other => {
            error!("Request stopped in non-terminal state {:?}", other.phase());
            false
        }
    }
}
