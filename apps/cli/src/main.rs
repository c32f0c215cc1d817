mod args;
mod config;
mod main_lib;
mod render;

use anyhow::Context;
use clap::Parser;

use args::Cli;
use config::Config;
use hfcheck_core::reconciliation::ReconciliationEngine;
use hfcheck_core::DateWindow;
use hfcheck_opera::CancellationToken;
use main_lib::{build_session, init_tracing, load_credentials, load_ledger};
use render::{render_json, render_text};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    init_tracing(&config.log_format);

    let range = DateWindow::new(cli.start, cli.end)?;
    let credentials = load_credentials(&cli.config)?;
    let ledger = load_ledger(&cli.ledger)?;
    let session = build_session(&config, credentials)?;

    // Ctrl-C stops polling; windows already fetched are still reconciled
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping retrieval");
                cancel.cancel();
            }
        }
    });

    let retrieval = session
        .fetch(&cli.hotel_id, range, &cancel)
        .await
        .context("Statistics retrieval failed")?;

    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let report = ReconciliationEngine.run(&retrieval.job_results, &ledger, cli.mode.into(), today);

    if cli.json {
        println!("{}", render_json(&cli.hotel_id, range, &retrieval, &report)?);
    } else {
        print!(
            "{}",
            render_text(&cli.hotel_id, range, &retrieval, &report, cli.all_rows)?
        );
    }
    Ok(())
}
