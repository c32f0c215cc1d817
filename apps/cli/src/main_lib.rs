use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use hfcheck_core::ledger::{parse_ledger, LedgerConfig, LedgerRow};
use hfcheck_core::Credentials;
use hfcheck_opera::{AuditSession, OperaClient, StatisticsRetriever};

use crate::config::Config;

pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub fn load_credentials(path: &Path) -> anyhow::Result<Credentials> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read configuration file {}", path.display()))?;
    let credentials = Credentials::from_config_json(&raw)
        .with_context(|| format!("Invalid configuration file {}", path.display()))?;
    Ok(credentials)
}

pub fn load_ledger(path: &Path) -> anyhow::Result<Vec<LedgerRow>> {
    let content = std::fs::read(path)
        .with_context(|| format!("Cannot read ledger file {}", path.display()))?;
    let rows = parse_ledger(&content, &LedgerConfig::default())
        .with_context(|| format!("Invalid ledger file {}", path.display()))?;
    tracing::info!("Loaded {} ledger row(s) from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn build_session(config: &Config, credentials: Credentials) -> anyhow::Result<AuditSession> {
    let client = OperaClient::new(config.request_timeout)?;
    let retriever =
        StatisticsRetriever::new(Arc::new(client)).with_poll_policy(config.poll.clone());
    tracing::info!(
        "OPERA host {} (max window {} days, poll every {:?} up to {:?})",
        credentials.hostname,
        config.max_window_days,
        config.poll.initial_interval,
        config.poll.max_wait
    );
    Ok(AuditSession::new(credentials, retriever).with_max_window_days(config.max_window_days))
}
