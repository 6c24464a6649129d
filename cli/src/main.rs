//! Jobsweep binary: load config, build one adapter per enabled platform,
//! run the sweep, print the summary.

mod store;

use anyhow::Context;
use jobsweep_core::{AppConfig, PlatformId};
use jobsweep_engine::{OrchestrationEngine, RunOutcome};
use jobsweep_platform::{
    DefinitionLoader, DynamicAdapter, PlatformAdapter, PlatformCatalog, SearchMethod, StaticAdapter,
};
use jobsweep_registry::JobRegistry;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load_with_env().context("failed to load configuration")?;
    let enabled: Vec<String> = config
        .enabled_platforms()
        .into_iter()
        .map(String::from)
        .collect();
    if enabled.is_empty() {
        warn!("no platforms enabled; set [platforms.<name>] enabled = true in the config");
        return Ok(ExitCode::SUCCESS);
    }

    let loader = DefinitionLoader::with_default_dir().context("locating platform definitions")?;
    let catalog = PlatformCatalog::load_from(&loader).context("loading platform definitions")?;

    let mut adapters: Vec<Box<dyn PlatformAdapter>> = Vec::new();
    for name in &enabled {
        let id = PlatformId::new(name.as_str())
            .with_context(|| format!("invalid platform name '{name}' in config"))?;
        let definition = match catalog.get(&id) {
            Ok(definition) => definition,
            Err(err) => {
                warn!(platform = %id, error = %err, "no usable definition, skipping platform");
                continue;
            }
        };

        let browser_driven = matches!(definition.search, SearchMethod::BrowserFlow { .. });
        let adapter: Box<dyn PlatformAdapter> = if browser_driven {
            match DynamicAdapter::new(definition, config.delays.clone(), config.browser.headless) {
                Ok(adapter) => Box::new(adapter),
                Err(err) => {
                    warn!(platform = %id, error = %err, "failed to build adapter, skipping platform");
                    continue;
                }
            }
        } else {
            match StaticAdapter::new(definition, config.delays.page_load_timeout()) {
                Ok(adapter) => Box::new(adapter),
                Err(err) => {
                    warn!(platform = %id, error = %err, "failed to build adapter, skipping platform");
                    continue;
                }
            }
        };
        adapters.push(adapter);
    }

    if adapters.is_empty() {
        error!("no platform adapters could be built");
        return Ok(ExitCode::FAILURE);
    }

    let store = Arc::new(store::JsonlStore::open_default().context("opening run store")?);
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, finishing the in-flight application before shutdown");
                cancel.cancel();
            }
        });
    }

    let engine = OrchestrationEngine::new(config, JobRegistry::new(), store)
        .with_cancellation(cancel);
    let report = engine.run(adapters).await.context("sweep failed")?;

    for summary in &report.platforms {
        info!(
            platform = %summary.platform,
            tracked = summary.tracked,
            applied = summary.applied,
            failed = summary.failed,
            skipped = summary.skipped,
            aborted = summary.aborted,
            "platform summary"
        );
        if let Some(err) = &summary.fatal_error {
            warn!(platform = %summary.platform, error = %err, "platform aborted");
        }
    }

    match report.outcome() {
        RunOutcome::Success => {
            info!(applied = report.total_applied(), "sweep finished");
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::TotalFailure => {
            error!("every platform failed; nothing was accomplished");
            Ok(ExitCode::FAILURE)
        }
    }
}
