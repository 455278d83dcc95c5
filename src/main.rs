mod allocation;
mod classify;
mod commands;
mod config;
mod error;
mod groups;
mod inventory;
mod jobs;
mod models;
mod pipeline;
mod policy;
mod services;
mod utils;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use jobs::SetupRunner;
use services::ssh::{SshCommandExecutor, SshQueryService};
use services::{CommandExecutor, QueryService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cbrs_setup=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let cfg = Config::load();
    tracing::info!("Starting CBRS setup");
    tracing::info!("Scripting hosts: {}", cfg.scripting_hosts.join(", "));
    tracing::info!(
        "Devices required: {}",
        cfg.devices_required
            .iter()
            .map(|(t, n)| format!("{}={}", t, n))
            .collect::<Vec<_>>()
            .join(",")
    );
    if cfg.has_sa_dc() {
        tracing::info!("Standalone domain coordinator: {}", cfg.sa_dc_cluster_ip_list);
    }
    if cfg.dry_run {
        tracing::info!("Dry run: commands will be planned but not executed");
    }

    let query: Arc<dyn QueryService> = Arc::new(SshQueryService::new(&cfg)?);

    let plan = match pipeline::plan(query.as_ref(), &cfg).await {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!("CBRS setup aborted: {}", e);
            return Err(e.into());
        }
    };

    for command in &plan.groups.commands {
        tracing::info!("{}", command);
    }

    let summary = if cfg.dry_run {
        pipeline::summarize(&plan, None, &cfg)
    } else {
        let executor: Arc<dyn CommandExecutor> = Arc::new(SshCommandExecutor::new(&cfg));
        let runner = SetupRunner::new(executor, query.clone(), &cfg)?;
        let report = runner.execute(&plan).await;
        let summary = pipeline::summarize(&plan, Some(&report), &cfg);

        if cfg.teardown_after_run {
            let failures = runner.teardown(&plan, &report).await;
            if failures.is_empty() {
                tracing::info!("Teardown complete");
            } else {
                tracing::warn!("Teardown finished with {} failed commands", failures.len());
            }
        }
        summary
    };

    println!("{}", summary);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if summary.has_failures() {
        tracing::warn!("CBRS setup finished with failures");
    } else {
        tracing::info!("CBRS setup finished");
    }
    Ok(())
}
