use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::commands::{self, CommandRenderer, DEFAULT_CBRS_FUNCTION, UNSET_CHANNEL_MASK};
use crate::config::{Config, Timings};
use crate::error::CbrsError;
use crate::inventory::reports_no_instances;
use crate::models::{DeviceType, Group};
use crate::pipeline::SetupPlan;
use crate::services::{query_with_retry, CommandExecutor, CommandOutcome, QueryService};
use crate::utils::truncate_lines;

/// Outcome of executing a setup plan
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub groups_added: usize,
    /// ManagedElement paths successfully mapped to the SA DC
    pub mapped_elements: Vec<String>,
    pub pal_applied: BTreeMap<DeviceType, usize>,
    pub mixpalgaa_applied: BTreeMap<DeviceType, usize>,
    pub failed_commands: Vec<CbrsError>,
    pub failed_maintenance_users: Vec<String>,
}

/// How a command's outcome is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    /// Clean exit with some output
    Output,
    /// Clean exit only, for `--quiet` commands
    ExitStatus,
}

impl Completion {
    fn accepts(self, outcome: &CommandOutcome) -> bool {
        match self {
            Completion::Output => outcome.ok && !outcome.stdout.trim().is_empty(),
            Completion::ExitStatus => outcome.ok,
        }
    }
}

/// SetupRunner executes a planned CBRS setup against the scripting hosts
pub struct SetupRunner {
    executor: Arc<dyn CommandExecutor>,
    query: Arc<dyn QueryService>,
    renderer: CommandRenderer,
    hosts: Vec<String>,
    timings: Timings,
    sas_url: String,
    sa_dc: String,
}

impl SetupRunner {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        query: Arc<dyn QueryService>,
        config: &Config,
    ) -> Result<Self, CbrsError> {
        Ok(Self {
            executor,
            query,
            renderer: CommandRenderer::new()?,
            hosts: config.scripting_hosts.clone(),
            timings: config.timings.clone(),
            sas_url: config.sas_url.trim().to_string(),
            sa_dc: config.sa_dc_cluster_ip_list.trim().to_string(),
        })
    }

    /// Run cleanup, SAS configuration, mapping, group creation and policies, in that order.
    /// Individual command failures are recorded and never stop the remaining work.
    pub async fn execute(&self, plan: &SetupPlan) -> RunReport {
        let mut report = RunReport::default();

        self.cleanup().await;

        if !self.sas_url.is_empty() {
            tracing::info!("Configuring SAS url {}", self.sas_url);
            let command = self.renderer.sas_config(&self.sa_dc, &self.sas_url);
            self.run_recorded(command, self.timings.policy_settle, &mut report)
                .await;
        }

        if !self.sa_dc.is_empty() {
            let elements = plan.selected_elements();
            self.create_maintenance_users(&elements, &mut report).await;
            tracing::info!("Mapping {} nodes to {}", elements.len(), self.sa_dc);
            for (_, me_path) in &elements {
                let command = self.renderer.map(&self.sa_dc, me_path);
                if self
                    .run_recorded(command, self.timings.policy_settle, &mut report)
                    .await
                {
                    report.mapped_elements.push(me_path.clone());
                }
            }
        }

        tracing::info!("Adding {} CBRS groups", plan.groups.commands.len());
        for command in &plan.groups.commands {
            if self
                .run_recorded(Ok(command.clone()), self.timings.add_settle, &mut report)
                .await
            {
                report.groups_added += 1;
            }
        }

        self.apply_pal(plan, &mut report).await;
        self.apply_mixpalgaa(plan, &mut report).await;

        tracing::info!(
            "Setup finished: {} groups added, {} nodes mapped, {} failed commands",
            report.groups_added,
            report.mapped_elements.len(),
            report.failed_commands.len()
        );
        report
    }

    /// Undo a previous `execute`: unmap, unset channel masks, unset mixpalgaa, remove groups.
    /// Only nodes `run` mapped are unmapped. Every step runs even when earlier ones fail.
    pub async fn teardown(&self, plan: &SetupPlan, run: &RunReport) -> Vec<CbrsError> {
        let mut report = RunReport::default();
        let settle = self.timings.policy_settle;

        if !run.mapped_elements.is_empty() {
            tracing::info!("Unmapping {} nodes", run.mapped_elements.len());
            for me_path in &run.mapped_elements {
                let command = self.renderer.map(DEFAULT_CBRS_FUNCTION, me_path);
                self.run_recorded(command, settle, &mut report).await;
            }
        }

        tracing::info!("Unsetting channel masks");
        for group in plan.policies.pal_groups() {
            let command = self.renderer.channel_mask(UNSET_CHANNEL_MASK, group);
            self.run_recorded(command, settle, &mut report).await;
            let command = self.renderer.mixpal_channel_mask(false, group);
            self.run_recorded(command, settle, &mut report).await;
        }

        tracing::info!("Unsetting mixpalgaa");
        for group in plan.policies.mixpalgaa_groups() {
            let command = self.renderer.mixpalgaa(true, group);
            self.run_recorded(command, settle, &mut report).await;
        }

        tracing::info!("Removing CBRS groups");
        let command = self.renderer.remove_all(&self.sa_dc);
        self.run_recorded_as(
            command,
            self.timings.remove_settle,
            Completion::ExitStatus,
            &mut report,
        )
        .await;

        report.failed_commands
    }

    /// Remove groups left from an earlier run, then wait for the removal to settle.
    /// Failure only logs.
    async fn cleanup(&self) {
        tracing::info!("Removing any existing CBRS groups");
        match self.renderer.remove_all(&self.sa_dc) {
            Ok(command) => {
                if let Err(e) = self
                    .run_command(&command, Duration::ZERO, Completion::ExitStatus)
                    .await
                {
                    tracing::warn!("Cleanup failed, continuing: {}", e);
                }
            }
            Err(e) => tracing::warn!("{}", e),
        }
        tokio::time::sleep(self.timings.remove_settle).await;
    }

    async fn create_maintenance_users(
        &self,
        elements: &[(String, String)],
        report: &mut RunReport,
    ) {
        tracing::info!("Creating MaintenanceUser MO on {} nodes", elements.len());
        for (node_id, me_path) in elements {
            let command = match self.renderer.maintenance_user(me_path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("{}", e);
                    report.failed_maintenance_users.push(node_id.clone());
                    continue;
                }
            };
            match query_with_retry(self.query.as_ref(), &command, &self.timings).await {
                Ok(lines) if !reports_no_instances(&lines) => {
                    tracing::debug!("MaintenanceUser created on {}", node_id);
                }
                Ok(lines) => {
                    tracing::warn!(
                        "MaintenanceUser MO not created on {}: {}",
                        node_id,
                        lines.join(" ").trim()
                    );
                    report.failed_maintenance_users.push(node_id.clone());
                }
                Err(e) => {
                    tracing::warn!("MaintenanceUser MO not created on {}: {}", node_id, e);
                    report.failed_maintenance_users.push(node_id.clone());
                }
            }
        }
    }

    /// Channel mask and mixpal channel mask on PAL groups, 6488 first
    async fn apply_pal(&self, plan: &SetupPlan, report: &mut RunReport) {
        for device_type in [DeviceType::Radio6488, DeviceType::Radio4408] {
            let Some(target) = plan.policies.target(device_type) else {
                continue;
            };
            let Some(mask) = commands::channel_mask(device_type) else {
                continue;
            };
            tracing::info!("Setting PAL policy on {} {} groups", target.pal.len(), device_type);

            let mut applied = 0;
            for group in &target.pal {
                if self.set_pal(mask, group, report).await {
                    applied += 1;
                }
            }
            report.pal_applied.insert(device_type, applied);
        }
    }

    async fn set_pal(&self, mask: &str, group: &Group, report: &mut RunReport) -> bool {
        let settle = self.timings.policy_settle;
        let masked = self
            .run_recorded(self.renderer.channel_mask(mask, group), settle, report)
            .await;
        let mixed = self
            .run_recorded(self.renderer.mixpal_channel_mask(true, group), settle, report)
            .await;
        masked && mixed
    }

    async fn apply_mixpalgaa(&self, plan: &SetupPlan, report: &mut RunReport) {
        for target in &plan.policies.targets {
            tracing::info!(
                "Setting mixpalgaa on {} {} groups",
                target.mixpalgaa.len(),
                target.device_type
            );
            let mut applied = 0;
            for group in &target.mixpalgaa {
                let command = self.renderer.mixpalgaa(false, group);
                if self
                    .run_recorded(command, self.timings.policy_settle, report)
                    .await
                {
                    applied += 1;
                }
            }
            report.mixpalgaa_applied.insert(target.device_type, applied);
        }
    }

    /// Run a rendered command, recording any failure. Returns true on success.
    async fn run_recorded(
        &self,
        command: Result<String, CbrsError>,
        settle: Duration,
        report: &mut RunReport,
    ) -> bool {
        self.run_recorded_as(command, settle, Completion::Output, report)
            .await
    }

    async fn run_recorded_as(
        &self,
        command: Result<String, CbrsError>,
        settle: Duration,
        completion: Completion,
        report: &mut RunReport,
    ) -> bool {
        let result = match command {
            Ok(command) => self
                .run_command(&command, settle, completion)
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                if e.is_fatal() {
                    tracing::error!("{}", e);
                } else {
                    tracing::warn!("{}", e);
                }
                report.failed_commands.push(e);
                false
            }
        }
    }

    /// Run one command on a random scripting host with a fixed number of attempts.
    /// The settle sleep follows a successful attempt only.
    async fn run_command(
        &self,
        command: &str,
        settle: Duration,
        completion: Completion,
    ) -> Result<CommandOutcome, CbrsError> {
        let attempts = self.timings.command_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let Some(host) = self.hosts.choose(&mut rand::thread_rng()) else {
                return Err(CbrsError::command_failure(
                    command,
                    "no scripting host configured",
                ));
            };
            tracing::debug!(
                "Running '{}' on {} (attempt {}/{})",
                command,
                host,
                attempt,
                attempts
            );

            match self.executor.run(command, host).await {
                Ok(outcome) if completion.accepts(&outcome) => {
                    tracing::debug!(
                        "'{}' completed in {:.2}s",
                        command,
                        outcome.elapsed.as_secs_f64()
                    );
                    tokio::time::sleep(settle).await;
                    return Ok(outcome);
                }
                Ok(outcome) if outcome.stdout.trim().is_empty() => {
                    last_error = format!("no output from {}", host);
                }
                Ok(outcome) => {
                    last_error = format!(
                        "failed on {}: {}",
                        host,
                        truncate_lines(outcome.stdout.trim(), 5)
                    );
                }
                Err(e) => {
                    last_error = format!("{} unreachable: {}", host, e);
                }
            }

            if attempt < attempts {
                tracing::debug!("'{}' {}, retrying", command, last_error);
                tokio::time::sleep(self.timings.command_retry_wait).await;
            }
        }

        Err(CbrsError::command_failure(
            command,
            format!("{} after {} attempts", last_error, attempts),
        ))
    }
}
