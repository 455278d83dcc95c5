//! Planning pass and run summary. Each stage consumes the previous stage's output only.

use crate::allocation;
use crate::classify;
use crate::commands::CommandRenderer;
use crate::config::Config;
use crate::error::CbrsError;
use crate::groups;
use crate::inventory;
use crate::jobs::RunReport;
use crate::models::*;
use crate::policy;
use crate::services::QueryService;

/// Everything a setup run decided before issuing any command
#[derive(Debug, Clone, Default)]
pub struct SetupPlan {
    pub cells: SortedCells,
    pub classification: ClassificationResult,
    pub allocation: AllocationPlan,
    pub groups: GroupPlan,
    pub policies: PolicySelection,
}

impl SetupPlan {
    /// (node id, ManagedElement path) of every selected node, in selection order
    pub fn selected_elements(&self) -> Vec<(String, String)> {
        self.allocation
            .used_nodes
            .iter()
            .filter_map(|node_id| {
                let me_path = self.cells.get(node_id)?.managed_element_path()?;
                Some((node_id.clone(), me_path.to_string()))
            })
            .collect()
    }
}

/// Collect inventory and derive groups and policies. Only inventory and rendering
/// failures abort; node level problems are carried in the plan.
pub async fn plan(query: &dyn QueryService, config: &Config) -> Result<SetupPlan, CbrsError> {
    let cells =
        inventory::cells::collect(query, config.nr_cells_required(), &config.timings).await?;
    let hardware = inventory::hardware::collect(query, &cells, &config.timings).await;
    let classification = classify::classify(&cells, &hardware);
    let allocation = allocation::select(&classification, &config.devices_required);
    let renderer = CommandRenderer::new()?;
    let groups = groups::plan(&allocation, &classification, &cells, &renderer)?;
    let policies = policy::allocate(&groups, config.pal_percentage, config.mixpalgaa_percentage);

    Ok(SetupPlan {
        cells,
        classification,
        allocation,
        groups,
        policies,
    })
}

/// Build the end-of-run report. Without a run report (dry run) nothing counts as added.
pub fn summarize(plan: &SetupPlan, report: Option<&RunReport>, config: &Config) -> RunSummary {
    let devices = plan
        .allocation
        .selections
        .iter()
        .map(|s| DeviceTally {
            device_type: s.device_type,
            expected: s.target,
            achieved: s.achieved,
        })
        .collect();

    let policies = plan
        .policies
        .targets
        .iter()
        .map(|t| PolicyTally {
            device_type: t.device_type,
            groups_available: t.groups_available,
            pal_wanted: t.pal_wanted,
            pal_applied: report
                .and_then(|r| r.pal_applied.get(&t.device_type).copied())
                .unwrap_or(0),
            mixpalgaa_wanted: t.mixpalgaa_wanted,
            mixpalgaa_applied: report
                .and_then(|r| r.mixpalgaa_applied.get(&t.device_type).copied())
                .unwrap_or(0),
        })
        .collect();

    RunSummary {
        run_id: uuid::Uuid::new_v4(),
        generated_at: chrono::Utc::now(),
        dry_run: report.is_none() || config.dry_run,
        devices,
        groups_expected: plan.groups.commands.len(),
        groups_added: report.map(|r| r.groups_added).unwrap_or(0),
        mapped_nodes: report.map(|r| r.mapped_elements.len()).unwrap_or(0),
        cell_groups: plan.groups.cell_grouping_index(),
        policies,
        rejected_nodes: plan.classification.rejected.iter().map(|e| e.to_string()).collect(),
        skipped_nodes: plan.groups.skipped.iter().map(|e| e.to_string()).collect(),
        failed_commands: report
            .map(|r| r.failed_commands.iter().map(|e| e.to_string()).collect())
            .unwrap_or_default(),
        failed_maintenance_users: report
            .map(|r| r.failed_maintenance_users.clone())
            .unwrap_or_default(),
    }
}
