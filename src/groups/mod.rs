//! Slicing of selected nodes into CBRS groups and rendering of their add commands.

use crate::commands::CommandRenderer;
use crate::error::CbrsError;
use crate::models::cell;
use crate::models::{
    AllocationPlan, ClassificationResult, DeviceType, Group, GroupPlan, RadioFamily, SortedCells,
};

/// How a node with a given device count and cell count is split into groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRule {
    pub device_type: DeviceType,
    pub devices: u32,
    pub cells: usize,
    pub cells_to_add: usize,
    pub groups_to_create: usize,
}

const fn rule(
    device_type: DeviceType,
    devices: u32,
    cells: usize,
    cells_to_add: usize,
    groups_to_create: usize,
) -> GroupRule {
    GroupRule {
        device_type,
        devices,
        cells,
        cells_to_add,
        groups_to_create,
    }
}

pub const LTE_RULES: &[GroupRule] = &[
    rule(DeviceType::Radio4408, 2, 12, 6, 2),
    rule(DeviceType::Radio4408, 1, 6, 6, 1),
    rule(DeviceType::Radio6488, 1, 6, 6, 1),
    rule(DeviceType::Radio2208, 2, 6, 3, 2),
    rule(DeviceType::Radio4408, 1, 3, 3, 1),
    rule(DeviceType::Radio6488, 1, 3, 3, 1),
    rule(DeviceType::RadioDot, 24, 12, 4, 3),
    rule(DeviceType::RadioDot, 48, 12, 2, 6),
];

pub const NR_RULES: &[GroupRule] = &[
    rule(DeviceType::Nr4408, 6, 12, 2, 6),
    rule(DeviceType::Nr4408, 3, 6, 2, 3),
];

/// (cells_to_add, groups_to_create) for NR nodes outside NR_RULES
pub const NR_FALLBACK: (usize, usize) = (2, 1);

/// Look up (cells_to_add, groups_to_create) for a node.
///
/// LTE lookups use the type's pool so PassiveDas_4408 follows the 4408 rules. NR nodes
/// always resolve, falling back to a single two-cell group.
pub fn rule_for(
    family: RadioFamily,
    device_type: DeviceType,
    devices: u32,
    cells: usize,
) -> Option<(usize, usize)> {
    match family {
        RadioFamily::Nr => Some(
            NR_RULES
                .iter()
                .find(|r| r.devices == devices && r.cells == cells)
                .map(|r| (r.cells_to_add, r.groups_to_create))
                .unwrap_or(NR_FALLBACK),
        ),
        RadioFamily::Lte => {
            let pool = device_type.pool_type();
            LTE_RULES
                .iter()
                .find(|r| r.device_type == pool && r.devices == devices && r.cells == cells)
                .map(|r| (r.cells_to_add, r.groups_to_create))
        }
    }
}

/// Build the groups and add commands for every selected node, in selection order.
///
/// Nodes without a matching rule, or whose rule does not cover their cells exactly, are
/// skipped and reported in `GroupPlan::skipped`.
pub fn plan(
    allocation: &AllocationPlan,
    classification: &ClassificationResult,
    cells: &SortedCells,
    renderer: &CommandRenderer,
) -> Result<GroupPlan, CbrsError> {
    let mut plan = GroupPlan::default();

    for node_id in &allocation.used_nodes {
        let (Some(device_type), Some(node)) = (allocation.type_of(node_id), cells.get(node_id))
        else {
            tracing::warn!("{} was selected but has no cell data, skipping", node_id);
            continue;
        };
        let devices = classification.device_count(node_id).unwrap_or(0);
        let cell_count = node.cell_count();

        let Some((cells_to_add, groups_to_create)) =
            rule_for(node.family, device_type, devices, cell_count)
        else {
            let err = CbrsError::NodeClassificationMismatch {
                node: node_id.clone(),
                reason: format!(
                    "no group rule for {} with {} devices and {} cells",
                    device_type, devices, cell_count
                ),
            };
            tracing::warn!("{}", err);
            plan.skipped.push(err);
            continue;
        };

        if cells_to_add * groups_to_create != cell_count {
            let err = CbrsError::GroupSizeMismatch {
                node: node_id.clone(),
                cells_to_add,
                groups_to_create,
                cell_count,
            };
            tracing::warn!("{}", err);
            plan.skipped.push(err);
            continue;
        }

        let subnetwork = node.subnetwork_path();
        for window in node.cells.chunks(cells_to_add).take(groups_to_create) {
            let names: Vec<&str> = window.iter().map(|fdn| cell::cell_name(fdn)).collect();
            let command = renderer.add_group(node.family, &subnetwork, node_id, &names)?;
            tracing::debug!("{}: {}", node_id, command);
            plan.groups.push(Group {
                node_id: node_id.clone(),
                device_type,
                cells: names.iter().map(|n| n.to_string()).collect(),
                subnetwork: subnetwork.clone(),
                command,
            });
        }
    }

    let mut commands: Vec<String> = plan.groups.iter().map(|g| g.command.clone()).collect();
    commands.sort();
    commands.dedup();
    plan.commands = commands;

    tracing::info!(
        "Planned {} groups on {} nodes ({} nodes skipped)",
        plan.groups.len(),
        allocation.used_nodes.len().saturating_sub(plan.skipped.len()),
        plan.skipped.len()
    );
    Ok(plan)
}
