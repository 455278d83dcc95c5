use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::device::DeviceType;

/// Devices expected vs. achieved for one configured type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceTally {
    pub device_type: DeviceType,
    pub expected: u32,
    pub achieved: u32,
}

/// PAL / mixpalgaa groups wanted vs. applied for one type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyTally {
    pub device_type: DeviceType,
    pub groups_available: usize,
    pub pal_wanted: usize,
    pub pal_applied: usize,
    pub mixpalgaa_wanted: usize,
    pub mixpalgaa_applied: usize,
}

/// End-of-run report
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: uuid::Uuid,
    pub generated_at: DateTime<Utc>,
    pub dry_run: bool,
    pub devices: Vec<DeviceTally>,
    pub groups_expected: usize,
    pub groups_added: usize,
    pub mapped_nodes: usize,
    /// node id -> "node:cell,cell,..." descriptors of its planned groups
    pub cell_groups: BTreeMap<String, Vec<String>>,
    pub policies: Vec<PolicyTally>,
    pub rejected_nodes: Vec<String>,
    pub skipped_nodes: Vec<String>,
    pub failed_commands: Vec<String>,
    pub failed_maintenance_users: Vec<String>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed_commands.is_empty() || !self.failed_maintenance_users.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CBRS setup run {} ({})", self.run_id, self.generated_at.to_rfc3339())?;
        if self.dry_run {
            writeln!(f, "Dry run: no commands were executed")?;
        }
        writeln!(f, "Devices (expected / added):")?;
        for tally in &self.devices {
            writeln!(f, "  {:<16} {} / {}", tally.device_type, tally.expected, tally.achieved)?;
        }
        writeln!(
            f,
            "Groups (expected / added): {} / {}",
            self.groups_expected, self.groups_added
        )?;
        writeln!(f, "Nodes mapped to standalone domain coordinator: {}", self.mapped_nodes)?;
        writeln!(f, "Cell groups:")?;
        for (node_id, groups) in &self.cell_groups {
            writeln!(f, "  {}: {}", node_id, groups.join(" "))?;
        }
        for tally in &self.policies {
            writeln!(
                f,
                "  {} groups: {} available, PAL {} / {}, mixpalgaa {} / {}",
                tally.device_type,
                tally.groups_available,
                tally.pal_wanted,
                tally.pal_applied,
                tally.mixpalgaa_wanted,
                tally.mixpalgaa_applied
            )?;
        }
        write_list(f, "Rejected nodes", &self.rejected_nodes)?;
        write_list(f, "Skipped nodes", &self.skipped_nodes)?;
        write_list(f, "Failed commands", &self.failed_commands)?;
        write_list(f, "MaintenanceUser MO failed on nodes", &self.failed_maintenance_users)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, title: &str, items: &[String]) -> fmt::Result {
    writeln!(f, "{} [{}]:", title, items.len())?;
    for item in items {
        writeln!(f, "  - {}", item)?;
    }
    Ok(())
}
