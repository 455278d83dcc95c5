use serde::Serialize;
use std::collections::BTreeMap;

use super::device::DeviceType;
use crate::error::CbrsError;

/// Raw hardware evidence indexed per node
#[derive(Debug, Clone, Default, Serialize)]
pub struct HardwareInventory {
    /// productData fragments mentioning a known radio product, capped per node
    pub product_data: BTreeMap<String, Vec<String>>,
    pub fru_count: BTreeMap<String, usize>,
    /// Only 2 or 4 are ever recorded
    pub rf_branch_count: BTreeMap<String, u32>,
}

impl HardwareInventory {
    pub fn fragments(&self, node_id: &str) -> &[String] {
        self.product_data
            .get(node_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn fru_count(&self, node_id: &str) -> usize {
        self.fru_count.get(node_id).copied().unwrap_or(0)
    }

    pub fn rf_branch_count(&self, node_id: &str) -> Option<u32> {
        self.rf_branch_count.get(node_id).copied()
    }
}

/// Output of the device classifier
#[derive(Debug, Clone, Default)]
pub struct ClassificationResult {
    /// Candidate node ids per type, in node id order
    pub candidates: BTreeMap<DeviceType, Vec<String>>,
    /// Devices each classified node contributes
    pub device_counts: BTreeMap<String, u32>,
    /// Nodes that had evidence but failed a classification check
    pub rejected: Vec<CbrsError>,
}

impl ClassificationResult {
    pub fn assign(&mut self, node_id: &str, device_type: DeviceType, device_count: u32) {
        self.candidates
            .entry(device_type)
            .or_default()
            .push(node_id.to_string());
        self.device_counts.insert(node_id.to_string(), device_count);
    }

    pub fn candidates_for(&self, device_type: DeviceType) -> &[String] {
        self.candidates
            .get(&device_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn device_count(&self, node_id: &str) -> Option<u32> {
        self.device_counts.get(node_id).copied()
    }

    #[cfg(test)]
    pub fn type_of(&self, node_id: &str) -> Option<DeviceType> {
        self.candidates
            .iter()
            .find(|(_, nodes)| nodes.iter().any(|n| n == node_id))
            .map(|(t, _)| *t)
    }

    pub fn classified_count(&self) -> usize {
        self.device_counts.len()
    }
}

/// Nodes chosen for one configured device type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub device_type: DeviceType,
    pub target: u32,
    pub nodes: Vec<String>,
    pub achieved: u32,
}

/// Output of the allocation selector
#[derive(Debug, Clone, Default)]
pub struct AllocationPlan {
    /// One entry per configured type, in configuration order
    pub selections: Vec<Selection>,
    /// Every selected node, in selection order
    pub used_nodes: Vec<String>,
    pub passive_das: Vec<String>,
    /// node id -> type it was selected under
    pub assignments: BTreeMap<String, DeviceType>,
}

impl AllocationPlan {
    pub fn is_used(&self, node_id: &str) -> bool {
        self.assignments.contains_key(node_id)
    }

    #[cfg(test)]
    pub fn selected(&self, device_type: DeviceType) -> &[String] {
        self.selections
            .iter()
            .find(|s| s.device_type == device_type)
            .map(|s| s.nodes.as_slice())
            .unwrap_or(&[])
    }

    #[cfg(test)]
    pub fn achieved(&self, device_type: DeviceType) -> u32 {
        self.selections
            .iter()
            .filter(|s| s.device_type == device_type)
            .map(|s| s.achieved)
            .sum()
    }

    pub fn type_of(&self, node_id: &str) -> Option<DeviceType> {
        self.assignments.get(node_id).copied()
    }
}

/// A named set of cells on one node registered as one CBRS unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub node_id: String,
    /// Type the node was selected under
    pub device_type: DeviceType,
    /// Cell names, in node order
    pub cells: Vec<String>,
    pub subnetwork: String,
    pub command: String,
}

impl Group {
    /// "node:cell,cell,..." as used by policy commands
    pub fn descriptor(&self) -> String {
        format!("{}:{}", self.node_id, self.cells.join(","))
    }
}

/// Output of the group planner
#[derive(Debug, Clone, Default)]
pub struct GroupPlan {
    /// Deduplicated, lexicographically sorted add commands
    pub commands: Vec<String>,
    /// Groups in generation order
    pub groups: Vec<Group>,
    pub skipped: Vec<CbrsError>,
}

impl GroupPlan {
    /// node id -> group descriptors, in generation order
    pub fn cell_grouping_index(&self) -> BTreeMap<String, Vec<String>> {
        let mut index: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for group in &self.groups {
            index
                .entry(group.node_id.clone())
                .or_default()
                .push(group.descriptor());
        }
        index
    }
}

/// PAL / mixpalgaa choice for one device type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyTarget {
    pub device_type: DeviceType,
    pub groups_available: usize,
    pub pal_wanted: usize,
    pub mixpalgaa_wanted: usize,
    pub pal: Vec<Group>,
    pub mixpalgaa: Vec<Group>,
}

/// Output of the policy allocator
#[derive(Debug, Clone, Default, Serialize)]
pub struct PolicySelection {
    pub targets: Vec<PolicyTarget>,
}

impl PolicySelection {
    pub fn target(&self, device_type: DeviceType) -> Option<&PolicyTarget> {
        self.targets.iter().find(|t| t.device_type == device_type)
    }

    pub fn pal_groups(&self) -> impl Iterator<Item = &Group> {
        self.targets.iter().flat_map(|t| t.pal.iter())
    }

    pub fn mixpalgaa_groups(&self) -> impl Iterator<Item = &Group> {
        self.targets.iter().flat_map(|t| t.mixpalgaa.iter())
    }
}
