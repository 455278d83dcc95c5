//! Node to device-type classification from cell counts and hardware evidence.

use crate::error::CbrsError;
use crate::groups;
use crate::models::{
    ClassificationResult, DeviceType, HardwareInventory, NodeCells, RadioFamily, SortedCells,
};

/// Catalog types tried against a node's first hardware fragment, first match wins
pub const CATALOG_PRIORITY: [DeviceType; 3] = [
    DeviceType::Radio6488,
    DeviceType::Radio2208,
    DeviceType::Radio4408,
];

/// 12-cell nodes with fewer FRUs carry no usable radio evidence
pub const MIN_FRUS_TWELVE_CELLS: usize = 2;
/// 12-cell nodes with more FRUs than this are RadioDot systems
pub const MAX_FRUS_BEFORE_RADIO_DOT: usize = 40;

/// Hardware fragments counted towards a catalog node's device count
const DEVICE_COUNT_FRAGMENTS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
enum Verdict {
    Classified(DeviceType, u32),
    Excluded(String),
}

/// Assign every node a device type and device count.
///
/// Nodes without evidence are excluded quietly. Nodes that classify to a combination no
/// group rule can split are reported as `NodeClassificationMismatch`.
pub fn classify(cells: &SortedCells, hardware: &HardwareInventory) -> ClassificationResult {
    let mut result = ClassificationResult::default();

    for (node_id, node) in cells {
        let (device_type, devices) = match classify_node(node, hardware) {
            Verdict::Classified(t, n) => (t, n),
            Verdict::Excluded(reason) => {
                tracing::debug!("{} excluded: {}", node_id, reason);
                continue;
            }
        };

        let cell_count = node.cell_count();
        let sound = groups::rule_for(node.family, device_type, devices, cell_count)
            .map(|(cells_to_add, groups_to_create)| cells_to_add * groups_to_create == cell_count);
        match sound {
            Some(true) => {
                tracing::debug!(
                    "{} classified as {} with {} devices ({} cells)",
                    node_id,
                    device_type,
                    devices,
                    cell_count
                );
                result.assign(node_id, device_type, devices);
            }
            Some(false) | None => {
                let err = CbrsError::NodeClassificationMismatch {
                    node: node_id.clone(),
                    reason: format!(
                        "{} with {} devices does not fit {} cells",
                        device_type, devices, cell_count
                    ),
                };
                tracing::warn!("{}", err);
                result.rejected.push(err);
            }
        }
    }

    tracing::info!(
        "Classified {} of {} nodes ({} rejected)",
        result.classified_count(),
        cells.len(),
        result.rejected.len()
    );
    for (device_type, nodes) in &result.candidates {
        tracing::info!("{} candidates: {}", device_type, nodes.len());
    }
    result
}

fn classify_node(node: &NodeCells, hardware: &HardwareInventory) -> Verdict {
    let cell_count = node.cell_count();

    if node.family == RadioFamily::Nr {
        // NR nodes have no catalog cross-check
        return match cell_count {
            12 => Verdict::Classified(DeviceType::Nr4408, 6),
            6 => Verdict::Classified(DeviceType::Nr4408, 3),
            3 => Verdict::Classified(DeviceType::Nr4408, 1),
            n => Verdict::Excluded(format!("NR node with {} cells", n)),
        };
    }

    if cell_count == 12 {
        let frus = hardware.fru_count(&node.node_id);
        if frus < MIN_FRUS_TWELVE_CELLS {
            return Verdict::Excluded(format!("12 cells but only {} FRUs", frus));
        }
        if frus > MAX_FRUS_BEFORE_RADIO_DOT {
            return match hardware.rf_branch_count(&node.node_id) {
                Some(4) => Verdict::Classified(DeviceType::RadioDot, 48),
                Some(2) => Verdict::Classified(DeviceType::RadioDot, 24),
                other => Verdict::Excluded(format!(
                    "{} FRUs but RF branch count {:?} is not 2 or 4",
                    frus, other
                )),
            };
        }
    }

    if !matches!(cell_count, 3 | 6 | 12) {
        return Verdict::Excluded(format!("no device type for {} cells", cell_count));
    }

    let fragments = hardware.fragments(&node.node_id);
    let Some(first) = fragments.first() else {
        return Verdict::Excluded("no hardware data".to_string());
    };

    for device_type in CATALOG_PRIORITY {
        let Some(number) = device_type.catalog_number() else {
            continue;
        };
        if first.contains(number) {
            let devices = fragments
                .iter()
                .take(DEVICE_COUNT_FRAGMENTS)
                .filter(|f| f.contains(number))
                .count() as u32;
            return Verdict::Classified(device_type, devices);
        }
    }

    Verdict::Excluded("first hardware fragment matches no known radio".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product_number;

    fn node(id: &str, cells: u32) -> NodeCells {
        NodeCells {
            node_id: id.to_string(),
            family: RadioFamily::of_node(id),
            cells: (1..=cells)
                .map(|i| format!("ManagedElement={},Cell={}-{}", id, id, i))
                .collect(),
        }
    }

    struct Fixture {
        cells: SortedCells,
        hardware: HardwareInventory,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                cells: SortedCells::new(),
                hardware: HardwareInventory::default(),
            }
        }

        fn node(mut self, id: &str, cells: u32, frus: usize, products: &[&str]) -> Self {
            self.cells.insert(id.to_string(), node(id, cells));
            self.hardware.fru_count.insert(id.to_string(), frus);
            self.hardware.product_data.insert(
                id.to_string(),
                products
                    .iter()
                    .map(|p| {
                        format!(
                            " SubNetwork=Europe,ManagedElement={},Equipment=1 productData {{productNumber={}}}",
                            id, p
                        )
                    })
                    .collect(),
            );
            self
        }

        fn rf(mut self, id: &str, branches: u32) -> Self {
            self.hardware.rf_branch_count.insert(id.to_string(), branches);
            self
        }

        fn run(&self) -> ClassificationResult {
            classify(&self.cells, &self.hardware)
        }
    }

    #[test]
    fn test_single_4408_with_six_cells() {
        let result = Fixture::new()
            .node("N1", 6, 1, &[product_number::RADIO_4408])
            .run();

        assert_eq!(result.candidates_for(DeviceType::Radio4408), &["N1".to_string()]);
        assert_eq!(result.device_count("N1"), Some(1));
        assert!(result.rejected.is_empty());
    }

    #[test]
    fn test_nr_device_counts() {
        let result = Fixture::new()
            .node("NR01gNodeBRadio00001", 12, 0, &[])
            .node("NR02gNodeBRadio00001", 6, 0, &[])
            .run();

        assert_eq!(result.device_count("NR01gNodeBRadio00001"), Some(6));
        assert_eq!(result.device_count("NR02gNodeBRadio00001"), Some(3));
        assert_eq!(result.candidates_for(DeviceType::Nr4408).len(), 2);
    }

    #[test]
    fn test_nr_three_cells_rejected() {
        let result = Fixture::new().node("NR03gNodeBRadio00001", 3, 0, &[]).run();

        assert_eq!(result.classified_count(), 0);
        assert!(matches!(
            &result.rejected[0],
            CbrsError::NodeClassificationMismatch { node, .. } if node == "NR03gNodeBRadio00001"
        ));
    }

    #[test]
    fn test_twelve_cells_needs_two_frus() {
        let result = Fixture::new()
            .node("LTE01", 12, 1, &[product_number::RADIO_4408])
            .run();

        assert_eq!(result.classified_count(), 0);
        assert!(result.rejected.is_empty());
    }

    #[test]
    fn test_radio_dot_by_rf_branches() {
        let result = Fixture::new()
            .node("DOT4", 12, 41, &[product_number::RADIO_DOT])
            .rf("DOT4", 4)
            .node("DOT2", 12, 60, &[])
            .rf("DOT2", 2)
            .node("DOTX", 12, 41, &[product_number::RADIO_DOT])
            .node("EDGE", 12, 40, &[product_number::RADIO_DOT])
            .run();

        assert_eq!(result.device_count("DOT4"), Some(48));
        assert_eq!(result.device_count("DOT2"), Some(24));
        assert_eq!(result.type_of("DOT4"), Some(DeviceType::RadioDot));
        // unknown RF branch count and 40 FRUs are not RadioDot
        assert_eq!(result.device_count("DOTX"), None);
        assert_eq!(result.device_count("EDGE"), None);
    }

    #[test]
    fn test_catalog_priority_uses_first_fragment() {
        let result = Fixture::new()
            .node("LTE6488", 6, 3, &[product_number::RADIO_6488, product_number::RADIO_4408])
            .node("LTE2208", 6, 2, &[product_number::RADIO_2208, product_number::RADIO_2208])
            .node("LTE4408", 12, 2, &[product_number::RADIO_4408, product_number::RADIO_4408])
            .run();

        assert_eq!(result.type_of("LTE6488"), Some(DeviceType::Radio6488));
        assert_eq!(result.device_count("LTE6488"), Some(1));
        assert_eq!(result.type_of("LTE2208"), Some(DeviceType::Radio2208));
        assert_eq!(result.device_count("LTE2208"), Some(2));
        assert_eq!(result.type_of("LTE4408"), Some(DeviceType::Radio4408));
        assert_eq!(result.device_count("LTE4408"), Some(2));
    }

    #[test]
    fn test_unsound_catalog_match_rejected() {
        let result = Fixture::new()
            .node("LTE2208", 12, 4, &[product_number::RADIO_2208, product_number::RADIO_2208])
            .node("LTE4408", 6, 2, &[product_number::RADIO_4408, product_number::RADIO_4408])
            .run();

        assert_eq!(result.classified_count(), 0);
        assert_eq!(result.rejected.len(), 2);
    }

    #[test]
    fn test_missing_evidence_is_not_an_error() {
        let result = Fixture::new()
            .node("LTE01", 6, 0, &[])
            .node("LTE02", 2, 1, &[product_number::RADIO_4408])
            .node("LTE03", 3, 1, &["KDU 137 925/31"])
            .run();

        assert_eq!(result.classified_count(), 0);
        assert!(result.rejected.is_empty());
    }

    #[test]
    fn test_every_classified_node_is_sound() {
        let result = Fixture::new()
            .node("A", 3, 1, &[product_number::RADIO_6488])
            .node("B", 6, 2, &[product_number::RADIO_2208, product_number::RADIO_2208])
            .node("C", 12, 45, &[])
            .rf("C", 2)
            .node("NR01gNodeBRadio00001", 6, 0, &[])
            .run();
        let cells = Fixture::new()
            .node("A", 3, 0, &[])
            .node("B", 6, 0, &[])
            .node("C", 12, 0, &[])
            .node("NR01gNodeBRadio00001", 6, 0, &[])
            .cells;

        assert_eq!(result.classified_count(), 4);
        for (node_id, devices) in &result.device_counts {
            let node = &cells[node_id];
            let device_type = result.type_of(node_id).unwrap();
            let (add, create) =
                groups::rule_for(node.family, device_type, *devices, node.cell_count()).unwrap();
            assert_eq!(add * create, node.cell_count());
        }
    }
}
