//! Selection of classified nodes up to the configured device targets.

use crate::models::{AllocationPlan, ClassificationResult, DeviceType, Selection};

/// Devices a PassiveDas_4408 node counts for, whatever its radios
pub const PASSIVE_DAS_DEVICES_PER_NODE: u32 = 10;

/// Walk the targets in configuration order and pick unused candidates until each target
/// is met or its pool runs dry. A node is never selected under two types.
pub fn select(
    classification: &ClassificationResult,
    required: &[(DeviceType, u32)],
) -> AllocationPlan {
    let mut plan = AllocationPlan::default();

    for &(device_type, target) in required {
        let mut selection = Selection {
            device_type,
            target,
            nodes: Vec::new(),
            achieved: 0,
        };

        for node_id in classification.candidates_for(device_type.pool_type()) {
            if selection.achieved >= target {
                break;
            }
            if plan.is_used(node_id) {
                continue;
            }
            let devices = match device_type {
                DeviceType::PassiveDas4408 => PASSIVE_DAS_DEVICES_PER_NODE,
                _ => classification.device_count(node_id).unwrap_or(0),
            };
            if devices == 0 {
                continue;
            }

            selection.nodes.push(node_id.clone());
            selection.achieved += devices;
            plan.used_nodes.push(node_id.clone());
            plan.assignments.insert(node_id.clone(), device_type);
            if device_type == DeviceType::PassiveDas4408 {
                plan.passive_das.push(node_id.clone());
            }
        }

        if selection.achieved < target {
            tracing::warn!(
                "Only {} of {} {} devices available",
                selection.achieved,
                target,
                device_type
            );
        } else {
            tracing::info!(
                "{}: {} devices on {} nodes (target {})",
                device_type,
                selection.achieved,
                selection.nodes.len(),
                target
            );
        }
        plan.selections.push(selection);
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn classification(nodes: &[(&str, DeviceType, u32)]) -> ClassificationResult {
        let mut result = ClassificationResult::default();
        for (id, t, n) in nodes {
            result.assign(id, *t, *n);
        }
        result
    }

    #[test]
    fn test_select_stops_at_target() {
        let c = classification(&[
            ("DOT1", DeviceType::RadioDot, 24),
            ("DOT2", DeviceType::RadioDot, 48),
            ("DOT3", DeviceType::RadioDot, 24),
        ]);

        let plan = select(&c, &[(DeviceType::RadioDot, 30)]);

        assert_eq!(plan.selected(DeviceType::RadioDot), &["DOT1".to_string(), "DOT2".to_string()]);
        assert_eq!(plan.achieved(DeviceType::RadioDot), 72);
        // overshoot stays below the last node's count
        assert!(72 - 30 < 48);
    }

    #[test]
    fn test_zero_target_selects_nothing() {
        let c = classification(&[("LTE01", DeviceType::Radio4408, 1)]);

        let plan = select(&c, &[(DeviceType::Radio4408, 0)]);

        assert!(plan.used_nodes.is_empty());
        assert_eq!(plan.selections.len(), 1);
    }

    #[test]
    fn test_exhausted_pool_is_partial() {
        let c = classification(&[("LTE01", DeviceType::Radio6488, 1)]);

        let plan = select(&c, &[(DeviceType::Radio6488, 5)]);

        assert_eq!(plan.achieved(DeviceType::Radio6488), 1);
        assert_eq!(plan.selections[0].target, 5);
    }

    #[test]
    fn test_passive_das_shares_4408_pool() {
        let c = classification(&[
            ("LTE01", DeviceType::Radio4408, 1),
            ("LTE02", DeviceType::Radio4408, 2),
            ("LTE03", DeviceType::Radio4408, 1),
            ("LTE04", DeviceType::Radio4408, 1),
        ]);

        let plan = select(
            &c,
            &[(DeviceType::Radio4408, 1), (DeviceType::PassiveDas4408, 20)],
        );

        assert_eq!(plan.selected(DeviceType::Radio4408), &["LTE01".to_string()]);
        assert_eq!(plan.passive_das, vec!["LTE02".to_string(), "LTE03".to_string()]);
        assert_eq!(plan.achieved(DeviceType::PassiveDas4408), 20);
        assert_eq!(plan.type_of("LTE02"), Some(DeviceType::PassiveDas4408));
        assert!(!plan.is_used("LTE04"));
    }

    #[test]
    fn test_selections_are_disjoint() {
        let c = classification(&[
            ("A", DeviceType::Radio4408, 1),
            ("B", DeviceType::Radio4408, 1),
            ("C", DeviceType::Radio6488, 1),
            ("D", DeviceType::Radio4408, 2),
        ]);
        let required = [
            (DeviceType::Radio4408, 2),
            (DeviceType::Radio6488, 1),
            (DeviceType::PassiveDas4408, 100),
        ];

        let plan = select(&c, &required);

        let mut seen = BTreeSet::new();
        for s in &plan.selections {
            for node in &s.nodes {
                assert!(seen.insert(node.clone()), "{} selected twice", node);
            }
        }
        assert_eq!(seen.len(), plan.used_nodes.len());
        assert_eq!(plan.passive_das, vec!["D".to_string()]);
    }
}
