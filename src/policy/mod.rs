//! PAL and mixpalgaa group selection.

use crate::models::{DeviceType, Group, GroupPlan, PolicySelection, PolicyTarget};

/// Device types that receive spectrum policies, in selection order
pub const POLICY_TYPES: [DeviceType; 2] = [DeviceType::Radio4408, DeviceType::Radio6488];

/// `count × fraction`, rounded half away from zero
pub fn round_target(count: usize, fraction: f64) -> usize {
    (count as f64 * fraction).round().max(0.0) as usize
}

/// Pick the first PAL share of each type's groups, then the first mixpalgaa share of
/// those. Groups count under the pool of the type their node was selected as.
pub fn allocate(
    plan: &GroupPlan,
    pal_percentage: f64,
    mixpalgaa_percentage: f64,
) -> PolicySelection {
    let mut selection = PolicySelection::default();

    for device_type in POLICY_TYPES {
        let available: Vec<&Group> = plan
            .groups
            .iter()
            .filter(|g| g.device_type.pool_type() == device_type)
            .collect();

        let pal_wanted = round_target(available.len(), pal_percentage);
        let mixpalgaa_wanted = round_target(pal_wanted, mixpalgaa_percentage);
        let pal: Vec<Group> = available.iter().take(pal_wanted).map(|g| (*g).clone()).collect();
        let mixpalgaa: Vec<Group> = pal.iter().take(mixpalgaa_wanted).cloned().collect();

        tracing::info!(
            "{}: {} groups, PAL {} wanted, mixpalgaa {} wanted",
            device_type,
            available.len(),
            pal_wanted,
            mixpalgaa_wanted
        );

        selection.targets.push(PolicyTarget {
            device_type,
            groups_available: available.len(),
            pal_wanted,
            mixpalgaa_wanted,
            pal,
            mixpalgaa,
        });
    }

    selection
}
