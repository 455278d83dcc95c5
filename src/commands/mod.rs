//! Named command templates for every cbrs / cmedit command the setup issues.

use tera::{Context, Tera};

use crate::error::CbrsError;
use crate::models::{DeviceType, Group, RadioFamily};

pub const ADD_LTE: &str = "add_lte";
pub const ADD_NR: &str = "add_nr";
pub const CHANNEL_MASK: &str = "channel_mask";
pub const MIXPAL_CHANNEL_MASK: &str = "mixpal_channel_mask";
pub const MIXPALGAA: &str = "mixpalgaa";
pub const MAP: &str = "map";
pub const SAS_CONFIG: &str = "sas_config";
pub const REMOVE_ALL: &str = "remove_all";
pub const MAINTENANCE_USER: &str = "maintenance_user";

const TEMPLATES: &[(&str, &str)] = &[
    (ADD_LTE, r#"cbrs add "{{ subnetwork }}{{ node }}:{{ cells }}""#),
    (ADD_NR, r#"cbrs add "{{ subnetwork }}{{ node }}:{{ node }}:{{ cells }}""#),
    (
        CHANNEL_MASK,
        r#"cbrs set --channelmask {{ mask }} "{{ subnetwork }}{{ group }}""#,
    ),
    (
        MIXPAL_CHANNEL_MASK,
        r#"cbrs set --mixpalchannelmask {{ enabled }} "{{ subnetwork }}{{ group }}""#,
    ),
    (
        MIXPALGAA,
        r#"cbrs set --mixpalgaa {{ enabled }} "{{ subnetwork }}{{ group }}""#,
    ),
    (MAP, "cbrs set --cbrsfunction {{ target }} {{ me_path }}"),
    (
        SAS_CONFIG,
        "cbrs config{% if sa_dc %} --cbrsfunction {{ sa_dc }}{% endif %} --sas-url {{ sas_url }}",
    ),
    (
        REMOVE_ALL,
        "cbrs remove --deregister all{% if sa_dc %} --cbrsfunction {{ sa_dc }}{% endif %} --quiet",
    ),
    (
        MAINTENANCE_USER,
        r#"cmedit create {{ me_path }},SystemFunctions=1,SecM=1,UserManagement=1,UserIdentity=1,MaintenanceUser=1 maintenanceUserId=1;subjectName="CN=MaintenanceUser""#,
    ),
];

/// Mask restoring every channel on teardown
pub const UNSET_CHANNEL_MASK: &str = "111111111111111";

/// Channel mask applied to PAL groups of a device type
pub fn channel_mask(device_type: DeviceType) -> Option<&'static str> {
    match device_type.pool_type() {
        DeviceType::Radio4408 => Some("111111111111100"),
        DeviceType::Radio6488 => Some("111111000000000"),
        _ => None,
    }
}

/// Mapping target that detaches a node from its SA DC
pub const DEFAULT_CBRS_FUNCTION: &str = "default";

pub struct CommandRenderer {
    tera: Tera,
}

impl CommandRenderer {
    pub fn new() -> Result<Self, CbrsError> {
        let mut tera = Tera::default();
        for (name, body) in TEMPLATES {
            tera.add_raw_template(name, body)
                .map_err(|e| CbrsError::Render {
                    template: name.to_string(),
                    detail: e.to_string(),
                })?;
        }
        Ok(Self { tera })
    }

    fn render(&self, template: &str, context: &Context) -> Result<String, CbrsError> {
        self.tera
            .render(template, context)
            .map(|s| s.trim().to_string())
            .map_err(|e| CbrsError::Render {
                template: template.to_string(),
                detail: e.to_string(),
            })
    }

    /// Group registration; NR groups repeat the node id as the DU reference
    pub fn add_group(
        &self,
        family: RadioFamily,
        subnetwork: &str,
        node: &str,
        cells: &[&str],
    ) -> Result<String, CbrsError> {
        let mut context = Context::new();
        context.insert("subnetwork", subnetwork);
        context.insert("node", node);
        context.insert("cells", &cells.join(","));
        let template = match family {
            RadioFamily::Lte => ADD_LTE,
            RadioFamily::Nr => ADD_NR,
        };
        self.render(template, &context)
    }

    fn group_context(group: &Group) -> Context {
        let mut context = Context::new();
        context.insert("subnetwork", &group.subnetwork);
        context.insert("group", &group.descriptor());
        context
    }

    pub fn channel_mask(&self, mask: &str, group: &Group) -> Result<String, CbrsError> {
        let mut context = Self::group_context(group);
        context.insert("mask", mask);
        self.render(CHANNEL_MASK, &context)
    }

    pub fn mixpal_channel_mask(&self, enabled: bool, group: &Group) -> Result<String, CbrsError> {
        let mut context = Self::group_context(group);
        context.insert("enabled", &enabled);
        self.render(MIXPAL_CHANNEL_MASK, &context)
    }

    pub fn mixpalgaa(&self, enabled: bool, group: &Group) -> Result<String, CbrsError> {
        let mut context = Self::group_context(group);
        context.insert("enabled", &enabled);
        self.render(MIXPALGAA, &context)
    }

    /// Point a node at an SA DC, or at "default" to unmap it
    pub fn map(&self, target: &str, me_path: &str) -> Result<String, CbrsError> {
        let mut context = Context::new();
        context.insert("target", target);
        context.insert("me_path", me_path);
        self.render(MAP, &context)
    }

    pub fn sas_config(&self, sa_dc: &str, sas_url: &str) -> Result<String, CbrsError> {
        let mut context = Context::new();
        context.insert("sa_dc", sa_dc.trim());
        context.insert("sas_url", sas_url);
        self.render(SAS_CONFIG, &context)
    }

    pub fn remove_all(&self, sa_dc: &str) -> Result<String, CbrsError> {
        let mut context = Context::new();
        context.insert("sa_dc", sa_dc.trim());
        self.render(REMOVE_ALL, &context)
    }

    pub fn maintenance_user(&self, me_path: &str) -> Result<String, CbrsError> {
        let mut context = Context::new();
        context.insert("me_path", me_path);
        self.render(MAINTENANCE_USER, &context)
    }
}
