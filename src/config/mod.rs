use std::env;
use std::time::Duration;

use crate::models::DeviceType;

const DEFAULT_DEVICES_REQUIRED: &str =
    "2208=1,RadioDot=8,4408=1,6488=1,NR_4408=1,PassiveDas_4408=10";

/// Fixed waits used between retries and after state-changing commands
#[derive(Debug, Clone)]
pub struct Timings {
    pub query_attempts: u32,
    pub query_retry_wait: Duration,
    pub command_attempts: u32,
    pub command_retry_wait: Duration,
    pub add_settle: Duration,
    pub policy_settle: Duration,
    pub remove_settle: Duration,
}

impl Timings {
    /// Same attempt counts, no sleeping
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            query_attempts: 3,
            query_retry_wait: Duration::ZERO,
            command_attempts: 3,
            command_retry_wait: Duration::ZERO,
            add_settle: Duration::ZERO,
            policy_settle: Duration::ZERO,
            remove_settle: Duration::ZERO,
        }
    }
}

/// Config holds all CBRS setup configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Target device count per type, in selection order
    pub devices_required: Vec<(DeviceType, u32)>,
    pub pal_percentage: f64,
    pub mixpalgaa_percentage: f64,
    pub sas_url: String,
    pub sa_dc_cluster_ip_list: String,
    pub scripting_hosts: Vec<String>,
    pub enm_username: String,
    pub enm_password: String,
    pub cli_app: String,
    pub ssh_timeout_secs: u64,
    pub timings: Timings,
    pub dry_run: bool,
    pub teardown_after_run: bool,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            devices_required: parse_devices_required(&get_env(
                "DEVICES_REQUIRED",
                DEFAULT_DEVICES_REQUIRED,
            )),
            pal_percentage: parse_percentage(&get_env("CBRS_PAL_PERCENTAGE", "0.10"), 0.10),
            mixpalgaa_percentage: parse_percentage(&get_env("MIXPALGAA_PERCENTAGE", "0.50"), 0.50),
            sas_url: get_env("SAS_URL", ""),
            sa_dc_cluster_ip_list: get_env("SA_DC_CLUSTER_IP_LIST", ""),
            scripting_hosts: get_env("SCRIPTING_HOSTS", "")
                .split(',')
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .collect(),
            enm_username: get_env("ENM_USERNAME", ""),
            enm_password: get_env("ENM_PASSWORD", ""),
            cli_app: get_env("CLI_APP", "/opt/ericsson/enmutils/bin/cli_app"),
            ssh_timeout_secs: get_env("SSH_TIMEOUT_SECS", "300").parse().unwrap_or(300),
            timings: Timings {
                query_attempts: 3,
                query_retry_wait: secs("QUERY_RETRY_WAIT_SECS", 5),
                command_attempts: 3,
                command_retry_wait: secs("COMMAND_RETRY_WAIT_SECS", 30),
                add_settle: secs("ADD_SETTLE_SECS", 3),
                policy_settle: secs("POLICY_SETTLE_SECS", 1),
                remove_settle: secs("REMOVE_SETTLE_SECS", 300),
            },
            dry_run: parse_bool(&get_env("DRY_RUN", "false")),
            teardown_after_run: parse_bool(&get_env("TEARDOWN_AFTER_RUN", "false")),
        }
    }

    /// Target configured for a type, zero when absent
    pub fn required(&self, device_type: DeviceType) -> u32 {
        self.devices_required
            .iter()
            .filter(|(t, _)| *t == device_type)
            .map(|(_, n)| *n)
            .sum()
    }

    pub fn nr_cells_required(&self) -> bool {
        self.required(DeviceType::Nr4408) > 0
    }

    pub fn has_sa_dc(&self) -> bool {
        !self.sa_dc_cluster_ip_list.trim().is_empty()
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(get_env(key, &default.to_string()).parse().unwrap_or(default))
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Parse a fraction, clamped to [0, 1]
fn parse_percentage(value: &str, default: f64) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(p) if p.is_finite() => p.clamp(0.0, 1.0),
        _ => {
            tracing::warn!("Invalid percentage '{}', using {}", value, default);
            default
        }
    }
}

/// Parse "type=count,type=count" keeping declaration order.
/// Malformed entries are skipped; a repeated type keeps its first position.
pub fn parse_devices_required(value: &str) -> Vec<(DeviceType, u32)> {
    let mut required: Vec<(DeviceType, u32)> = Vec::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((name, count)) = entry.split_once('=') else {
            tracing::warn!("Ignoring DEVICES_REQUIRED entry without '=': {}", entry);
            continue;
        };
        let device_type = match name.parse::<DeviceType>() {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("Ignoring DEVICES_REQUIRED entry '{}': {}", entry, e);
                continue;
            }
        };
        let count = match count.trim().parse::<u32>() {
            Ok(c) => c,
            Err(_) => {
                tracing::warn!("Ignoring DEVICES_REQUIRED entry '{}': bad count", entry);
                continue;
            }
        };
        if let Some(existing) = required.iter_mut().find(|(t, _)| *t == device_type) {
            existing.1 = count;
        } else {
            required.push((device_type, count));
        }
    }
    required
}
