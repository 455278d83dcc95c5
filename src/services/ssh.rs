use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::time::Instant;

use super::{CommandExecutor, CommandOutcome, QueryService};
use crate::config::Config;
use crate::error::QueryError;
use crate::utils::{shell_quote, ssh_exec_async, truncate_lines};

/// Runs cbrs commands on a scripting host over SSH
pub struct SshCommandExecutor {
    user: String,
    pass: String,
    timeout_secs: u64,
}

impl SshCommandExecutor {
    pub fn new(config: &Config) -> Self {
        Self {
            user: config.enm_username.clone(),
            pass: config.enm_password.clone(),
            timeout_secs: config.ssh_timeout_secs,
        }
    }
}

#[async_trait]
impl CommandExecutor for SshCommandExecutor {
    async fn run(&self, command: &str, target: &str) -> anyhow::Result<CommandOutcome> {
        let started = Instant::now();
        let (status, stdout) =
            ssh_exec_async(target, &self.user, &self.pass, command, self.timeout_secs)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
        let elapsed = started.elapsed();

        tracing::debug!(
            "'{}' on {} exited with {} after {:.2}s",
            command,
            target,
            status,
            elapsed.as_secs_f64()
        );

        Ok(CommandOutcome {
            ok: status == 0,
            stdout,
            elapsed,
        })
    }
}

/// Bad credentials and unresolvable hosts will not improve on retry
fn transport_error(e: String) -> QueryError {
    if e.contains("authentication") || e.starts_with("Invalid address") {
        QueryError::Failed(e)
    } else {
        QueryError::Timeout(e)
    }
}

/// Runs cmedit queries through the scripting host CLI
pub struct SshQueryService {
    hosts: Vec<String>,
    user: String,
    pass: String,
    cli_app: String,
    timeout_secs: u64,
}

impl SshQueryService {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        if config.scripting_hosts.is_empty() {
            return Err(anyhow::anyhow!("SCRIPTING_HOSTS is empty, no host to run queries on"));
        }
        Ok(Self {
            hosts: config.scripting_hosts.clone(),
            user: config.enm_username.clone(),
            pass: config.enm_password.clone(),
            cli_app: config.cli_app.clone(),
            timeout_secs: config.ssh_timeout_secs,
        })
    }

    fn pick_host(&self) -> &str {
        self.hosts
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueryService for SshQueryService {
    async fn execute(&self, command: &str) -> Result<Vec<String>, QueryError> {
        let host = self.pick_host();
        let remote = format!("{} {}", self.cli_app, shell_quote(command));

        let (status, output) =
            ssh_exec_async(host, &self.user, &self.pass, &remote, self.timeout_secs)
                .await
                .map_err(transport_error)?;

        if output.trim().is_empty() {
            return Err(if status == 0 {
                QueryError::EmptyResponse
            } else {
                QueryError::NoOutput(command.to_string())
            });
        }
        if status != 0 {
            tracing::debug!(
                "'{}' exited with {} on {}:\n{}",
                command,
                status,
                host,
                truncate_lines(&output, 20)
            );
        }

        Ok(output.lines().map(str::to_string).collect())
    }
}
