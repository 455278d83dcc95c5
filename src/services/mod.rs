pub mod ssh;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use std::time::Duration;

use crate::config::Timings;
use crate::error::{CbrsError, QueryError};

/// Runs a declarative query (e.g. `cmedit get ...`) and returns its output lines
#[async_trait]
pub trait QueryService: Send + Sync {
    async fn execute(&self, command: &str) -> Result<Vec<String>, QueryError>;
}

/// Result of running one command on one target
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub ok: bool,
    pub stdout: String,
    pub elapsed: Duration,
}

/// Runs a rendered command string against a single target host
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn run(&self, command: &str, target: &str) -> anyhow::Result<CommandOutcome>;
}

/// Run a query, retrying transient failures with a fixed wait.
/// Non-transient failures are returned straight away.
pub async fn query_with_retry(
    query: &dyn QueryService,
    command: &str,
    timings: &Timings,
) -> Result<Vec<String>, CbrsError> {
    let attempts = timings.query_attempts.max(1);
    let mut attempt = 1;
    loop {
        match query.execute(command).await {
            Ok(lines) => return Ok(lines),
            Err(e) if e.is_transient() && attempt < attempts => {
                tracing::debug!(
                    "Query '{}' failed ({}), retrying in {:?} ({}/{})",
                    command,
                    e,
                    timings.query_retry_wait,
                    attempt,
                    attempts
                );
                tokio::time::sleep(timings.query_retry_wait).await;
                attempt += 1;
            }
            Err(e) if e.is_transient() => {
                return Err(CbrsError::TransientQueryError {
                    command: command.to_string(),
                    attempts,
                    source: e,
                });
            }
            Err(e) => {
                return Err(CbrsError::Query {
                    command: command.to_string(),
                    source: e,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeQueryService;
    use super::*;

    #[tokio::test]
    async fn test_retry_recovers_from_transient_error() {
        let query = FakeQueryService::new()
            .fail_once("cmedit get *", QueryError::EmptyResponse)
            .respond("cmedit get *", &["FDN : x", "1 instance(s)"]);

        let lines = query_with_retry(&query, "cmedit get *", &Timings::immediate())
            .await
            .unwrap();

        assert_eq!(lines, vec!["FDN : x", "1 instance(s)"]);
        assert_eq!(query.calls("cmedit get *"), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_three_attempts() {
        let query = FakeQueryService::new()
            .always_fail("cmedit get *", QueryError::Timeout("30s".into()));

        let err = query_with_retry(&query, "cmedit get *", &Timings::immediate())
            .await
            .unwrap_err();

        assert!(matches!(err, CbrsError::TransientQueryError { attempts: 3, .. }));
        assert_eq!(query.calls("cmedit get *"), 3);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        let query = FakeQueryService::new()
            .always_fail("cmedit get *", QueryError::Failed("denied".into()));

        let err = query_with_retry(&query, "cmedit get *", &Timings::immediate())
            .await
            .unwrap_err();

        assert!(matches!(err, CbrsError::Query { .. }));
        assert_eq!(query.calls("cmedit get *"), 1);
    }
}
