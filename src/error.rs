use thiserror::Error;

/// Failure reported by a query service call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("query timed out: {0}")]
    Timeout(String),
    #[error("query returned an empty response")]
    EmptyResponse,
    #[error("no output from script engine for '{0}'")]
    NoOutput(String),
    #[error("query failed: {0}")]
    Failed(String),
}

impl QueryError {
    /// Transient kinds are retried; anything else fails immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QueryError::Timeout(_) | QueryError::EmptyResponse | QueryError::NoOutput(_)
        )
    }
}

/// Errors raised while planning or executing a CBRS setup run.
///
/// `InventoryUnavailable`, `TransientQueryError`, `Query` and `Render` abort the run.
/// The remaining variants are isolated to one node or one command and end up in the
/// run summary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CbrsError {
    #[error("inventory unavailable: {0}")]
    InventoryUnavailable(String),

    #[error("query '{command}' still failing after {attempts} attempts: {source}")]
    TransientQueryError {
        command: String,
        attempts: u32,
        #[source]
        source: QueryError,
    },

    #[error("query '{command}' failed: {source}")]
    Query {
        command: String,
        #[source]
        source: QueryError,
    },

    #[error("{node} could not be classified: {reason}")]
    NodeClassificationMismatch { node: String, reason: String },

    #[error(
        "{node} doesn't meet the criteria as its cells {cells_to_add} by its groups {groups_to_create} don't match cell count {cell_count}"
    )]
    GroupSizeMismatch {
        node: String,
        cells_to_add: usize,
        groups_to_create: usize,
        cell_count: usize,
    },

    #[error("command '{command}' failed: {detail}")]
    CommandExecutionFailure { command: String, detail: String },

    #[error("failed to render {template} command: {detail}")]
    Render { template: String, detail: String },
}

impl CbrsError {
    pub fn command_failure(command: &str, detail: impl Into<String>) -> Self {
        CbrsError::CommandExecutionFailure {
            command: command.to_string(),
            detail: detail.into(),
        }
    }

    /// Per-node and per-command errors never abort sibling work.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CbrsError::InventoryUnavailable(_)
                | CbrsError::TransientQueryError { .. }
                | CbrsError::Query { .. }
                | CbrsError::Render { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_kinds() {
        assert!(QueryError::Timeout("30s".into()).is_transient());
        assert!(QueryError::EmptyResponse.is_transient());
        assert!(QueryError::NoOutput("cmedit get *".into()).is_transient());
        assert!(!QueryError::Failed("permission denied".into()).is_transient());
    }

    #[test]
    fn test_fatal_split() {
        assert!(CbrsError::InventoryUnavailable("no cells".into()).is_fatal());
        assert!(!CbrsError::command_failure("cbrs add", "rc 1").is_fatal());
        let mismatch = CbrsError::GroupSizeMismatch {
            node: "LTE01".into(),
            cells_to_add: 3,
            groups_to_create: 2,
            cell_count: 12,
        };
        assert!(!mismatch.is_fatal());
        assert!(mismatch.to_string().contains("don't match cell count 12"));
    }
}
