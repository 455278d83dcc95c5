//! In-memory collaborators for tests. Responses are keyed by a substring of the command.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::{CommandExecutor, CommandOutcome, QueryService};
use crate::error::QueryError;

type QueryResult = Result<Vec<String>, QueryError>;

struct Script {
    key: String,
    queued: VecDeque<QueryResult>,
    sticky: Option<QueryResult>,
}

#[derive(Default)]
pub struct FakeQueryService {
    scripts: Mutex<Vec<Script>>,
    calls: Mutex<Vec<String>>,
}

impl FakeQueryService {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(self, key: &str, apply: impl FnOnce(&mut Script)) -> Self {
        {
            let mut scripts = self.scripts.lock().unwrap();
            if let Some(existing) = scripts.iter_mut().find(|s| s.key == key) {
                apply(existing);
            } else {
                let mut script = Script {
                    key: key.to_string(),
                    queued: VecDeque::new(),
                    sticky: None,
                };
                apply(&mut script);
                scripts.push(script);
            }
        }
        self
    }

    /// Every matching call returns these lines
    pub fn respond(self, key: &str, lines: &[&str]) -> Self {
        let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        self.script(key, move |s| s.sticky = Some(Ok(lines)))
    }

    /// The next matching call fails, later calls fall through
    pub fn fail_once(self, key: &str, err: QueryError) -> Self {
        self.script(key, move |s| s.queued.push_back(Err(err)))
    }

    pub fn always_fail(self, key: &str, err: QueryError) -> Self {
        self.script(key, move |s| s.sticky = Some(Err(err)))
    }

    /// Number of executed commands containing `key`
    pub fn calls(&self, key: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.contains(key)).count()
    }

}

#[async_trait]
impl QueryService for FakeQueryService {
    async fn execute(&self, command: &str) -> Result<Vec<String>, QueryError> {
        self.calls.lock().unwrap().push(command.to_string());
        let mut scripts = self.scripts.lock().unwrap();
        let Some(script) = scripts.iter_mut().find(|s| command.contains(&s.key)) else {
            return Err(QueryError::Failed(format!("no scripted response for {}", command)));
        };
        if let Some(next) = script.queued.pop_front() {
            return next;
        }
        script
            .sticky
            .clone()
            .unwrap_or_else(|| Err(QueryError::NoOutput(command.to_string())))
    }
}

#[derive(Default)]
pub struct FakeCommandExecutor {
    failing: Vec<String>,
    unreachable: Vec<String>,
    silent: Vec<String>,
    runs: Mutex<Vec<(String, String)>>,
}

impl FakeCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands containing `key` exit non-zero with no output
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.push(key.to_string());
        self
    }

    /// Commands containing `key` fail at the transport level
    pub fn unreachable(mut self, key: &str) -> Self {
        self.unreachable.push(key.to_string());
        self
    }

    /// Commands containing `key` exit cleanly with no output
    pub fn silent(mut self, key: &str) -> Self {
        self.silent.push(key.to_string());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.runs.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn targets(&self) -> Vec<String> {
        self.runs.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn count(&self, key: &str) -> usize {
        self.runs.lock().unwrap().iter().filter(|(c, _)| c.contains(key)).count()
    }
}

#[async_trait]
impl CommandExecutor for FakeCommandExecutor {
    async fn run(&self, command: &str, target: &str) -> anyhow::Result<CommandOutcome> {
        self.runs
            .lock()
            .unwrap()
            .push((command.to_string(), target.to_string()));
        if self.unreachable.iter().any(|k| command.contains(k)) {
            return Err(anyhow::anyhow!("TCP connection to {}:22 failed", target));
        }
        let ok = !self.failing.iter().any(|k| command.contains(k));
        let quiet = !ok || self.silent.iter().any(|k| command.contains(k));
        Ok(CommandOutcome {
            ok,
            stdout: if quiet { String::new() } else { "Command completed".to_string() },
            elapsed: Duration::from_millis(5),
        })
    }
}
