//! Scripted remote executor: canned responses matched by host and command text

use async_trait::async_trait;
use migrator_core::models::RemoteHost;
use migrator_core::remote::{ExecOptions, RemoteError, RemoteExecutor, RemoteResult};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedCommand {
    pub address: String,
    pub command: String,
}

#[derive(Debug, Clone)]
enum Reply {
    Output(String),
    Exit(i32),
    Unreachable,
}

#[derive(Debug, Clone)]
struct Rule {
    address: Option<String>,
    needle: String,
    reply: Reply,
    /// Matches left before the rule is dropped; `None` never expires
    remaining: Option<usize>,
}

/// Records every command; the first matching rule decides the reply, otherwise
/// the command succeeds with empty output
#[derive(Debug, Default, Clone)]
pub struct ScriptedExecutor {
    rules: Arc<Mutex<Vec<Rule>>>,
    executed: Arc<Mutex<Vec<ExecutedCommand>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `output` to commands containing `needle` on any host
    pub fn respond(&self, needle: &str, output: &str) -> &Self {
        self.push(None, needle, Reply::Output(output.to_string()))
    }

    /// Reply with `output` to commands containing `needle` on `address`
    pub fn respond_on(&self, address: &str, needle: &str, output: &str) -> &Self {
        self.push(Some(address), needle, Reply::Output(output.to_string()))
    }

    /// Fail commands containing `needle` with `exit_code`
    pub fn fail(&self, needle: &str, exit_code: i32) -> &Self {
        self.push(None, needle, Reply::Exit(exit_code))
    }

    /// Fail the next command containing `needle` with `exit_code`, ahead of every other rule
    pub fn fail_once(&self, needle: &str, exit_code: i32) -> &Self {
        self.rules.lock().insert(
            0,
            Rule {
                address: None,
                needle: needle.to_string(),
                reply: Reply::Exit(exit_code),
                remaining: Some(1),
            },
        );
        self
    }

    /// Report commands containing `needle` as unreachable, whatever the exec options
    pub fn unreachable(&self, needle: &str) -> &Self {
        self.push(None, needle, Reply::Unreachable)
    }

    fn push(&self, address: Option<&str>, needle: &str, reply: Reply) -> &Self {
        self.rules.lock().push(Rule {
            address: address.map(str::to_string),
            needle: needle.to_string(),
            reply,
            remaining: None,
        });
        self
    }

    pub fn executed(&self) -> Vec<ExecutedCommand> {
        self.executed.lock().clone()
    }

    /// Commands run on `address`, in order
    pub fn commands_on(&self, address: &str) -> Vec<String> {
        self.executed
            .lock()
            .iter()
            .filter(|executed| executed.address == address)
            .map(|executed| executed.command.clone())
            .collect()
    }

    /// Position of the first command on `address` containing `needle`
    pub fn position_on(&self, address: &str, needle: &str) -> Option<usize> {
        self.commands_on(address)
            .iter()
            .position(|command| command.contains(needle))
    }
}

#[async_trait]
impl RemoteExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        host: &RemoteHost,
        command: &str,
        options: ExecOptions,
    ) -> RemoteResult<String> {
        self.executed.lock().push(ExecutedCommand {
            address: host.address.clone(),
            command: command.to_string(),
        });

        let reply = {
            let mut rules = self.rules.lock();
            let matched = rules.iter().position(|rule| {
                rule.address.as_deref().map_or(true, |address| address == host.address)
                    && command.contains(&rule.needle)
            });
            matched.map(|index| {
                let reply = rules[index].reply.clone();
                if let Some(remaining) = rules[index].remaining.as_mut() {
                    *remaining -= 1;
                    if *remaining == 0 {
                        rules.remove(index);
                    }
                }
                reply
            })
        };

        match reply {
            Some(Reply::Exit(exit_code)) if options.raise_on_failure => Err(RemoteError::Execution {
                host: host.display_name(),
                command: command.to_string(),
                exit_code,
                stdout: String::new(),
                stderr: format!("scripted failure ({exit_code})"),
            }),
            Some(Reply::Exit(_)) => Ok(String::new()),
            Some(Reply::Unreachable) => Err(RemoteError::Connection {
                host: host.display_name(),
                attempts: 3,
                reason: "scripted connection refused".to_string(),
            }),
            Some(Reply::Output(output)) => Ok(output),
            None => Ok(String::new()),
        }
    }
}
