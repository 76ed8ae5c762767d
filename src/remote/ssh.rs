//! OpenSSH-backed [`RemoteExecutor`].

use super::errors::{RemoteError, RemoteResult};
use super::executor::{ExecOptions, RemoteExecutor};
use super::shell::shell_quote;
use crate::config::SshConfig;
use crate::constants::system::SSH_CONNECTION_FAILURE_EXIT_CODE;
use crate::models::RemoteHost;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as TokioCommand;
use tracing::{debug, instrument, warn};

/// Runs commands through the local `ssh` binary
#[derive(Debug, Clone)]
pub struct SshExecutor {
    config: SshConfig,
}

impl SshExecutor {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    fn ssh_args(&self, host: &RemoteHost, command: &str) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            host.port.to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout_seconds),
        ];
        if !self.config.strict_host_key_checking {
            args.extend([
                "-o".to_string(),
                "StrictHostKeyChecking=no".to_string(),
                "-o".to_string(),
                "UserKnownHostsFile=/dev/null".to_string(),
            ]);
        }
        if let Some(key) = &host.private_key_path {
            args.extend(["-i".to_string(), key.display().to_string()]);
        }
        args.push(format!("{}@{}", host.username, host.address));
        args.push("--".to_string());
        args.push(command.to_string());
        args
    }

    async fn run_once(&self, host: &RemoteHost, command: &str) -> std::io::Result<(i32, String, String)> {
        let output = TokioCommand::new(&self.config.binary)
            .args(self.ssh_args(host, command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        Ok((
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ))
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    #[instrument(skip(self, host), fields(host = %host.display_name()))]
    async fn execute(
        &self,
        host: &RemoteHost,
        command: &str,
        options: ExecOptions,
    ) -> RemoteResult<String> {
        let remote_command = if options.block_for_response {
            command.to_string()
        } else {
            format!("nohup sh -c {} >/dev/null 2>&1 &", shell_quote(command))
        };

        let attempts = self.config.connect_retries.max(1);
        let mut last_reason = String::new();

        for attempt in 1..=attempts {
            let (exit_code, stdout, stderr) = match self.run_once(host, &remote_command).await {
                Ok(result) => result,
                Err(error) => {
                    // The ssh binary itself could not be started; retrying will not help
                    return Err(RemoteError::Connection {
                        host: host.display_name(),
                        attempts: attempt,
                        reason: error.to_string(),
                    });
                }
            };

            if exit_code == SSH_CONNECTION_FAILURE_EXIT_CODE {
                last_reason = stderr.trim().to_string();
                warn!(
                    attempt = attempt,
                    max_attempts = attempts,
                    reason = %last_reason,
                    "⚠️ SSH: Connection failed"
                );
                if attempt < attempts {
                    tokio::time::sleep(Duration::from_secs(self.config.retry_backoff_seconds)).await;
                }
                continue;
            }

            debug!(exit_code = exit_code, "SSH: Command finished");
            if exit_code != 0 && options.raise_on_failure {
                return Err(RemoteError::Execution {
                    host: host.display_name(),
                    command: command.to_string(),
                    exit_code,
                    stdout,
                    stderr,
                });
            }
            return Ok(stdout);
        }

        Err(RemoteError::Connection {
            host: host.display_name(),
            attempts,
            reason: last_reason,
        })
    }
}
