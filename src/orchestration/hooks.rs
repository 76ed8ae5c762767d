//! Blueprint hook scripts run around each migration command.

use crate::constants::HOOK_CONTEXT_ENV;
use crate::models::{HookLocation, HookSpec, RemoteHost, Source};
use crate::remote::{shell_quote, RemoteExecutor};
use crate::state_machine::{HookError, HookPhase, HookRunner, StatefulEntity, REPORT_SEPARATOR};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs the hooks a source's blueprint registers for `<phase>_<status>` events
pub struct BlueprintHooks {
    executor: Arc<dyn RemoteExecutor>,
}

impl BlueprintHooks {
    pub fn new(executor: Arc<dyn RemoteExecutor>) -> Self {
        Self { executor }
    }
}

/// JSON handed to hook scripts through the environment
pub fn hook_context(source: &Source, event: &str) -> serde_json::Value {
    let target = source.target.remote_host.as_ref();
    json!({
        "event": event,
        "run_id": source.run_id,
        "source": {
            "id": source.id,
            "name": source.name,
            "status": source.status().as_str(),
            "address": source.remote_host.address,
            "os": source.remote_host.os,
        },
        "target": {
            "address": target.map(|host| host.address.as_str()),
            "server_id": target
                .and_then(|host| host.cloud_metadata.as_ref())
                .map(|metadata| metadata.server_id.as_str()),
        },
    })
}

/// Shell command running `script` with the context exported
pub fn hook_command(script: &str, context: &serde_json::Value) -> String {
    format!(
        "{HOOK_CONTEXT_ENV}={} sh -c {}",
        shell_quote(&context.to_string()),
        shell_quote(script)
    )
}

impl BlueprintHooks {
    async fn run_hook(&self, source: &Source, hook: &HookSpec, command: &str) -> Result<(), String> {
        let host: &RemoteHost = match hook.location {
            HookLocation::Source => &source.remote_host,
            HookLocation::Target => source
                .target
                .remote_host
                .as_ref()
                .ok_or_else(|| format!("{} hook on target: target has not been provisioned", hook.event))?,
        };
        self.executor
            .run(host, command)
            .await
            .map(|_| ())
            .map_err(|error| format!("{} hook on {}: {error}", hook.event, host.display_name()))
    }
}

#[async_trait]
impl HookRunner<Source> for BlueprintHooks {
    async fn run_hooks(&self, source: &Source, status: &str, phase: HookPhase) -> Result<(), HookError> {
        let event = phase.event_name(status);
        let hooks: Vec<&HookSpec> = source.target.blueprint.hooks_for(phase, status).collect();
        if hooks.is_empty() {
            return Ok(());
        }

        debug!(source = %source.name, event = %event, hooks = hooks.len(), "Running blueprint hooks");
        let command_context = hook_context(source, &event);
        let commands: Vec<String> = hooks
            .iter()
            .map(|hook| hook_command(&hook.script, &command_context))
            .collect();

        let failures: Vec<String> = join_all(
            hooks
                .iter()
                .zip(&commands)
                .map(|(hook, command)| self.run_hook(source, hook, command)),
        )
        .await
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if failures.is_empty() {
            return Ok(());
        }
        warn!(source = %source.name, event = %event, failed = failures.len(), "❌ HOOKS: Blueprint hooks failed");
        Err(HookError(failures.join(REPORT_SEPARATOR)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_command_exports_context() {
        let command = hook_command("systemctl stop nginx", &json!({"event": "before_final_sync"}));
        assert_eq!(
            command,
            "MIGRATION_CONTEXT='{\"event\":\"before_final_sync\"}' sh -c 'systemctl stop nginx'"
        );
    }
}
