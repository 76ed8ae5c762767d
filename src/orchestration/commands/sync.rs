//! Data replication from the source host to the mounted target filesystems.

use super::{mountpoints, target_host};
use crate::mapping::MountEntry;
use crate::models::{RemoteHost, Source};
use crate::orchestration::context::MigrationContext;
use crate::remote::{shell_quote, RemoteError, Template};
use crate::state_machine::{Command, CommandResult, Signal, StepErrors};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// rsync exit status for files that vanished during transfer; expected on a live source
const RSYNC_PARTIAL_VANISHED: i32 = 24;

fn directory(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// rsync invocation run on the source that pushes one filesystem to the target
pub fn sync_command(source: &Source, target: &RemoteHost, entry: &MountEntry) -> String {
    let templates = &source.target.blueprint.commands;
    let excludes = templates
        .sync_excludes
        .iter()
        .map(|pattern| format!("--exclude={}", shell_quote(pattern)))
        .collect::<Vec<_>>()
        .join(" ");
    let ssh_command = format!(
        "ssh -p {} -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null",
        target.port
    );

    Template::new(&templates.sync)
        .raw("excludes", excludes)
        .quoted("ssh_command", &ssh_command)
        .quoted("source_path", &directory(&entry.source_mountpoint))
        .quoted("target_user", &target.username)
        .quoted("target_address", &target.address)
        .quoted("target_path", &directory(&entry.target_mountpoint))
        .render()
}

async fn sync_filesystems(
    ctx: &MigrationContext,
    source: &Source,
    command: &'static str,
    errors: &mut StepErrors,
) -> CommandResult<()> {
    let target = target_host(source, command)?;
    let table = mountpoints(source, command)?;

    for entry in table.entries() {
        if entry.source_mountpoint.is_empty() || entry.target_mountpoint.is_empty() {
            continue;
        }
        let rsync = sync_command(source, target, entry);
        match ctx.executor.run(&source.remote_host, &rsync).await {
            Ok(_) => {}
            Err(RemoteError::Execution { exit_code, .. }) if exit_code == RSYNC_PARTIAL_VANISHED => {
                warn!(
                    source = %source.name,
                    mountpoint = %entry.source_mountpoint,
                    "⚠️ SYNC: Some files vanished during transfer"
                );
            }
            Err(error) => errors.record(format!("sync {}", entry.source_mountpoint), error),
        }
    }

    info!(source = %source.name, filesystems = table.entries().len(), "✅ SYNC: Filesystems synchronized");
    Ok(())
}

/// Initial and periodic sync; pauses the migration until go-live
#[derive(Debug)]
pub struct SyncData {
    ctx: Arc<MigrationContext>,
}

impl SyncData {
    pub fn new(ctx: Arc<MigrationContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Command<Source> for SyncData {
    fn name(&self) -> &'static str {
        "Sync"
    }

    async fn run(&self, source: &mut Source, errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        sync_filesystems(&self.ctx, source, self.name(), errors).await?;
        Ok(Some(Signal::Sleep))
    }
}

/// Last sync before cutover
#[derive(Debug)]
pub struct FinalSync {
    ctx: Arc<MigrationContext>,
}

impl FinalSync {
    pub fn new(ctx: Arc<MigrationContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Command<Source> for FinalSync {
    fn name(&self) -> &'static str {
        "FinalSync"
    }

    async fn run(&self, source: &mut Source, errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        sync_filesystems(&self.ctx, source, self.name(), errors).await?;
        Ok(None)
    }
}
