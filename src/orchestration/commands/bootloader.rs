use super::{mountpoints, target_host};
use crate::constants::CHROOT_BIND_MOUNTS;
use crate::models::Source;
use crate::orchestration::context::MigrationContext;
use crate::remote::shell_quote;
use crate::state_machine::{Command, CommandError, CommandResult, Signal, StepErrors};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Reinstall the bootloader on the boot disk from inside the migrated root.
///
/// Nested filesystems and the pseudo filesystems are bind-mounted into the root
/// before chrooting and are always unmounted again, innermost first.
#[derive(Debug)]
pub struct ReinstallBootloader {
    ctx: Arc<MigrationContext>,
}

impl ReinstallBootloader {
    pub fn new(ctx: Arc<MigrationContext>) -> Self {
        Self { ctx }
    }
}

fn chroot_command(root: &str, command: &str) -> String {
    format!("chroot {} sh -c {}", shell_quote(root), shell_quote(command))
}

/// (bind source, mount path) pairs in mount order
pub fn bind_mounts(root: &str, nested: &[(String, String)]) -> Vec<(String, String)> {
    let mut binds: Vec<(String, String)> = nested
        .iter()
        .map(|(target_mountpoint, source_mountpoint)| {
            (target_mountpoint.clone(), format!("{root}{source_mountpoint}"))
        })
        .collect();
    binds.extend(
        CHROOT_BIND_MOUNTS
            .iter()
            .map(|pseudo| (pseudo.to_string(), format!("{root}{pseudo}"))),
    );
    binds
}

#[async_trait]
impl Command<Source> for ReinstallBootloader {
    fn name(&self) -> &'static str {
        "ReinstallBootloader"
    }

    async fn run(&self, source: &mut Source, errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        let target = target_host(source, self.name())?;
        let table = mountpoints(source, self.name())?;
        let root = table
            .root()
            .ok_or_else(|| CommandError::precondition(self.name(), "source has no root filesystem"))?;
        let boot = table
            .boot_device()
            .ok_or_else(|| CommandError::precondition(self.name(), "source has no boot filesystem"))?;
        let root_path = root.target_mountpoint.clone();
        let os = source.remote_host.os;

        let nested: Vec<(String, String)> = table
            .entries()
            .iter()
            .filter(|entry| {
                entry.source_mountpoint != "/"
                    && !entry.source_mountpoint.is_empty()
                    && !entry.target_mountpoint.is_empty()
            })
            .map(|entry| (entry.target_mountpoint.clone(), entry.source_mountpoint.clone()))
            .collect();

        let mut mounted = Vec::new();
        let mut bound = true;
        for (from, path) in bind_mounts(&root_path, &nested) {
            let command = format!(
                "mkdir -p {path} && mount --bind {from} {path}",
                path = shell_quote(&path),
                from = shell_quote(&from)
            );
            match self.ctx.executor.run(target, &command).await {
                Ok(_) => mounted.push(path),
                Err(error) => {
                    errors.record(format!("bind {from} at {path}"), error);
                    bound = false;
                    break;
                }
            }
        }

        if bound {
            let disk = format!("/dev/{}", boot.target_disk);
            for step in [os.grub_install_command(&disk), os.grub_config_command().to_string()] {
                let result = self
                    .ctx
                    .executor
                    .run(target, &chroot_command(&root_path, &step))
                    .await;
                if errors.capture(&step, result).is_none() {
                    break;
                }
            }
        }

        for path in mounted.iter().rev() {
            if let Err(error) = self
                .ctx
                .executor
                .run(target, &format!("umount {}", shell_quote(path)))
                .await
            {
                warn!(path = %path, "⚠️ REINSTALL_BOOTLOADER: Unmount failed");
                errors.record(format!("unmount {path}"), error);
            }
        }

        if errors.is_empty() {
            info!(source = %source.name, disk = %boot.target_disk, os = %os, "✅ REINSTALL_BOOTLOADER: Bootloader installed");
        }
        Ok(None)
    }
}
