//! Disk identification, partitioning, filesystem creation and mounting on the target.

use super::{mountpoints, source_inventory, target_host};
use crate::mapping::DeviceMapping;
use crate::models::system_info::{partition_index, partition_name};
use crate::models::{BlockDevice, Source};
use crate::orchestration::context::MigrationContext;
use crate::remote::Template;
use crate::state_machine::{Command, CommandError, CommandResult, Signal, StepErrors};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Match source disks to target disks and record the mapping
#[derive(Debug, Default)]
pub struct IdentifyDevices;

#[async_trait]
impl Command<Source> for IdentifyDevices {
    fn name(&self) -> &'static str {
        "IdentifyDevices"
    }

    async fn run(&self, source: &mut Source, _errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        if source.target.device_mapping().is_some() {
            debug!(source = %source.name, "Device mapping already recorded, skipping");
            return Ok(None);
        }

        let source_devices = &source_inventory(source, self.name())?.block_devices;
        let target_devices = &target_host(source, self.name())?
            .system_info
            .as_ref()
            .ok_or_else(|| CommandError::precondition(self.name(), "target inventory has not been collected"))?
            .block_devices;

        let mapping = DeviceMapping::identify(source_devices, target_devices)?;
        source.target.record_device_mapping(mapping)?;
        Ok(None)
    }
}

/// Rewrite an `sfdisk --dump` of `source_disk` so it can be applied to `target_disk`.
///
/// The `device:` header and partition names are renamed and `last-lba` is
/// dropped so sfdisk recomputes it for the target disk's geometry.
pub fn rewrite_partition_table(dump: &str, source_disk: &str, target_disk: &str) -> String {
    let mut lines = Vec::new();
    for line in dump.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("last-lba:") {
            continue;
        }
        if trimmed.starts_with("device:") {
            lines.push(format!("device: /dev/{target_disk}"));
            continue;
        }

        let renamed = trimmed
            .split_once(" : ")
            .and_then(|(device, rest)| {
                let name = device.trim().strip_prefix("/dev/")?;
                if !name.starts_with(source_disk) || name == source_disk {
                    return None;
                }
                let index = partition_index(name)?;
                Some(format!("/dev/{} : {}", partition_name(target_disk, index), rest))
            });
        lines.push(renamed.unwrap_or_else(|| line.to_string()));
    }
    lines.join("\n")
}

/// Replicate each partitioned source disk's partition table on its target disk
#[derive(Debug)]
pub struct CreatePartitions {
    ctx: Arc<MigrationContext>,
}

impl CreatePartitions {
    pub fn new(ctx: Arc<MigrationContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Command<Source> for CreatePartitions {
    fn name(&self) -> &'static str {
        "CreatePartitions"
    }

    async fn run(&self, source: &mut Source, errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        let target = target_host(source, self.name())?;
        let mapping = source.target.require_device_mapping()?;
        let templates = &source.target.blueprint.commands;

        for (disk_name, mapped) in mapping.iter() {
            if mapped.children.is_empty() {
                continue;
            }
            let dump_command = Template::new(&templates.partition_dump)
                .quoted("device", &format!("/dev/{disk_name}"))
                .render();
            let Some(dump) = errors.capture(
                format!("dump partitions of {disk_name}"),
                self.ctx.executor.run(&source.remote_host, &dump_command).await,
            ) else {
                continue;
            };

            let layout = rewrite_partition_table(&dump, disk_name, &mapped.id);
            let apply_command = Template::new(&templates.partition_apply)
                .quoted("layout", &layout)
                .quoted("device", &format!("/dev/{}", mapped.id))
                .render();
            if errors
                .capture(
                    format!("partition {}", mapped.id),
                    self.ctx.executor.run(target, &apply_command).await,
                )
                .is_some()
            {
                debug!(
                    source_disk = %disk_name,
                    target_disk = %mapped.id,
                    partitions = mapped.children.len(),
                    "Partition table replicated"
                );
            }
        }
        Ok(None)
    }
}

/// Create every mapped filesystem with the source's UUID and label
#[derive(Debug)]
pub struct CreateFilesystems {
    ctx: Arc<MigrationContext>,
}

impl CreateFilesystems {
    pub fn new(ctx: Arc<MigrationContext>) -> Self {
        Self { ctx }
    }
}

fn mkfs_targets<'a>(
    disk: &'a BlockDevice,
    target_disk: &'a str,
    mapping: &'a DeviceMapping,
) -> Vec<(&'a BlockDevice, String)> {
    let mut targets = Vec::new();
    if disk.fs.is_some() {
        targets.push((disk, target_disk.to_string()));
    }
    for partition in disk.partitions() {
        if partition.fs.is_none() {
            continue;
        }
        if let Some(mapped) = mapping.target_device(&partition.name) {
            targets.push((partition, mapped.id.clone()));
        }
    }
    targets
}

#[async_trait]
impl Command<Source> for CreateFilesystems {
    fn name(&self) -> &'static str {
        "CreateFilesystems"
    }

    async fn run(&self, source: &mut Source, errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        let target = target_host(source, self.name())?;
        let inventory = source_inventory(source, self.name())?;
        let mapping = source.target.require_device_mapping()?;
        let templates = &source.target.blueprint.commands;

        for (disk_name, mapped_disk) in mapping.iter() {
            let Some(disk) = inventory.block_devices.get(disk_name) else {
                errors.record(disk_name, "missing from source inventory");
                continue;
            };

            for (device, target_device) in mkfs_targets(disk, &mapped_disk.id, mapping) {
                let fs = device.fs.as_deref().unwrap_or_default();
                let Some(template) = templates.mkfs_for(fs) else {
                    errors.record(
                        format!("create filesystem on {target_device}"),
                        format!("unsupported filesystem '{fs}' on {}", device.name),
                    );
                    continue;
                };

                let uuid = device
                    .uuid
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let command = Template::new(template)
                    .quoted("uuid", &uuid)
                    .quoted("label", device.label.as_deref().unwrap_or_default())
                    .quoted("device", &format!("/dev/{target_device}"))
                    .render();

                if errors
                    .capture(
                        format!("create {fs} on {target_device}"),
                        self.ctx.executor.run(target, &command).await,
                    )
                    .is_some()
                {
                    info!(device = %target_device, fs = %fs, "✅ CREATE_FILESYSTEMS: Filesystem created");
                }
            }
        }
        Ok(None)
    }
}

/// Mount every mapped filesystem under its synthetic mountpoint, parents first
#[derive(Debug)]
pub struct MountFilesystems {
    ctx: Arc<MigrationContext>,
}

impl MountFilesystems {
    pub fn new(ctx: Arc<MigrationContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Command<Source> for MountFilesystems {
    fn name(&self) -> &'static str {
        "MountFilesystems"
    }

    async fn run(&self, source: &mut Source, errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        let target = target_host(source, self.name())?;
        let table = mountpoints(source, self.name())?;
        let template = &source.target.blueprint.commands.mount;

        for entry in table.entries() {
            if entry.target_mountpoint.is_empty() {
                continue;
            }
            let command = Template::new(template)
                .quoted("mountpoint", &entry.target_mountpoint)
                .quoted("device", &format!("/dev/{}", entry.target_device))
                .render();
            errors.capture(
                format!("mount {} at {}", entry.target_device, entry.target_mountpoint),
                self.ctx.executor.run(target, &command).await,
            );
        }
        Ok(None)
    }
}
