//! Cutover: power cycle, bootstrap teardown and boot volume selection.

use super::{cloud_metadata, mountpoints};
use crate::models::Source;
use crate::orchestration::context::MigrationContext;
use crate::state_machine::{Command, CommandError, CommandResult, Signal, StepErrors};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

macro_rules! cloud_command {
    ($name:ident) => {
        #[derive(Debug)]
        pub struct $name {
            ctx: Arc<MigrationContext>,
        }

        impl $name {
            pub fn new(ctx: Arc<MigrationContext>) -> Self {
                Self { ctx }
            }
        }
    };
}

cloud_command!(StopTarget);
cloud_command!(StartTarget);
cloud_command!(DeleteBootstrapVolume);
cloud_command!(DeleteBootstrapNetworkInterface);
cloud_command!(ConfigureBootDevice);

fn metadata_mut<'a>(
    source: &'a mut Source,
    command: &str,
) -> CommandResult<&'a mut crate::models::CloudMetadata> {
    source
        .target
        .remote_host
        .as_mut()
        .and_then(|host| host.cloud_metadata.as_mut())
        .ok_or_else(|| CommandError::precondition(command, "target has no cloud metadata"))
}

#[async_trait]
impl Command<Source> for StopTarget {
    fn name(&self) -> &'static str {
        "StopTarget"
    }

    async fn run(&self, source: &mut Source, _errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        let server_id = &cloud_metadata(source, self.name())?.server_id;
        self.ctx.cloud.stop_target(server_id).await?;
        Ok(None)
    }
}

#[async_trait]
impl Command<Source> for StartTarget {
    fn name(&self) -> &'static str {
        "StartTarget"
    }

    async fn run(&self, source: &mut Source, _errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        let server_id = &cloud_metadata(source, self.name())?.server_id;
        self.ctx.cloud.start_target(server_id).await?;
        info!(source = %source.name, "🎉 START_TARGET: Target running from migrated disks");
        Ok(None)
    }
}

#[async_trait]
impl Command<Source> for DeleteBootstrapVolume {
    fn name(&self) -> &'static str {
        "DeleteBootstrapVolume"
    }

    async fn run(&self, source: &mut Source, _errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        let metadata = metadata_mut(source, self.name())?;
        let volume_id = metadata.bootstrap_volume_id.clone();
        if !metadata.has_volume(&volume_id) {
            debug!(volume_id = %volume_id, "Bootstrap volume already removed");
            return Ok(None);
        }

        self.ctx.cloud.delete_volume(&volume_id).await?;
        metadata.volumes.retain(|volume| volume.id != volume_id);
        Ok(None)
    }
}

#[async_trait]
impl Command<Source> for DeleteBootstrapNetworkInterface {
    fn name(&self) -> &'static str {
        "DeleteBootstrapNetworkInterface"
    }

    async fn run(&self, source: &mut Source, errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        let metadata = metadata_mut(source, self.name())?;
        let nic_id = metadata.bootstrap_nic_id.clone();
        if metadata.has_nic(&nic_id) {
            self.ctx
                .cloud
                .delete_nic(&metadata.server_id, &nic_id)
                .await?;
            metadata.nics.retain(|nic| nic.id != nic_id);
        }

        let final_address = metadata
            .final_nics()
            .find_map(|nic| nic.ips.first())
            .cloned();
        match (final_address, source.target.remote_host.as_mut()) {
            (Some(address), Some(host)) => {
                info!(source = %source.name, address = %address, "✅ DELETE_BOOTSTRAP_NIC: Target reachable at final address");
                host.address = address;
            }
            _ => errors.record("final address", "no remaining NIC has an address"),
        }
        Ok(None)
    }
}

#[async_trait]
impl Command<Source> for ConfigureBootDevice {
    fn name(&self) -> &'static str {
        "ConfigureBootDevice"
    }

    async fn run(&self, source: &mut Source, _errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        let table = mountpoints(source, self.name())?;
        let boot_disk = &table
            .boot_device()
            .ok_or_else(|| CommandError::precondition(self.name(), "source has no boot filesystem"))?
            .target_disk;
        let metadata = cloud_metadata(source, self.name())?;
        let volume = metadata.volume_for_device(boot_disk).ok_or_else(|| {
            CommandError::precondition(self.name(), format!("no volume is attached as {boot_disk}"))
        })?;

        self.ctx
            .cloud
            .make_volume_boot(&metadata.server_id, &volume.id)
            .await?;
        Ok(None)
    }
}
