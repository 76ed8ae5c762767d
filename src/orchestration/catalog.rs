//! # Migration Command Catalog
//!
//! Binds each [`SourceStatus`] to its command and assembles the commander that
//! drives sources through the migration lifecycle.

use super::commands::{
    AdjustMountConfig, AdjustNetworkConfig, ConfigureBootDevice, CreateFilesystems,
    CreatePartitions, CreateTarget, DeleteBootstrapNetworkInterface, DeleteBootstrapVolume,
    FinalSync, GetTargetSystemInfo, IdentifyDevices, MountFilesystems, ReinstallBootloader,
    StartTarget, StopTarget, SyncData,
};
use super::context::MigrationContext;
use super::hooks::BlueprintHooks;
use super::persistence::StorePersistence;
use crate::error::MigratorResult;
use crate::models::{Source, SourceStatus};
use crate::state_machine::{Command, CommandTable, Commander};
use crate::store::MigrationStore;
use std::sync::Arc;

/// Command table for the source lifecycle; `draft` and `live` have no command
pub fn migration_commands(ctx: &Arc<MigrationContext>) -> CommandTable<SourceStatus, Source> {
    let entries: Vec<(SourceStatus, Arc<dyn Command<Source>>)> = vec![
        (SourceStatus::CreateTarget, Arc::new(CreateTarget::new(ctx.clone()))),
        (SourceStatus::GetTargetSystemInfo, Arc::new(GetTargetSystemInfo::new(ctx.clone()))),
        (SourceStatus::IdentifyDevices, Arc::new(IdentifyDevices)),
        (SourceStatus::CreatePartitions, Arc::new(CreatePartitions::new(ctx.clone()))),
        (SourceStatus::CreateFilesystems, Arc::new(CreateFilesystems::new(ctx.clone()))),
        (SourceStatus::MountFilesystems, Arc::new(MountFilesystems::new(ctx.clone()))),
        (SourceStatus::Sync, Arc::new(SyncData::new(ctx.clone()))),
        (SourceStatus::FinalSync, Arc::new(FinalSync::new(ctx.clone()))),
        (SourceStatus::AdjustMountConfig, Arc::new(AdjustMountConfig::new(ctx.clone()))),
        (SourceStatus::AdjustNetworkConfig, Arc::new(AdjustNetworkConfig::new(ctx.clone()))),
        (SourceStatus::ReinstallBootloader, Arc::new(ReinstallBootloader::new(ctx.clone()))),
        (SourceStatus::StopTarget, Arc::new(StopTarget::new(ctx.clone()))),
        (SourceStatus::DeleteBootstrapVolume, Arc::new(DeleteBootstrapVolume::new(ctx.clone()))),
        (
            SourceStatus::DeleteBootstrapNetworkInterface,
            Arc::new(DeleteBootstrapNetworkInterface::new(ctx.clone())),
        ),
        (SourceStatus::ConfigureBootDevice, Arc::new(ConfigureBootDevice::new(ctx.clone()))),
        (SourceStatus::StartTarget, Arc::new(StartTarget::new(ctx.clone()))),
    ];

    entries
        .into_iter()
        .fold(CommandTable::new(), |table, (status, command)| table.with(status, command))
}

/// Commander for sources with blueprint hooks and store-backed persistence
pub fn migration_commander(
    ctx: Arc<MigrationContext>,
    store: Arc<dyn MigrationStore>,
) -> MigratorResult<Commander<Source>> {
    let commander = Commander::new(SourceStatus::lifecycle()?, migration_commands(&ctx))?
        .with_hooks(Arc::new(BlueprintHooks::new(ctx.executor.clone())))
        .with_persistence(Arc::new(StorePersistence::new(store)));
    Ok(commander)
}
