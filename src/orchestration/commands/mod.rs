//! # Migration Commands
//!
//! One command per [`SourceStatus`](crate::models::SourceStatus) that does work.
//! Commands read what earlier steps recorded on the source (inventories, device
//! mapping, cloud metadata) and fail with a precondition error when it is missing.

pub mod adjust;
pub mod bootloader;
pub mod cutover;
pub mod devices;
pub mod provisioning;
pub mod sync;

pub use adjust::{rewrite_fstab, AdjustMountConfig, AdjustNetworkConfig};
pub use bootloader::ReinstallBootloader;
pub use cutover::{
    ConfigureBootDevice, DeleteBootstrapNetworkInterface, DeleteBootstrapVolume, StartTarget,
    StopTarget,
};
pub use devices::{
    rewrite_partition_table, CreateFilesystems, CreatePartitions, IdentifyDevices,
    MountFilesystems,
};
pub use provisioning::{CreateTarget, GetTargetSystemInfo};
pub use sync::{FinalSync, SyncData};

use crate::mapping::MountpointMap;
use crate::models::{CloudMetadata, RemoteHost, Source, SystemInfo};
use crate::state_machine::{CommandError, CommandResult};

/// Provisioned target host
pub(crate) fn target_host<'a>(source: &'a Source, command: &str) -> CommandResult<&'a RemoteHost> {
    source
        .target
        .remote_host
        .as_ref()
        .ok_or_else(|| CommandError::precondition(command, "target has not been provisioned"))
}

pub(crate) fn cloud_metadata<'a>(source: &'a Source, command: &str) -> CommandResult<&'a CloudMetadata> {
    target_host(source, command)?
        .cloud_metadata
        .as_ref()
        .ok_or_else(|| CommandError::precondition(command, "target has no cloud metadata"))
}

pub(crate) fn source_inventory<'a>(source: &'a Source, command: &str) -> CommandResult<&'a SystemInfo> {
    source
        .system_info()
        .ok_or_else(|| CommandError::precondition(command, "source inventory has not been collected"))
}

/// Mount table derived from the source inventory and the recorded device mapping
pub(crate) fn mountpoints(source: &Source, command: &str) -> CommandResult<MountpointMap> {
    let inventory = source_inventory(source, command)?;
    let mapping = source.target.require_device_mapping()?;
    Ok(MountpointMap::build(&inventory.block_devices, mapping)?)
}
