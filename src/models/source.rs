use super::remote_host::RemoteHost;
use super::target::Target;
use crate::state_machine::{LifecycleResult, StatefulEntity, StatusLifecycle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Migration status of a source host, in lifecycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// Created from the plan, nothing has happened yet
    Draft,
    CreateTarget,
    GetTargetSystemInfo,
    IdentifyDevices,
    CreatePartitions,
    CreateFilesystems,
    MountFilesystems,
    /// Initial data copy; the migration pauses here until go-live
    Sync,
    FinalSync,
    AdjustMountConfig,
    AdjustNetworkConfig,
    ReinstallBootloader,
    StopTarget,
    DeleteBootstrapVolume,
    DeleteBootstrapNetworkInterface,
    ConfigureBootDevice,
    StartTarget,
    /// The target has taken over from the source
    Live,
}

impl SourceStatus {
    pub const ALL: [SourceStatus; 18] = [
        Self::Draft,
        Self::CreateTarget,
        Self::GetTargetSystemInfo,
        Self::IdentifyDevices,
        Self::CreatePartitions,
        Self::CreateFilesystems,
        Self::MountFilesystems,
        Self::Sync,
        Self::FinalSync,
        Self::AdjustMountConfig,
        Self::AdjustNetworkConfig,
        Self::ReinstallBootloader,
        Self::StopTarget,
        Self::DeleteBootstrapVolume,
        Self::DeleteBootstrapNetworkInterface,
        Self::ConfigureBootDevice,
        Self::StartTarget,
        Self::Live,
    ];

    /// The migration lifecycle every source walks through
    pub fn lifecycle() -> LifecycleResult<StatusLifecycle<SourceStatus>> {
        StatusLifecycle::new(Self::ALL)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::CreateTarget => "create_target",
            Self::GetTargetSystemInfo => "get_target_system_info",
            Self::IdentifyDevices => "identify_devices",
            Self::CreatePartitions => "create_partitions",
            Self::CreateFilesystems => "create_filesystems",
            Self::MountFilesystems => "mount_filesystems",
            Self::Sync => "sync",
            Self::FinalSync => "final_sync",
            Self::AdjustMountConfig => "adjust_mount_config",
            Self::AdjustNetworkConfig => "adjust_network_config",
            Self::ReinstallBootloader => "reinstall_bootloader",
            Self::StopTarget => "stop_target",
            Self::DeleteBootstrapVolume => "delete_bootstrap_volume",
            Self::DeleteBootstrapNetworkInterface => "delete_bootstrap_network_interface",
            Self::ConfigureBootDevice => "configure_boot_device",
            Self::StartTarget => "start_target",
            Self::Live => "live",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Live)
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid source status: {s}"))
    }
}

/// A server being migrated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub run_id: Uuid,
    pub name: String,
    status: SourceStatus,
    /// Set when the command at `status` asked to sleep; cleared on the next advance
    #[serde(default)]
    paused: bool,
    pub remote_host: RemoteHost,
    pub target: Target,
    /// Report of the most recent failed step, cleared when a step succeeds
    #[serde(default)]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Source {
    /// New source in `draft`
    pub fn new(run_id: Uuid, name: impl Into<String>, remote_host: RemoteHost, target: Target) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            run_id,
            name: name.into(),
            status: SourceStatus::Draft,
            paused: false,
            remote_host,
            target,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_paused_at_sync(&self) -> bool {
        self.paused && self.status == SourceStatus::Sync
    }

    /// At `sync`, paused or held there by a failed sync
    pub fn is_at_sync(&self) -> bool {
        self.status == SourceStatus::Sync
    }

    pub fn is_live(&self) -> bool {
        self.status.is_terminal()
    }

    /// Source host inventory; commands touching disks need it
    pub fn system_info(&self) -> Option<&super::SystemInfo> {
        self.remote_host.system_info.as_ref()
    }
}

impl StatefulEntity for Source {
    type Status = SourceStatus;

    fn status(&self) -> &SourceStatus {
        &self.status
    }

    fn set_status(&mut self, status: SourceStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        self.updated_at = Utc::now();
    }

    fn label(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }
}
