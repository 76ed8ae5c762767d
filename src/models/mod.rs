pub mod blueprint;
pub mod migration_run;
pub mod remote_host;
pub mod source;
pub mod system_info;
pub mod target;

// Re-export core models for easy access
pub use blueprint::{
    Blueprint, CommandTemplates, HardwareSpec, HookLocation, HookSpec, InterfaceRule,
    NetworkMapping, SshCredentials,
};
pub use migration_run::{MigrationPlan, MigrationRun, RunPolicy, SourcePlan};
pub use remote_host::{CloudMetadata, NicInfo, OsFamily, RemoteHost, VolumeInfo};
pub use source::{Source, SourceStatus};
pub use system_info::{BlockDevice, Hardware, NetworkInterface, SystemInfo};
pub use target::Target;
