//! # System Constants
//!
//! Fixed paths, provider status strings and default timings shared across the
//! migration engine.

/// Parent directory of the synthetic target mount directories
pub const TARGET_MOUNT_ROOT: &str = "/mnt";

/// Pseudo filesystems bind-mounted into the target root before chrooting
pub const CHROOT_BIND_MOUNTS: [&str; 3] = ["/dev", "/proc", "/sys"];

/// Environment variable carrying the JSON hook context into hook scripts
pub const HOOK_CONTEXT_ENV: &str = "MIGRATION_CONTEXT";

/// Operation names used in structured log events
pub mod events {
    pub const SOURCE_ADMITTED: &str = "source.admitted";
    pub const SOURCE_PAUSED: &str = "source.paused";
    pub const SOURCE_COMPLETED: &str = "source.completed";
    pub const SOURCE_FAILED: &str = "source.failed";

    pub const CLOUD_CREATE_TARGET: &str = "cloud.create_target";
    pub const CLOUD_START_TARGET: &str = "cloud.start_target";
    pub const CLOUD_STOP_TARGET: &str = "cloud.stop_target";
    pub const CLOUD_DELETE_TARGET: &str = "cloud.delete_target";
    pub const CLOUD_DELETE_VOLUME: &str = "cloud.delete_volume";
    pub const CLOUD_DELETE_NIC: &str = "cloud.delete_nic";
    pub const CLOUD_MAKE_VOLUME_BOOT: &str = "cloud.make_volume_boot";
}

/// Provider request and entity states
pub mod provider_states {
    pub const REQUEST_DONE: &str = "DONE";
    pub const REQUEST_FAILED: &str = "FAILED";
    pub const AVAILABLE: &str = "AVAILABLE";
    pub const INACTIVE: &str = "INACTIVE";
    pub const BUSY: &str = "BUSY";
}

/// Default values used when configuration leaves a setting out
pub mod system {
    /// Seconds between two provider status checks
    pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 10;
    /// Seconds a provider operation may take before it is considered lost
    pub const DEFAULT_POLL_MAX_WAIT_SECONDS: u64 = 1800;
    pub const DEFAULT_SSH_CONNECT_RETRIES: u32 = 3;
    pub const DEFAULT_SSH_RETRY_BACKOFF_SECONDS: u64 = 5;
    pub const DEFAULT_SSH_CONNECT_TIMEOUT_SECONDS: u64 = 30;
    /// Exit status OpenSSH reports for its own connection failures
    pub const SSH_CONNECTION_FAILURE_EXIT_CODE: i32 = 255;
    pub const DEFAULT_SIMULTANEOUS_MIGRATIONS: usize = 1;
}
