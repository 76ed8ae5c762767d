//! # Device & Path Mapping
//!
//! Source-to-target correspondence: which target disk receives each source disk,
//! where each source filesystem is mounted on the target, and how source paths
//! translate to target paths.

pub mod device_mapping;
pub mod errors;
pub mod mountpoint;
pub mod path_resolver;

pub use device_mapping::{natural_cmp, DeviceMapping, MappedDevice};
pub use errors::{MappingError, MappingResult};
pub use mountpoint::{target_mountpoint, MOUNTPOINT_HASH_CONTEXT};
pub use path_resolver::{MountEntry, MountpointMap};
