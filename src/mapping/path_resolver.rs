//! # Source File Location Resolver
//!
//! Translates absolute source paths to where the same file lives on the target
//! while its filesystems are mounted under the synthetic mount directories.

use super::device_mapping::DeviceMapping;
use super::errors::{MappingError, MappingResult};
use crate::models::BlockDevice;
use std::collections::BTreeMap;

/// One mounted filesystem and where it lives on the target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Source disk holding the filesystem
    pub source_disk: String,
    pub target_disk: String,
    /// Source disk or partition carrying the filesystem
    pub source_device: String,
    pub target_device: String,
    pub source_mountpoint: String,
    pub target_mountpoint: String,
    pub fs: Option<String>,
    pub uuid: Option<String>,
    pub label: Option<String>,
}

/// Source mountpoint → target mountpoint lookup table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountpointMap {
    entries: Vec<MountEntry>,
}

impl MountpointMap {
    /// Entries are kept in mount order: parents before the filesystems nested in them
    pub fn new(mut entries: Vec<MountEntry>) -> Self {
        entries.sort_by(|a, b| {
            depth(&a.source_mountpoint)
                .cmp(&depth(&b.source_mountpoint))
                .then_with(|| a.source_mountpoint.cmp(&b.source_mountpoint))
        });
        Self { entries }
    }

    /// Build the table from the source inventory and the persisted device mapping
    pub fn build(
        source_devices: &BTreeMap<String, BlockDevice>,
        mapping: &DeviceMapping,
    ) -> MappingResult<Self> {
        let mut entries = Vec::new();

        for (disk_name, mapped_disk) in mapping.iter() {
            let source_disk = source_devices.get(disk_name).ok_or_else(|| {
                MappingError::invalid_path(disk_name, "mapped device missing from source inventory")
            })?;

            if mapped_disk.has_mountpoint() {
                entries.push(entry(source_disk, source_disk, &mapped_disk.id, &mapped_disk.id, &mapped_disk.mountpoint));
            }

            for (partition_name, mapped) in &mapped_disk.children {
                if !mapped.has_mountpoint() {
                    continue;
                }
                let partition = source_disk.children.get(partition_name).ok_or_else(|| {
                    MappingError::invalid_path(
                        partition_name,
                        "mapped partition missing from source inventory",
                    )
                })?;
                entries.push(entry(source_disk, partition, &mapped_disk.id, &mapped.id, &mapped.mountpoint));
            }
        }

        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[MountEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Target location of an absolute source path, via the longest matching mountpoint
    pub fn resolve(&self, path: &str) -> MappingResult<String> {
        if !path.starts_with('/') {
            return Err(MappingError::invalid_path(path, "path is not absolute"));
        }

        let entry = self
            .entries
            .iter()
            .filter(|entry| is_component_prefix(&entry.source_mountpoint, path))
            .max_by_key(|entry| entry.source_mountpoint.len())
            .ok_or_else(|| MappingError::invalid_path(path, "no mountpoint contains the path"))?;

        let remainder = if entry.source_mountpoint == "/" {
            path
        } else {
            &path[entry.source_mountpoint.len()..]
        };
        let remainder = if remainder == "/" { "" } else { remainder };
        Ok(format!("{}{}", entry.target_mountpoint, remainder))
    }

    /// Entry whose filesystem is mounted exactly at `mountpoint` on the source
    pub fn device_for_mountpoint(&self, mountpoint: &str) -> Option<&MountEntry> {
        self.entries
            .iter()
            .find(|entry| entry.source_mountpoint == mountpoint)
    }

    /// Root filesystem
    pub fn root(&self) -> Option<&MountEntry> {
        self.device_for_mountpoint("/")
    }

    /// Filesystem the bootloader reads: `/boot` when separate, otherwise `/`
    pub fn boot_device(&self) -> Option<&MountEntry> {
        self.device_for_mountpoint("/boot").or_else(|| self.root())
    }
}

fn entry(
    disk: &BlockDevice,
    device: &BlockDevice,
    target_disk: &str,
    target_device: &str,
    target_mountpoint: &str,
) -> MountEntry {
    MountEntry {
        source_disk: disk.name.clone(),
        target_disk: target_disk.to_string(),
        source_device: device.name.clone(),
        target_device: target_device.to_string(),
        source_mountpoint: device.path_mountpoint().unwrap_or_default().to_string(),
        target_mountpoint: target_mountpoint.to_string(),
        fs: device.fs.clone(),
        uuid: device.uuid.clone(),
        label: device.label.clone(),
    }
}

fn depth(mountpoint: &str) -> usize {
    mountpoint.split('/').filter(|part| !part.is_empty()).count()
}

fn is_component_prefix(mountpoint: &str, path: &str) -> bool {
    if mountpoint == "/" {
        return true;
    }
    match path.strip_prefix(mountpoint) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
