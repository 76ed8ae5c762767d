//! # Device Identification
//!
//! Pairs every source disk with an unallocated target disk of the same size
//! class, first-fit in natural device order. Partitions follow their disk
//! positionally by partition number, and everything that carries a mountpoint
//! gets its synthetic target mount directory here, once.

use super::errors::{MappingError, MappingResult};
use super::mountpoint::target_mountpoint;
use crate::models::system_info::{partition_index, partition_name};
use crate::models::BlockDevice;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Target counterpart of a source disk or partition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedDevice {
    /// Target device name, e.g. `vdc2`
    pub id: String,
    /// Target mount directory; empty when the source device is not mounted
    #[serde(default)]
    pub mountpoint: String,
    #[serde(default)]
    pub children: BTreeMap<String, MappedDevice>,
}

impl MappedDevice {
    pub fn has_mountpoint(&self) -> bool {
        !self.mountpoint.is_empty()
    }
}

/// Persisted source device → target device assignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceMapping {
    devices: BTreeMap<String, MappedDevice>,
}

impl DeviceMapping {
    /// Run device identification.
    ///
    /// `target_devices` is the target's inventory; only unallocated devices are
    /// candidates. Every source device that cannot be placed is reported and no
    /// mapping is returned.
    pub fn identify(
        source_devices: &BTreeMap<String, BlockDevice>,
        target_devices: &BTreeMap<String, BlockDevice>,
    ) -> MappingResult<Self> {
        let mut sources: Vec<&BlockDevice> = source_devices.values().collect();
        sources.sort_by(|a, b| natural_cmp(&a.name, &b.name));

        let mut pool: Vec<&BlockDevice> = target_devices
            .values()
            .filter(|device| device.is_unallocated())
            .collect();
        pool.sort_by(|a, b| natural_cmp(&a.name, &b.name));

        let mut devices = BTreeMap::new();
        let mut failures = Vec::new();

        for source in sources {
            let Some(slot) = pool
                .iter()
                .position(|candidate| candidate.size_gib() == source.size_gib())
            else {
                warn!(
                    device = %source.name,
                    size_gib = source.size_gib(),
                    remaining = pool.len(),
                    "❌ DEVICE_MAPPING: No unallocated target device matches"
                );
                failures.push(format!(
                    "{}: no unallocated target device of {} GiB ({} candidate(s) left)",
                    source.name,
                    source.size_gib(),
                    pool.len()
                ));
                continue;
            };

            let target = pool.remove(slot);
            match map_disk(source, &target.name) {
                Ok(mapped) => {
                    debug!(source = %source.name, target = %target.name, "DEVICE_MAPPING: Disk matched");
                    devices.insert(source.name.clone(), mapped);
                }
                Err(errors) => failures.extend(errors),
            }
        }

        if !failures.is_empty() {
            return Err(MappingError::Unidentified { failures });
        }

        info!(devices = devices.len(), "✅ DEVICE_MAPPING: All source devices identified");
        Ok(Self { devices })
    }

    pub fn get(&self, source_device: &str) -> Option<&MappedDevice> {
        self.devices.get(source_device)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MappedDevice)> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Target device for a source disk or partition name
    pub fn target_device(&self, source_device: &str) -> Option<&MappedDevice> {
        self.devices.get(source_device).or_else(|| {
            self.devices
                .values()
                .find_map(|disk| disk.children.get(source_device))
        })
    }

    /// Source → target name pairs for every mapped disk and partition
    pub fn renames(&self) -> Vec<(&str, &str)> {
        let mut renames = Vec::new();
        for (source, disk) in &self.devices {
            renames.push((source.as_str(), disk.id.as_str()));
            for (partition, mapped) in &disk.children {
                renames.push((partition.as_str(), mapped.id.as_str()));
            }
        }
        renames
    }
}

fn map_disk(source: &BlockDevice, target_disk: &str) -> Result<MappedDevice, Vec<String>> {
    let mut children = BTreeMap::new();
    let mut errors = Vec::new();

    for partition in source.partitions() {
        let Some(index) = partition_index(&partition.name) else {
            errors.push(format!(
                "{}: partition has no numeric index",
                partition.name
            ));
            continue;
        };
        children.insert(
            partition.name.clone(),
            MappedDevice {
                id: partition_name(target_disk, index),
                mountpoint: target_mountpoint(partition.path_mountpoint(), partition.is_swap()),
                children: BTreeMap::new(),
            },
        );
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(MappedDevice {
        id: target_disk.to_string(),
        mountpoint: target_mountpoint(source.path_mountpoint(), source.is_swap()),
        children,
    })
}

/// Compare device names with embedded numbers ordered numerically (`sd2 < sd10`)
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chunks = chunks(a);
    let mut b_chunks = chunks(b);
    loop {
        match (a_chunks.next(), b_chunks.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(m), Ok(n)) => m.cmp(&n).then_with(|| x.len().cmp(&y.len())),
                    _ => x.cmp(y),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// Split into alternating runs of digits and non-digits
fn chunks(name: &str) -> impl Iterator<Item = &str> {
    let mut rest = name;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digit)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn disk(name: &str, gib: u64) -> BlockDevice {
        BlockDevice {
            name: name.to_string(),
            size: gib * GIB,
            ..Default::default()
        }
    }

    fn inventory(devices: Vec<BlockDevice>) -> BTreeMap<String, BlockDevice> {
        devices.into_iter().map(|d| (d.name.clone(), d)).collect()
    }

    #[test]
    fn test_natural_order() {
        let mut names = vec!["sd10", "sd2", "sdb", "sda", "nvme1n1", "nvme0n1"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["nvme0n1", "nvme1n1", "sd2", "sd10", "sda", "sdb"]);
    }

    #[test]
    fn test_first_fit_skips_allocated_and_wrong_sizes() {
        let mut allocated = disk("vda", 20);
        allocated.fs = Some("ext4".to_string());
        let targets = inventory(vec![allocated, disk("vdb", 50), disk("vdc", 20), disk("vdd", 20)]);
        let sources = inventory(vec![disk("sda", 20)]);

        let mapping = DeviceMapping::identify(&sources, &targets).unwrap();
        assert_eq!(mapping.get("sda").unwrap().id, "vdc");
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn test_failures_are_aggregated() {
        let targets = inventory(vec![disk("vdb", 10)]);
        let sources = inventory(vec![disk("vda", 10), disk("vdc", 10), disk("vdd", 30)]);

        match DeviceMapping::identify(&sources, &targets) {
            Err(MappingError::Unidentified { failures }) => {
                assert_eq!(failures.len(), 2);
                assert!(failures[0].starts_with("vdc:"));
                assert!(failures[1].starts_with("vdd:"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_partitions_follow_target_naming() {
        let mut source = disk("vda", 8);
        source.children.insert(
            "vda1".to_string(),
            BlockDevice {
                name: "vda1".to_string(),
                fs: Some("ext4".to_string()),
                mountpoint: Some("/".to_string()),
                ..Default::default()
            },
        );
        source.children.insert(
            "vda2".to_string(),
            BlockDevice {
                name: "vda2".to_string(),
                fs: Some("swap".to_string()),
                mountpoint: Some("[SWAP]".to_string()),
                ..Default::default()
            },
        );
        let targets = inventory(vec![disk("nvme1n1", 8)]);

        let mapping = DeviceMapping::identify(&inventory(vec![source]), &targets).unwrap();
        let mapped = mapping.get("vda").unwrap();
        assert_eq!(mapped.children["vda1"].id, "nvme1n1p1");
        assert!(mapped.children["vda1"].has_mountpoint());
        assert_eq!(mapped.children["vda2"].mountpoint, "");
        assert_eq!(mapping.target_device("vda2").unwrap().id, "nvme1n1p2");
        assert!(!mapped.has_mountpoint());
    }
}
