//! Host inventory: block devices, network interfaces and hardware sizing.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

const GIB: u64 = 1024 * 1024 * 1024;

/// Inventory of one machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub block_devices: BTreeMap<String, BlockDevice>,
    #[serde(default)]
    pub network: BTreeMap<String, NetworkInterface>,
    #[serde(default)]
    pub hardware: Hardware,
}

/// A disk or a partition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDevice {
    pub name: String,
    /// Size in bytes
    pub size: u64,
    #[serde(default)]
    pub fs: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub mountpoint: Option<String>,
    /// Partition carries the boot flag
    #[serde(default)]
    pub bootable: bool,
    #[serde(default)]
    pub children: BTreeMap<String, BlockDevice>,
}

impl BlockDevice {
    /// A device with neither a filesystem nor partitions
    pub fn is_unallocated(&self) -> bool {
        self.fs.is_none() && self.children.is_empty()
    }

    pub fn is_swap(&self) -> bool {
        self.fs.as_deref() == Some("swap") || self.mountpoint.as_deref() == Some("[SWAP]")
    }

    /// Size rounded up to whole GiB, the granularity cloud volumes are sized in
    pub fn size_gib(&self) -> u64 {
        self.size.div_ceil(GIB)
    }

    /// Mountpoint usable as a filesystem path (swap markers and blanks excluded)
    pub fn path_mountpoint(&self) -> Option<&str> {
        match self.mountpoint.as_deref() {
            Some(mountpoint) if mountpoint.starts_with('/') && !self.is_swap() => Some(mountpoint),
            _ => None,
        }
    }

    /// Partitions in on-disk order (numeric partition index, then name)
    pub fn partitions(&self) -> Vec<&BlockDevice> {
        let mut partitions: Vec<&BlockDevice> = self.children.values().collect();
        partitions.sort_by_key(|partition| (partition_index(&partition.name), partition.name.clone()));
        partitions
    }
}

/// Trailing partition number of a device name (`vda2` → 2, `nvme0n1p3` → 3)
pub fn partition_index(name: &str) -> Option<u32> {
    let digits_start = name
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(index, _)| index)?;
    name[digits_start..].parse().ok()
}

/// Name of partition `index` on `disk`, following kernel naming conventions
pub fn partition_name(disk: &str, index: u32) -> String {
    if disk.ends_with(|c: char| c.is_ascii_digit()) {
        format!("{disk}p{index}")
    } else {
        format!("{disk}{index}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub name: String,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub ips: Vec<String>,
    #[serde(default)]
    pub gateway: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hardware {
    pub cores: u32,
    pub ram_mib: u64,
}

/// Output of `lsblk --json --bytes`
#[derive(Debug, Deserialize)]
struct LsblkOutput {
    blockdevices: Vec<LsblkDevice>,
}

#[derive(Debug, Deserialize)]
struct LsblkDevice {
    name: String,
    #[serde(deserialize_with = "deserialize_lsblk_size")]
    size: u64,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    fstype: Option<String>,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    mountpoint: Option<String>,
    #[serde(default)]
    partflags: Option<String>,
    #[serde(default)]
    children: Vec<LsblkDevice>,
}

/// lsblk prints sizes as numbers in recent versions and as strings in older ones
fn deserialize_lsblk_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    let value: Value = Deserialize::deserialize(deserializer)?;
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom("Device size must be a positive integer")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("Device size is not a byte count: {s}"))),
        _ => Err(D::Error::custom("Device size must be a number or a string")),
    }
}

/// MBR active flag (`0x80`) or the GPT legacy BIOS bootable attribute (bit 2)
fn is_boot_flag(partflags: &str) -> bool {
    let digits = partflags.trim().trim_start_matches("0x");
    u64::from_str_radix(digits, 16).is_ok_and(|flags| flags & 0x84 != 0)
}

impl From<LsblkDevice> for BlockDevice {
    fn from(device: LsblkDevice) -> Self {
        Self {
            name: device.name,
            size: device.size,
            fs: device.fstype.filter(|fs| !fs.is_empty()),
            uuid: device.uuid.filter(|uuid| !uuid.is_empty()),
            label: device.label.filter(|label| !label.is_empty()),
            mountpoint: device.mountpoint.filter(|mountpoint| !mountpoint.is_empty()),
            bootable: device.partflags.as_deref().is_some_and(is_boot_flag),
            children: device
                .children
                .into_iter()
                .map(|child| (child.name.clone(), BlockDevice::from(child)))
                .collect(),
        }
    }
}

impl SystemInfo {
    /// Parse the disk tree reported by `lsblk --json --bytes`; only whole disks are kept
    pub fn block_devices_from_lsblk(
        json: &str,
    ) -> Result<BTreeMap<String, BlockDevice>, serde_json::Error> {
        let output: LsblkOutput = serde_json::from_str(json)?;
        Ok(output
            .blockdevices
            .into_iter()
            .filter(|device| device.kind.as_deref().map_or(true, |kind| kind == "disk"))
            .map(|device| (device.name.clone(), BlockDevice::from(device)))
            .collect())
    }
}
