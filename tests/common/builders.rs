//! Test data builders for sources, disks and lsblk output

#![allow(dead_code)]

use migrator_core::models::{
    BlockDevice, Blueprint, Hardware, HookLocation, HookSpec, InterfaceRule, NetworkInterface,
    OsFamily, RemoteHost, Source, SystemInfo, Target,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const GIB: u64 = 1024 * 1024 * 1024;

/// Builder for a disk with partitions
pub struct DiskBuilder {
    disk: BlockDevice,
}

impl DiskBuilder {
    pub fn new(name: &str, size_gib: u64) -> Self {
        Self {
            disk: BlockDevice {
                name: name.to_string(),
                size: size_gib * GIB,
                ..BlockDevice::default()
            },
        }
    }

    /// Add a partition; `mountpoint` is what lsblk reports (`[SWAP]` for swap)
    pub fn partition(
        mut self,
        name: &str,
        size_gib: u64,
        fs: &str,
        uuid: &str,
        mountpoint: Option<&str>,
    ) -> Self {
        self.disk.children.insert(
            name.to_string(),
            BlockDevice {
                name: name.to_string(),
                size: size_gib * GIB,
                fs: Some(fs.to_string()),
                uuid: Some(uuid.to_string()),
                mountpoint: mountpoint.map(str::to_string),
                ..BlockDevice::default()
            },
        );
        self
    }

    /// Set the boot flag on partition `name`
    pub fn bootable(mut self, name: &str) -> Self {
        if let Some(partition) = self.disk.children.get_mut(name) {
            partition.bootable = true;
        }
        self
    }

    pub fn build(self) -> BlockDevice {
        self.disk
    }
}

/// Unallocated disk
pub fn empty_disk(name: &str, size_gib: u64) -> BlockDevice {
    DiskBuilder::new(name, size_gib).build()
}

pub fn devices(disks: Vec<BlockDevice>) -> BTreeMap<String, BlockDevice> {
    disks
        .into_iter()
        .map(|disk| (disk.name.clone(), disk))
        .collect()
}

/// `lsblk --json --bytes` rendering of a device tree
pub fn lsblk_json(disks: &[BlockDevice]) -> String {
    fn device(block: &BlockDevice, kind: &str) -> Value {
        let mut value = json!({
            "name": block.name,
            "size": block.size,
            "type": kind,
            "fstype": block.fs,
            "uuid": block.uuid,
            "label": block.label,
            "mountpoint": block.mountpoint,
            "partflags": block.bootable.then_some("0x80"),
        });
        if !block.children.is_empty() {
            value["children"] = block
                .partitions()
                .into_iter()
                .map(|partition| device(partition, "part"))
                .collect();
        }
        value
    }

    json!({ "blockdevices": disks.iter().map(|disk| device(disk, "disk")).collect::<Vec<_>>() })
        .to_string()
}

/// Source `vda`: ext4 root and swap
pub fn root_disk(name: &str) -> BlockDevice {
    DiskBuilder::new(name, 10)
        .partition(&format!("{name}1"), 8, "ext4", "0f3a-root", Some("/"))
        .partition(&format!("{name}2"), 2, "swap", "5e1c-swap", Some("[SWAP]"))
        .bootable(&format!("{name}1"))
        .build()
}

/// Source data disk: `/srv` and a nested `/var/log`
pub fn data_disk(name: &str) -> BlockDevice {
    DiskBuilder::new(name, 10)
        .partition(&format!("{name}1"), 6, "xfs", "9b2d-srv", Some("/srv"))
        .partition(&format!("{name}2"), 4, "ext4", "77aa-log", Some("/var/log"))
        .build()
}

pub fn blueprint() -> Blueprint {
    let mut blueprint = Blueprint {
        name: "web".to_string(),
        template_image: "debian-12-bootstrap".to_string(),
        ..Blueprint::default()
    };
    blueprint.ssh.public_keys = vec!["ssh-ed25519 AAAAC3Nz migrator".to_string()];
    blueprint.network.bootstrap_lan = 1;
    blueprint.network.interfaces.push(InterfaceRule {
        source_interface: "eth0".to_string(),
        lan: 2,
        ips: Vec::new(),
    });
    blueprint
}

pub fn hook(event: &str, location: HookLocation, script: &str) -> HookSpec {
    HookSpec {
        event: event.to_string(),
        location,
        script: script.to_string(),
    }
}

/// Builder for a draft source
pub struct SourceBuilder {
    name: String,
    address: String,
    os: OsFamily,
    blueprint: Blueprint,
    system_info: Option<SystemInfo>,
    run_id: Uuid,
}

impl SourceBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            address: "10.0.0.11".to_string(),
            os: OsFamily::Debian,
            blueprint: blueprint(),
            system_info: None,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }

    pub fn with_run(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn with_blueprint(mut self, blueprint: Blueprint) -> Self {
        self.blueprint = blueprint;
        self
    }

    /// Known inventory with the given disks, `eth0` and 2 cores / 4 GiB
    pub fn with_disks(mut self, disks: Vec<BlockDevice>) -> Self {
        self.system_info = Some(SystemInfo {
            block_devices: devices(disks),
            network: [(
                "eth0".to_string(),
                NetworkInterface {
                    name: "eth0".to_string(),
                    mac: Some("52:54:00:12:34:56".to_string()),
                    ips: vec![format!("{}/24", self.address)],
                    gateway: Some("10.0.0.1".to_string()),
                },
            )]
            .into_iter()
            .collect(),
            hardware: Hardware {
                cores: 2,
                ram_mib: 4096,
            },
        });
        self
    }

    pub fn build(self) -> Source {
        let mut host = RemoteHost::new(self.address, "root", self.os);
        host.system_info = self.system_info;
        Source::new(self.run_id, self.name, host, Target::new(self.blueprint))
    }
}
