use super::system_info::SystemInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// A reachable machine on either side of a migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteHost {
    pub id: Uuid,
    pub address: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
    pub os: OsFamily,
    #[serde(default)]
    pub os_version: String,
    #[serde(default)]
    pub system_info: Option<SystemInfo>,
    #[serde(default)]
    pub cloud_metadata: Option<CloudMetadata>,
}

fn default_ssh_port() -> u16 {
    22
}

impl RemoteHost {
    pub fn new(address: impl Into<String>, username: impl Into<String>, os: OsFamily) -> Self {
        Self {
            id: Uuid::new_v4(),
            address: address.into(),
            port: default_ssh_port(),
            username: username.into(),
            private_key_path: None,
            os,
            os_version: String::new(),
            system_info: None,
            cloud_metadata: None,
        }
    }

    /// `user@address:port`, used in logs and error messages
    pub fn display_name(&self) -> String {
        format!("{}@{}:{}", self.username, self.address, self.port)
    }
}

/// Operating system family; selects OS-specific command sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Debian,
    Ubuntu,
    Centos,
    Rhel,
}

impl OsFamily {
    /// Command installing the bootloader onto `disk`, run inside the target chroot
    pub fn grub_install_command(&self, disk: &str) -> String {
        match self {
            Self::Debian | Self::Ubuntu => format!("grub-install --recheck {disk}"),
            Self::Centos | Self::Rhel => format!("grub2-install --recheck {disk}"),
        }
    }

    /// Command regenerating the bootloader configuration inside the target chroot
    pub fn grub_config_command(&self) -> &'static str {
        match self {
            Self::Debian | Self::Ubuntu => "update-grub",
            Self::Centos | Self::Rhel => "grub2-mkconfig -o /boot/grub2/grub.cfg",
        }
    }

    /// Source-side network configuration files referencing addresses of `interface`
    pub fn network_config_paths(&self, interface: &str) -> Vec<String> {
        match self {
            Self::Debian => vec!["/etc/network/interfaces".to_string()],
            Self::Ubuntu => vec![
                "/etc/network/interfaces".to_string(),
                "/etc/netplan".to_string(),
            ],
            Self::Centos | Self::Rhel => {
                vec![format!("/etc/sysconfig/network-scripts/ifcfg-{interface}")]
            }
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debian => write!(f, "debian"),
            Self::Ubuntu => write!(f, "ubuntu"),
            Self::Centos => write!(f, "centos"),
            Self::Rhel => write!(f, "rhel"),
        }
    }
}

/// Provider-assigned identifiers of a provisioned target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudMetadata {
    pub server_id: String,
    pub bootstrap_volume_id: String,
    pub bootstrap_nic_id: String,
    #[serde(default)]
    pub volumes: Vec<VolumeInfo>,
    #[serde(default)]
    pub nics: Vec<NicInfo>,
}

impl CloudMetadata {
    pub fn bootstrap_nic(&self) -> Option<&NicInfo> {
        self.nics.iter().find(|nic| nic.id == self.bootstrap_nic_id)
    }

    pub fn has_volume(&self, volume_id: &str) -> bool {
        self.volumes.iter().any(|volume| volume.id == volume_id)
    }

    pub fn has_nic(&self, nic_id: &str) -> bool {
        self.nics.iter().any(|nic| nic.id == nic_id)
    }

    /// Volume attached as `device` (for example `vdb`) while the bootstrap volume is present
    pub fn volume_for_device(&self, device: &str) -> Option<&VolumeInfo> {
        self.volumes
            .iter()
            .find(|volume| volume.device_name().as_deref() == Some(device))
    }

    /// NICs that remain once the bootstrap NIC is gone
    pub fn final_nics(&self) -> impl Iterator<Item = &NicInfo> {
        self.nics
            .iter()
            .filter(move |nic| nic.id != self.bootstrap_nic_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub id: String,
    pub name: String,
    pub size_gib: u64,
    /// 1-based attachment slot on the virtio bus
    #[serde(default)]
    pub device_number: Option<u32>,
}

impl VolumeInfo {
    /// Virtio disk name for the attachment slot (1 → `vda`, 2 → `vdb`, ...)
    pub fn device_name(&self) -> Option<String> {
        let number = self.device_number?;
        if !(1..=26).contains(&number) {
            return None;
        }
        let letter = char::from(b'a' + (number - 1) as u8);
        Some(format!("vd{letter}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicInfo {
    pub id: String,
    pub name: String,
    pub lan: u32,
    #[serde(default)]
    pub ips: Vec<String>,
    #[serde(default)]
    pub mac: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_device_names() {
        let volume = |number| VolumeInfo {
            device_number: Some(number),
            ..Default::default()
        };
        assert_eq!(volume(1).device_name().as_deref(), Some("vda"));
        assert_eq!(volume(3).device_name().as_deref(), Some("vdc"));
        assert_eq!(volume(0).device_name(), None);
        assert_eq!(VolumeInfo::default().device_name(), None);
    }

    #[test]
    fn test_os_family_commands() {
        assert_eq!(
            OsFamily::Debian.grub_install_command("/dev/vdb"),
            "grub-install --recheck /dev/vdb"
        );
        assert!(OsFamily::Rhel.grub_config_command().starts_with("grub2-mkconfig"));
        assert_eq!(
            OsFamily::Centos.network_config_paths("eth0"),
            vec!["/etc/sysconfig/network-scripts/ifcfg-eth0".to_string()]
        );
        let parsed: OsFamily = serde_json::from_str("\"ubuntu\"").unwrap();
        assert_eq!(parsed, OsFamily::Ubuntu);
    }
}
