//! # Blueprint
//!
//! Declarative description of the target a source is migrated into: VM sizing,
//! template image, network layout, lifecycle hooks and the shell command
//! templates used by the migration commands. Templates use `{placeholder}`
//! substitution (see [`crate::remote::render_template`]); substituted values are
//! shell-quoted.

use crate::state_machine::HookPhase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    pub name: String,
    #[serde(default)]
    pub hardware: HardwareSpec,
    /// Provider image the bootstrap volume is created from
    pub template_image: String,
    #[serde(default)]
    pub ssh: SshCredentials,
    #[serde(default)]
    pub network: NetworkMapping,
    #[serde(default)]
    pub hooks: Vec<HookSpec>,
    #[serde(default)]
    pub commands: CommandTemplates,
}

impl Default for Blueprint {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            hardware: HardwareSpec::default(),
            template_image: String::new(),
            ssh: SshCredentials::default(),
            network: NetworkMapping::default(),
            hooks: Vec::new(),
            commands: CommandTemplates::default(),
        }
    }
}

impl Blueprint {
    /// Hooks registered for an event such as `before_sync`
    pub fn hooks_for<'a>(
        &'a self,
        phase: HookPhase,
        status: &'a str,
    ) -> impl Iterator<Item = &'a HookSpec> + 'a {
        let event = phase.event_name(status);
        self.hooks.iter().filter(move |hook| hook.event == event)
    }
}

/// VM sizing; zero means "same as the source"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareSpec {
    #[serde(default)]
    pub cores: u32,
    #[serde(default)]
    pub ram_mib: u64,
}

/// How the migration logs into the target VM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshCredentials {
    #[serde(default = "default_target_user")]
    pub username: String,
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
    /// Public key injected into the bootstrap volume at creation
    #[serde(default)]
    pub public_keys: Vec<String>,
}

fn default_target_user() -> String {
    "root".to_string()
}

impl Default for SshCredentials {
    fn default() -> Self {
        Self {
            username: default_target_user(),
            private_key_path: None,
            public_keys: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMapping {
    /// LAN the bootstrap NIC is attached to; it must reach the source
    #[serde(default)]
    pub bootstrap_lan: u32,
    #[serde(default)]
    pub interfaces: Vec<InterfaceRule>,
}

impl NetworkMapping {
    pub fn rule_for(&self, interface: &str) -> Option<&InterfaceRule> {
        self.interfaces
            .iter()
            .find(|rule| rule.source_interface == interface)
    }
}

/// Target NIC created for one source interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRule {
    pub source_interface: String,
    pub lan: u32,
    /// Fixed addresses for the NIC; empty lets the provider assign them
    #[serde(default)]
    pub ips: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookLocation {
    Source,
    Target,
}

/// Script run on one side of the migration around a lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookSpec {
    /// `before_<status>` or `after_<status>`
    pub event: String,
    pub location: HookLocation,
    pub script: String,
}

/// Shell command templates used by the migration commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandTemplates {
    /// Inventory of whole disks; output is `lsblk --json` formatted
    pub list_block_devices: String,
    /// Partition table dump of `{device}`
    pub partition_dump: String,
    /// Apply the partition table `{layout}` to `{device}`
    pub partition_apply: String,
    /// Filesystem creation per filesystem type; placeholders `{device}`, `{uuid}`, `{label}`
    pub mkfs: BTreeMap<String, String>,
    /// Mount `{device}` on `{mountpoint}`; must be safe to re-run
    pub mount: String,
    /// Copy `{source_path}` on the source to `{target_path}` on the target
    pub sync: String,
    /// Paths excluded from every sync, relative to the synced mountpoint
    pub sync_excludes: Vec<String>,
}

impl CommandTemplates {
    pub fn mkfs_for(&self, fs: &str) -> Option<&str> {
        self.mkfs.get(fs).map(String::as_str)
    }
}

impl Default for CommandTemplates {
    fn default() -> Self {
        let mkfs = [
            ("ext2", "mkfs.ext2 -F -U {uuid} -L {label} {device}"),
            ("ext3", "mkfs.ext3 -F -U {uuid} -L {label} {device}"),
            ("ext4", "mkfs.ext4 -F -U {uuid} -L {label} {device}"),
            ("xfs", "mkfs.xfs -f -m uuid={uuid} -L {label} {device}"),
            ("btrfs", "mkfs.btrfs -f -U {uuid} -L {label} {device}"),
            ("swap", "mkswap -U {uuid} -L {label} {device}"),
            (
                "vfat",
                "mkfs.vfat -i \"$(printf %s {uuid} | tr -d -)\" -n {label} {device}",
            ),
        ]
        .into_iter()
        .map(|(fs, template)| (fs.to_string(), template.to_string()))
        .collect();

        Self {
            list_block_devices:
                "lsblk --json --bytes --output NAME,SIZE,TYPE,FSTYPE,UUID,LABEL,MOUNTPOINT,PARTFLAGS"
                    .to_string(),
            partition_dump: "sfdisk --dump {device}".to_string(),
            partition_apply: "printf '%s\\n' {layout} | sfdisk --force {device}".to_string(),
            mkfs,
            mount: "mkdir -p {mountpoint} && (mountpoint -q {mountpoint} || mount {device} {mountpoint})"
                .to_string(),
            sync: "rsync -aAXHx --numeric-ids --delete {excludes} -e {ssh_command} {source_path} {target_user}@{target_address}:{target_path}"
                .to_string(),
            sync_excludes: vec![
                "/dev/*".to_string(),
                "/proc/*".to_string(),
                "/sys/*".to_string(),
                "/run/*".to_string(),
                "/tmp/*".to_string(),
                "/lost+found".to_string(),
            ],
        }
    }
}
