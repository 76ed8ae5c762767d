//! Rewrites of the migrated system's configuration on the mounted target.

use super::{cloud_metadata, mountpoints, source_inventory, target_host};
use crate::mapping::DeviceMapping;
use crate::models::{BlockDevice, Source};
use crate::orchestration::context::MigrationContext;
use crate::remote::shell_quote;
use crate::state_machine::{Command, CommandResult, Signal, StepErrors};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, info};

const FSTAB: &str = "/etc/fstab";

fn find_device<'a>(devices: &'a BTreeMap<String, BlockDevice>, name: &str) -> Option<&'a BlockDevice> {
    devices.get(name).or_else(|| {
        devices
            .values()
            .find_map(|disk| find_device(&disk.children, name))
    })
}

/// Replace `/dev/<name>` references in an fstab.
///
/// Devices with a filesystem UUID become `UUID=` references; others are renamed
/// to their mapped target device. Comments and other specs are kept as is.
pub fn rewrite_fstab(
    fstab: &str,
    source_devices: &BTreeMap<String, BlockDevice>,
    mapping: &DeviceMapping,
) -> String {
    let mut rewritten: Vec<String> = fstab
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with('#') {
                return line.to_string();
            }
            let Some(spec) = trimmed.split_whitespace().next() else {
                return line.to_string();
            };
            let Some(name) = spec.strip_prefix("/dev/") else {
                return line.to_string();
            };

            let replacement = match find_device(source_devices, name).and_then(|device| device.uuid.as_deref()) {
                Some(uuid) => format!("UUID={uuid}"),
                None => match mapping.target_device(name) {
                    Some(mapped) => format!("/dev/{}", mapped.id),
                    None => return line.to_string(),
                },
            };
            format!("{replacement}{}", &trimmed[spec.len()..])
        })
        .collect();
    if fstab.ends_with('\n') {
        rewritten.push(String::new());
    }
    rewritten.join("\n")
}

fn write_file_command(path: &str, content: &str) -> String {
    format!(
        "printf '%s' {} > {}",
        shell_quote(content),
        shell_quote(path)
    )
}

/// Point the target's fstab at filesystem UUIDs instead of source device names
#[derive(Debug)]
pub struct AdjustMountConfig {
    ctx: Arc<MigrationContext>,
}

impl AdjustMountConfig {
    pub fn new(ctx: Arc<MigrationContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Command<Source> for AdjustMountConfig {
    fn name(&self) -> &'static str {
        "AdjustMountConfig"
    }

    async fn run(&self, source: &mut Source, _errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        let target = target_host(source, self.name())?;
        let inventory = source_inventory(source, self.name())?;
        let mapping = source.target.require_device_mapping()?;
        let path = mountpoints(source, self.name())?.resolve(FSTAB)?;

        let fstab = self
            .ctx
            .executor
            .run(target, &format!("cat {}", shell_quote(&path)))
            .await?;
        let rewritten = rewrite_fstab(&fstab, &inventory.block_devices, mapping);
        if rewritten == fstab {
            debug!(source = %source.name, "fstab needs no changes");
            return Ok(None);
        }

        self.ctx
            .executor
            .run(target, &write_file_command(&path, &rewritten))
            .await?;
        info!(source = %source.name, path = %path, "✅ ADJUST_MOUNT_CONFIG: fstab rewritten");
        Ok(None)
    }
}

/// Substitution of one literal value in a set of config files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

/// In-place replacement of `from` with `to` across `path` (a file or directory).
///
/// Matching is case-insensitive on word boundaries so that `10.0.0.1` does not
/// rewrite `10.0.0.12`.
pub fn replace_in_files_command(path: &str, replacement: &Replacement) -> String {
    let pattern: String = replacement
        .from
        .chars()
        .flat_map(|c| match c {
            '.' | '[' | ']' | '*' | '^' | '$' | '\\' | '/' => vec!['\\', c],
            _ => vec![c],
        })
        .collect();
    let expression = format!("s/\\b{pattern}\\b/{}/gI", replacement.to.replace('/', "\\/"));
    let quoted_path = shell_quote(path);
    format!(
        "if [ -e {quoted_path} ]; then grep -rliF -- {} {quoted_path} | xargs -r sed -i {}; fi",
        shell_quote(&replacement.from),
        shell_quote(&expression)
    )
}

fn bare_address(ip: &str) -> &str {
    ip.split_once('/').map_or(ip, |(address, _)| address)
}

fn ipv4_addresses(ips: &[String]) -> impl Iterator<Item = &str> {
    ips.iter()
        .map(|ip| bare_address(ip))
        .filter(|address| address.parse::<Ipv4Addr>().is_ok())
}

/// Replacements moving one source interface's addresses to its target NIC
pub fn interface_replacements(
    source_ips: &[String],
    source_mac: Option<&str>,
    target_ips: &[String],
    target_mac: Option<&str>,
) -> Vec<Replacement> {
    // Only IPv4 addresses are paired, in order
    let mut replacements: Vec<Replacement> = ipv4_addresses(source_ips)
        .zip(ipv4_addresses(target_ips))
        .filter(|(from, to)| from != to)
        .map(|(from, to)| Replacement {
            from: from.to_string(),
            to: to.to_string(),
        })
        .collect();

    if let (Some(from), Some(to)) = (source_mac, target_mac) {
        if !from.eq_ignore_ascii_case(to) {
            replacements.push(Replacement {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
    }
    replacements
}

/// Move source addresses in the migrated network configuration to the target NICs
#[derive(Debug)]
pub struct AdjustNetworkConfig {
    ctx: Arc<MigrationContext>,
}

impl AdjustNetworkConfig {
    pub fn new(ctx: Arc<MigrationContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Command<Source> for AdjustNetworkConfig {
    fn name(&self) -> &'static str {
        "AdjustNetworkConfig"
    }

    async fn run(&self, source: &mut Source, errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        let target = target_host(source, self.name())?;
        let metadata = cloud_metadata(source, self.name())?;
        let inventory = source_inventory(source, self.name())?;
        let table = mountpoints(source, self.name())?;

        for interface in inventory.network.values() {
            let Some(nic) = metadata
                .final_nics()
                .find(|nic| nic.name == interface.name)
            else {
                debug!(interface = %interface.name, "Interface not migrated, leaving its config alone");
                continue;
            };

            let replacements = interface_replacements(
                &interface.ips,
                interface.mac.as_deref(),
                &nic.ips,
                nic.mac.as_deref(),
            );
            if replacements.is_empty() {
                continue;
            }

            for config_path in source.remote_host.os.network_config_paths(&interface.name) {
                let Some(path) = errors.capture(
                    format!("resolve {config_path}"),
                    table.resolve(&config_path),
                ) else {
                    continue;
                };
                for replacement in &replacements {
                    errors.capture(
                        format!("replace {} in {config_path}", replacement.from),
                        self.ctx
                            .executor
                            .run(target, &replace_in_files_command(&path, replacement))
                            .await,
                    );
                }
            }
            info!(
                source = %source.name,
                interface = %interface.name,
                replacements = replacements.len(),
                "✅ ADJUST_NETWORK_CONFIG: Interface configuration rewritten"
            );
        }
        Ok(None)
    }
}
