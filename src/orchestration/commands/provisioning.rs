//! Provisioning of the target VM and its inventory.

use super::{source_inventory, target_host};
use crate::cloud::{NicSpec, TargetSpec};
use crate::mapping::natural_cmp;
use crate::models::{RemoteHost, Source, SystemInfo};
use crate::orchestration::context::MigrationContext;
use crate::orchestration::inventory::collect_system_info;
use crate::state_machine::{Command, CommandError, CommandResult, Signal, StepErrors};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Provision the target VM: bootstrap volume and NIC plus one empty volume per
/// source disk and one NIC per mapped source interface.
#[derive(Debug)]
pub struct CreateTarget {
    ctx: Arc<MigrationContext>,
}

impl CreateTarget {
    pub fn new(ctx: Arc<MigrationContext>) -> Self {
        Self { ctx }
    }
}

const CREATE_TARGET: &str = "CreateTarget";

/// Target sizing and layout for a source whose inventory is known
pub fn target_spec(source: &Source, inventory: &SystemInfo) -> CommandResult<TargetSpec> {
    let blueprint = &source.target.blueprint;
    if blueprint.template_image.trim().is_empty() {
        return Err(CommandError::precondition(
            CREATE_TARGET,
            format!("blueprint '{}' has no template image", blueprint.name),
        ));
    }

    let cores = match blueprint.hardware.cores {
        0 => inventory.hardware.cores,
        cores => cores,
    };
    let ram_mib = match blueprint.hardware.ram_mib {
        0 => inventory.hardware.ram_mib,
        ram => ram,
    };
    if cores == 0 || ram_mib == 0 {
        return Err(CommandError::precondition(
            CREATE_TARGET,
            "target sizing is unknown: set blueprint hardware or collect source hardware",
        ));
    }

    let nics = inventory
        .network
        .values()
        .filter_map(|interface| {
            let rule = blueprint.network.rule_for(&interface.name)?;
            Some(NicSpec {
                name: interface.name.clone(),
                lan: rule.lan,
                ips: rule.ips.clone(),
            })
        })
        .collect();

    let mut disks: Vec<_> = inventory.block_devices.values().collect();
    disks.sort_by(|a, b| natural_cmp(&a.name, &b.name));

    Ok(TargetSpec {
        name: source.name.clone(),
        cores,
        ram_mib,
        template_image: blueprint.template_image.clone(),
        ssh_keys: blueprint.ssh.public_keys.clone(),
        bootstrap_nic: NicSpec {
            name: "bootstrap".to_string(),
            lan: blueprint.network.bootstrap_lan,
            ips: Vec::new(),
        },
        nics,
        disk_sizes_gib: disks.iter().map(|disk| disk.size_gib()).collect(),
    })
}

#[async_trait]
impl Command<Source> for CreateTarget {
    fn name(&self) -> &'static str {
        CREATE_TARGET
    }

    async fn run(&self, source: &mut Source, errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        if source.target.is_provisioned() {
            let host = target_host(source, CREATE_TARGET)?;
            if host.address.is_empty() {
                return Err(CommandError::precondition(
                    CREATE_TARGET,
                    "target exists but its bootstrap NIC has no address",
                ));
            }
            debug!(source = %source.name, "Target already provisioned, skipping");
            return Ok(None);
        }

        if source.system_info().is_none() {
            let info = collect_system_info(
                self.ctx.executor.as_ref(),
                &source.remote_host,
                &source.target.blueprint.commands.list_block_devices,
                errors,
            )
            .await?;
            // A partial inventory would size the target without its interfaces
            std::mem::take(errors).into_result(CREATE_TARGET)?;
            source.remote_host.system_info = Some(info);
        }

        let spec = target_spec(source, source_inventory(source, CREATE_TARGET)?)?;
        let metadata = self.ctx.cloud.create_target(&spec).await?;

        let address = metadata
            .bootstrap_nic()
            .and_then(|nic| nic.ips.first())
            .cloned()
            .unwrap_or_default();
        if address.is_empty() {
            errors.record("bootstrap NIC", "provider assigned no address");
        }

        let ssh = &source.target.blueprint.ssh;
        let mut host = RemoteHost::new(address, ssh.username.clone(), source.remote_host.os);
        host.private_key_path = ssh.private_key_path.clone();
        host.os_version = source.remote_host.os_version.clone();
        host.cloud_metadata = Some(metadata);

        info!(source = %source.name, target = %host.display_name(), "✅ CREATE_TARGET: Target provisioned");
        source.target.remote_host = Some(host);
        Ok(None)
    }
}

/// Collect the target inventory through the bootstrap system
#[derive(Debug)]
pub struct GetTargetSystemInfo {
    ctx: Arc<MigrationContext>,
}

impl GetTargetSystemInfo {
    pub fn new(ctx: Arc<MigrationContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Command<Source> for GetTargetSystemInfo {
    fn name(&self) -> &'static str {
        "GetTargetSystemInfo"
    }

    async fn run(&self, source: &mut Source, errors: &mut StepErrors) -> CommandResult<Option<Signal>> {
        let host = target_host(source, self.name())?.clone();
        let info = collect_system_info(
            self.ctx.executor.as_ref(),
            &host,
            &source.target.blueprint.commands.list_block_devices,
            errors,
        )
        .await?;

        debug!(
            source = %source.name,
            block_devices = info.block_devices.len(),
            "Target inventory collected"
        );
        if let Some(target) = source.target.remote_host.as_mut() {
            target.system_info = Some(info);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BlockDevice, Blueprint, Hardware, InterfaceRule, NetworkInterface, OsFamily, Target,
    };
    use uuid::Uuid;

    fn source_with(blueprint: Blueprint) -> (Source, SystemInfo) {
        let host = RemoteHost::new("10.0.0.11", "root", OsFamily::Debian);
        let source = Source::new(Uuid::new_v4(), "web-1", host, Target::new(blueprint));
        let mut info = SystemInfo {
            hardware: Hardware {
                cores: 4,
                ram_mib: 8192,
            },
            ..SystemInfo::default()
        };
        for (name, gib) in [("vdb", 20u64), ("vda", 10)] {
            info.block_devices.insert(
                name.to_string(),
                BlockDevice {
                    name: name.to_string(),
                    size: gib * 1024 * 1024 * 1024,
                    ..BlockDevice::default()
                },
            );
        }
        info.network.insert(
            "eth0".to_string(),
            NetworkInterface {
                name: "eth0".to_string(),
                mac: None,
                ips: vec!["10.0.0.11/24".to_string(), "fe80::1/64".to_string()],
                gateway: None,
            },
        );
        info.network.insert(
            "eth1".to_string(),
            NetworkInterface {
                name: "eth1".to_string(),
                ..NetworkInterface::default()
            },
        );
        (source, info)
    }

    #[test]
    fn test_target_spec_follows_source_layout() {
        let mut blueprint = Blueprint {
            template_image: "debian-12".to_string(),
            ..Blueprint::default()
        };
        blueprint.hardware.cores = 2;
        blueprint.network.interfaces.push(InterfaceRule {
            source_interface: "eth0".to_string(),
            lan: 2,
            ips: Vec::new(),
        });
        let (source, info) = source_with(blueprint);

        let spec = target_spec(&source, &info).unwrap();
        assert_eq!(spec.cores, 2);
        assert_eq!(spec.ram_mib, 8192);
        assert_eq!(spec.disk_sizes_gib, vec![10, 20]);
        assert_eq!(spec.nics.len(), 1);
        assert_eq!(spec.nics[0].name, "eth0");
        assert!(spec.nics[0].ips.is_empty());
        assert_eq!(spec.nics[0].lan, 2);
    }

    #[test]
    fn test_target_spec_requires_template_image() {
        let (source, info) = source_with(Blueprint::default());
        assert!(matches!(
            target_spec(&source, &info),
            Err(CommandError::Precondition { .. })
        ));
    }
}
